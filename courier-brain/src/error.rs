use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrainError>;

#[derive(Debug, Error)]
pub enum BrainError {
    #[error("invalid reasoning service endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("reasoning service unreachable: {0}")]
    Unreachable(String),

    #[error("reasoning service request timed out")]
    Timeout,

    #[error("reasoning service error {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("reasoning service returned 200 with an unparseable body: {0}")]
    InvalidReply(String),
}

impl BrainError {
    /// True for the failure class that triggers the fallback apology:
    /// network errors, timeouts, 5xx, and protocol violations.
    pub fn is_forwarding_failure(&self) -> bool {
        matches!(
            self,
            BrainError::Unreachable(_)
                | BrainError::Timeout
                | BrainError::Upstream { .. }
                | BrainError::InvalidReply(_)
        )
    }
}

impl From<reqwest::Error> for BrainError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return Self::Timeout;
        }
        Self::Unreachable(e.to_string())
    }
}
