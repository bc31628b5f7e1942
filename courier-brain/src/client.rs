use crate::error::{BrainError, Result};
use crate::types::{BrainOutcome, BrainReply, TurnPayload};
use reqwest::{StatusCode, Url};
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct BrainClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl BrainClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim())
            .map_err(|e| BrainError::InvalidEndpoint(format!("{endpoint:?}: {e}")))?;
        match endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(BrainError::InvalidEndpoint(format!(
                    "unsupported scheme {other} (expected http or https)"
                )));
            }
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrainError::Unreachable(e.to_string()))?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Forward one aggregated turn. Single POST, bounded by the client
    /// timeout, no retry; a failed call surfaces to the caller, which runs
    /// the fallback path.
    #[tracing::instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    pub async fn process(&self, turn: &TurnPayload) -> Result<BrainOutcome> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(turn)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        classify_response(status, &body)
    }
}

/// Maps a raw `(status, body)` pair to the forwarding protocol outcome.
fn classify_response(status: StatusCode, body: &str) -> Result<BrainOutcome> {
    if status == StatusCode::NO_CONTENT {
        return Ok(BrainOutcome::NoReply);
    }
    if status == StatusCode::OK && !body.trim().is_empty() {
        let reply: BrainReply =
            serde_json::from_str(body).map_err(|e| BrainError::InvalidReply(e.to_string()))?;
        return Ok(BrainOutcome::Reply(reply));
    }
    if status.is_server_error() {
        return Err(BrainError::Upstream {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }
    // Everything else, including a bodyless 200, is dropped without fallback.
    Ok(BrainOutcome::Ignored {
        status: status.as_u16(),
    })
}

#[cfg(test)]
mod tests {
    use super::{BrainClient, DEFAULT_REQUEST_TIMEOUT, classify_response};
    use crate::error::BrainError;
    use crate::types::BrainOutcome;
    use reqwest::StatusCode;

    #[test]
    fn no_content_yields_no_reply() {
        let outcome = classify_response(StatusCode::NO_CONTENT, "").expect("204 is a success");
        assert!(matches!(outcome, BrainOutcome::NoReply));
    }

    #[test]
    fn ok_with_json_body_yields_reply() {
        let outcome = classify_response(StatusCode::OK, r#"{"isSuccess":true,"response":"Olá!"}"#)
            .expect("200 with JSON is a success");
        let BrainOutcome::Reply(reply) = outcome else {
            panic!("expected a reply outcome");
        };
        assert_eq!(reply.reply_text(), Some("Olá!"));
    }

    #[test]
    fn ok_with_garbage_body_is_a_protocol_violation() {
        let err = classify_response(StatusCode::OK, "<html>oops</html>")
            .expect_err("unparseable 200 body must fail the call");
        assert!(matches!(err, BrainError::InvalidReply(_)));
        assert!(err.is_forwarding_failure());
    }

    #[test]
    fn ok_with_empty_body_is_ignored_not_failed() {
        let outcome = classify_response(StatusCode::OK, "  ").expect("bodyless 200 is not fatal");
        assert!(matches!(outcome, BrainOutcome::Ignored { status: 200 }));
    }

    #[test]
    fn server_errors_are_forwarding_failures() {
        let err = classify_response(StatusCode::BAD_GATEWAY, "upstream down")
            .expect_err("5xx must fail the call");
        assert!(matches!(err, BrainError::Upstream { status: 502, .. }));
        assert!(err.is_forwarding_failure());
    }

    #[test]
    fn other_statuses_are_ignored_without_fallback() {
        let outcome =
            classify_response(StatusCode::IM_A_TEAPOT, "{}").expect("418 is not a failure");
        assert!(matches!(outcome, BrainOutcome::Ignored { status: 418 }));
    }

    #[test]
    fn client_rejects_non_http_endpoints() {
        assert!(matches!(
            BrainClient::new("ftp://brain.local/api", DEFAULT_REQUEST_TIMEOUT),
            Err(BrainError::InvalidEndpoint(_))
        ));
        assert!(BrainClient::new("http://localhost:8080/api/v1/brain/process", DEFAULT_REQUEST_TIMEOUT).is_ok());
    }
}
