//! Courier configuration loader.

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub server: ServerConfig,
    pub brain: BrainConfig,
    pub debounce: DebounceConfig,
    pub conversation: ConversationConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub http_timeout_seconds: u64,
    pub http_max_in_flight: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            http_timeout_seconds: 60,
            http_max_in_flight: 256,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Base URL of the reasoning service.
    pub url: String,
    pub endpoint_path: String,
    pub request_timeout_seconds: u64,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            endpoint_path: "/api/v1/brain/process".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Quiet period D: a turn flushes only after this long with no new
    /// message from the sender.
    pub quiet_period_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: 6000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Phrases that end the active session (trimmed, case-insensitive match).
    pub exit_phrases: Vec<String>,
    /// Sent to the sender when forwarding to the reasoning service fails.
    pub fallback_text: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            exit_phrases: vec!["tchau courier".to_string(), "exit".to_string()],
            fallback_text: "Assistente temporariamente indisponível. Tente novamente em instantes."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Socket-gateway sidecar REST API.
    pub api_base_url: String,
    pub api_token: Option<String>,
    /// Prefixed to normalized phone numbers that do not already carry it.
    pub default_country_code: String,
    /// Appended to normalized phone numbers to form an individual address.
    pub address_suffix: String,
    /// Append deliveries older than this are discarded unprocessed.
    pub stale_after_seconds: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".to_string(),
            api_token: None,
            default_country_code: "55".to_string(),
            address_suffix: "s.whatsapp.net".to_string(),
            stale_after_seconds: 300,
        }
    }
}

impl CourierConfig {
    /// Load from an explicit path, `COURIER_CONFIG`, or `courier.toml`;
    /// a missing file yields the defaults. Environment variables
    /// `COURIER_BRAIN_URL` and `PORT` override the file.
    pub async fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = path
            .or_else(|| std::env::var("COURIER_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("courier.toml"));

        let mut cfg = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => toml::from_str(&contents).map_err(|e| {
                anyhow::anyhow!("failed to parse config {}: {e}", path.display())
            })?,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "config file not found; using defaults");
                Self::default()
            }
            Err(error) => {
                return Err(anyhow::anyhow!(
                    "failed to read config {}: {error}",
                    path.display()
                ));
            }
        };

        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("COURIER_BRAIN_URL") {
            let url = url.trim();
            if !url.is_empty() {
                self.brain.url = url.to_string();
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.trim().parse::<u16>() {
                self.server.port = port;
            }
        }
    }

    /// Full URL of the reasoning-service process endpoint.
    pub fn brain_endpoint(&self) -> String {
        format!(
            "{}{}",
            self.brain.url.trim_end_matches('/'),
            self.brain.endpoint_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::CourierConfig;

    #[test]
    fn defaults_cover_every_section() {
        let cfg: CourierConfig = toml::from_str("").expect("empty config should parse");
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.debounce.quiet_period_ms, 6000);
        assert_eq!(cfg.brain.request_timeout_seconds, 30);
        assert_eq!(cfg.transport.stale_after_seconds, 300);
        assert_eq!(cfg.conversation.exit_phrases.len(), 2);
        assert_eq!(
            cfg.brain_endpoint(),
            "http://localhost:8080/api/v1/brain/process"
        );
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let cfg: CourierConfig = toml::from_str(
            r#"
[brain]
url = "http://brain.internal:9090/"

[debounce]
quiet_period_ms = 2500
"#,
        )
        .expect("partial config should parse");
        assert_eq!(cfg.debounce.quiet_period_ms, 2500);
        assert_eq!(
            cfg.brain_endpoint(),
            "http://brain.internal:9090/api/v1/brain/process"
        );
        assert_eq!(cfg.server.port, 3000);
    }
}
