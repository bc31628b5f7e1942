use crate::traits::ChannelTransport;
use crate::types::{MessageId, Presence, SentReceipt};
use anyhow::{Result, anyhow};
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Thin REST adapter to the socket-gateway sidecar that owns the messaging
/// session (authentication, pairing, socket lifecycle). Inbound events are
/// delivered via the webhook route wiring in courier-app.
#[derive(Clone)]
pub struct SocketGatewayTransport {
    http: reqwest::Client,
    api_base_url: String,
    api_token: Option<String>,
}

impl SocketGatewayTransport {
    pub fn new(api_base_url: &str) -> Result<Self> {
        let api_base_url = normalize_api_base_url(api_base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            api_base_url,
            api_token: None,
        })
    }

    pub fn with_api_token(mut self, api_token: Option<String>) -> Self {
        self.api_token = api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned);
        self
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.api_base_url, path))
            .map_err(|e| anyhow!("invalid socket gateway URL path {path:?}: {e}"))
    }

    fn authorized_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait::async_trait]
impl ChannelTransport for SocketGatewayTransport {
    fn transport_id(&self) -> &str {
        "socket-gateway"
    }

    async fn is_connected(&self) -> bool {
        let Ok(url) = self.api_url("/v1/status") else {
            return false;
        };
        let response = match self.authorized_request(self.http.get(url)).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%error, "socket gateway status probe failed");
                return false;
            }
        };
        if !response.status().is_success() {
            return false;
        }
        response
            .json::<GatewayStatus>()
            .await
            .map(|status| status.connected)
            .unwrap_or(false)
    }

    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<SentReceipt> {
        let recipient_id = recipient_id.trim();
        if recipient_id.is_empty() {
            return Err(anyhow!("recipient_id (chat or group address) is required"));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(anyhow!("message text is empty"));
        }

        let url = self.api_url("/v1/messages")?;
        let payload = serde_json::json!({
            "recipient": recipient_id,
            "text": text,
        });
        let response = self
            .authorized_request(self.http.post(url))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "socket gateway send failed: status={status} body={body}"
            ));
        }

        let receipt: GatewaySendResponse = response.json().await.unwrap_or_default();
        Ok(SentReceipt {
            message_id: receipt.message_id.map(MessageId::new),
            sent_at: Utc::now(),
        })
    }

    async fn send_presence(&self, recipient_id: &str, presence: Presence) -> Result<()> {
        let url = self.api_url("/v1/presence")?;
        let payload = serde_json::json!({
            "recipient": recipient_id,
            "state": presence.as_str(),
        });
        let response = self
            .authorized_request(self.http.post(url))
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "socket gateway presence update failed: status={status} body={body}"
            ));
        }
        Ok(())
    }

    fn supports_presence(&self) -> bool {
        true
    }
}

fn normalize_api_base_url(raw: &str) -> Result<String> {
    let normalized = raw.trim().trim_end_matches('/').to_string();
    if normalized.is_empty() {
        return Err(anyhow!("socket gateway api_base_url is required"));
    }
    let parsed =
        Url::parse(&normalized).map_err(|e| anyhow!("invalid socket gateway api_base_url: {e}"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(normalized),
        other => Err(anyhow!(
            "invalid socket gateway api_base_url scheme: {other} (expected http or https)"
        )),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GatewayStatus {
    connected: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GatewaySendResponse {
    message_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::normalize_api_base_url;

    #[test]
    fn normalize_api_base_url_requires_http_or_https() {
        assert_eq!(
            normalize_api_base_url("http://localhost:3001/")
                .expect("http URL should normalize"),
            "http://localhost:3001"
        );
        assert!(normalize_api_base_url("unix:///tmp/gateway.sock").is_err());
        assert!(normalize_api_base_url("   ").is_err());
    }
}
