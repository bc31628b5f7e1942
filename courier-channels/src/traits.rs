use crate::types::{Presence, SentReceipt};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ChannelTransport: Send + Sync {
    /// Unique transport identifier: "socket-gateway", "stub".
    fn transport_id(&self) -> &str;

    /// Whether the underlying messaging session is currently established.
    async fn is_connected(&self) -> bool;

    /// Send a text message to a chat or group address.
    async fn send_text(&self, recipient_id: &str, text: &str) -> Result<SentReceipt>;

    /// Send a presence update (composing/paused) where supported.
    /// Transports without presence should keep the default.
    async fn send_presence(&self, _recipient_id: &str, _presence: Presence) -> Result<()> {
        Err(anyhow::anyhow!(
            "presence updates are not supported by this transport"
        ))
    }

    fn supports_presence(&self) -> bool {
        false
    }
}
