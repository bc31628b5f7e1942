//! Relays reasoning-service replies back through the transport with a
//! naturalistic typing delay, and best-effort fallback notification.

use crate::state::ConversationStore;
use courier_channels::{ChannelTransport, Presence, SenderId};
use std::sync::Arc;
use std::time::Duration;

const TYPING_FLOOR_MS: u64 = 1000;
const TYPING_CAP_MS: u64 = 4000;
const TYPING_PER_CHAR_MS: u64 = 25;

pub struct ReplyDispatcher {
    transport: Arc<dyn ChannelTransport>,
    state: Arc<ConversationStore>,
    fallback_text: String,
}

impl ReplyDispatcher {
    pub fn new(
        transport: Arc<dyn ChannelTransport>,
        state: Arc<ConversationStore>,
        fallback_text: String,
    ) -> Self {
        Self {
            transport,
            state,
            fallback_text,
        }
    }

    /// Mark the conversation active and relay the reply. Presence updates
    /// are cosmetic: their failure must never suppress the text send.
    #[tracing::instrument(level = "info", skip_all, fields(sender_id = %sender_id))]
    pub async fn deliver_reply(&self, sender_id: &SenderId, reply_text: &str) {
        self.state.set(sender_id, true);

        if let Err(error) = self
            .transport
            .send_presence(sender_id, Presence::Composing)
            .await
        {
            tracing::debug!(%error, "composing presence failed; replying without it");
        }
        tokio::time::sleep(typing_delay(reply_text)).await;

        if let Err(error) = self.transport.send_text(sender_id, reply_text).await {
            tracing::error!(%error, "reply send failed");
            return;
        }

        if let Err(error) = self
            .transport
            .send_presence(sender_id, Presence::Paused)
            .await
        {
            tracing::debug!(%error, "paused presence failed after reply");
        }
    }

    /// Best-effort apology when forwarding failed: not retried, never
    /// propagated, and the conversation state is left untouched.
    #[tracing::instrument(level = "info", skip_all, fields(sender_id = %sender_id))]
    pub async fn deliver_fallback(&self, sender_id: &SenderId) {
        if let Err(error) = self.transport.send_text(sender_id, &self.fallback_text).await {
            tracing::error!(%error, "fallback send failed");
        }
    }
}

/// Simulated typing time: a ~1s floor for short replies, 25ms per character,
/// capped at 4s for long ones.
pub fn typing_delay(reply_text: &str) -> Duration {
    let chars = reply_text.chars().count() as u64;
    Duration::from_millis((TYPING_FLOOR_MS + chars * TYPING_PER_CHAR_MS).min(TYPING_CAP_MS))
}

#[cfg(test)]
mod tests {
    use super::{ReplyDispatcher, typing_delay};
    use crate::state::ConversationStore;
    use anyhow::Result;
    use courier_channels::{ChannelTransport, Presence, SenderId, SentReceipt};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct StubTransport {
        sent: Mutex<Vec<(String, String)>>,
        presence: Mutex<Vec<(String, Presence)>>,
        fail_presence: bool,
        fail_send: bool,
    }

    #[async_trait::async_trait]
    impl ChannelTransport for StubTransport {
        fn transport_id(&self) -> &str {
            "stub"
        }

        async fn is_connected(&self) -> bool {
            true
        }

        async fn send_text(&self, recipient_id: &str, text: &str) -> Result<SentReceipt> {
            if self.fail_send {
                return Err(anyhow::anyhow!("stub send failure"));
            }
            self.sent
                .lock()
                .expect("sent lock")
                .push((recipient_id.to_string(), text.to_string()));
            Ok(SentReceipt {
                message_id: Some("stub-1".into()),
                sent_at: chrono::Utc::now(),
            })
        }

        async fn send_presence(&self, recipient_id: &str, presence: Presence) -> Result<()> {
            if self.fail_presence {
                return Err(anyhow::anyhow!("stub presence failure"));
            }
            self.presence
                .lock()
                .expect("presence lock")
                .push((recipient_id.to_string(), presence));
            Ok(())
        }

        fn supports_presence(&self) -> bool {
            true
        }
    }

    fn dispatcher(transport: &Arc<StubTransport>) -> (ReplyDispatcher, Arc<ConversationStore>) {
        let state = Arc::new(ConversationStore::new());
        (
            ReplyDispatcher::new(
                Arc::clone(transport) as Arc<dyn ChannelTransport>,
                Arc::clone(&state),
                "indisponível".to_string(),
            ),
            state,
        )
    }

    #[test]
    fn typing_delay_has_floor_linear_middle_and_cap() {
        assert_eq!(typing_delay("").as_millis(), 1000);
        assert_eq!(typing_delay(&"x".repeat(40)).as_millis(), 2000);
        assert_eq!(typing_delay(&"x".repeat(400)).as_millis(), 4000);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_sends_text_between_presence_updates_and_activates_session() {
        let transport = Arc::new(StubTransport::default());
        let (dispatcher, state) = dispatcher(&transport);
        let ana = SenderId::from("ana@s.whatsapp.net");

        dispatcher.deliver_reply(&ana, "Olá!").await;

        assert!(state.get(&ana), "a delivered reply activates the session");
        let sent = transport.sent.lock().expect("sent lock").clone();
        assert_eq!(sent, vec![("ana@s.whatsapp.net".to_string(), "Olá!".to_string())]);
        let presence = transport.presence.lock().expect("presence lock").clone();
        assert_eq!(presence.len(), 2);
        assert_eq!(presence[0].1, Presence::Composing);
        assert_eq!(presence[1].1, Presence::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn presence_failure_never_suppresses_the_reply() {
        let transport = Arc::new(StubTransport {
            fail_presence: true,
            ..StubTransport::default()
        });
        let (dispatcher, state) = dispatcher(&transport);
        let ana = SenderId::from("ana@s.whatsapp.net");

        dispatcher.deliver_reply(&ana, "Olá!").await;

        let sent = transport.sent.lock().expect("sent lock").clone();
        assert_eq!(sent.len(), 1, "text must be sent exactly once");
        assert_eq!(sent[0].1, "Olá!");
        assert!(state.get(&ana));
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_sends_fixed_text_without_touching_state() {
        let transport = Arc::new(StubTransport::default());
        let (dispatcher, state) = dispatcher(&transport);
        let ana = SenderId::from("ana@s.whatsapp.net");

        dispatcher.deliver_fallback(&ana).await;

        let sent = transport.sent.lock().expect("sent lock").clone();
        assert_eq!(sent, vec![(
            "ana@s.whatsapp.net".to_string(),
            "indisponível".to_string()
        )]);
        assert!(!state.get(&ana), "fallback must not activate the session");
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_send_failure_is_swallowed() {
        let transport = Arc::new(StubTransport {
            fail_send: true,
            ..StubTransport::default()
        });
        let (dispatcher, _state) = dispatcher(&transport);

        // Must not panic or propagate.
        dispatcher
            .deliver_fallback(&SenderId::from("ana@s.whatsapp.net"))
            .await;
    }
}
