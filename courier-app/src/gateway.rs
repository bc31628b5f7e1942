//! Inbound event loop: all transport events funnel through a single queue.

use crate::aggregator::{TurnAggregator, TurnMeta};
use crate::state::ConversationStore;
use chrono::{Duration as ChronoDuration, Utc};
use courier_channels::{DeliveryKind, InboundEvent, classify};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Gateway {
    state: Arc<ConversationStore>,
    aggregator: TurnAggregator,
    exit_phrases: Vec<String>,
    stale_after: ChronoDuration,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundEvent>>,
}

impl Gateway {
    pub fn new(
        state: Arc<ConversationStore>,
        aggregator: TurnAggregator,
        exit_phrases: &[String],
        stale_after_seconds: u64,
        inbound_rx: mpsc::Receiver<InboundEvent>,
    ) -> Self {
        Self {
            state,
            aggregator,
            exit_phrases: exit_phrases
                .iter()
                .map(|phrase| phrase.trim().to_lowercase())
                .filter(|phrase| !phrase.is_empty())
                .collect(),
            stale_after: ChronoDuration::seconds(stale_after_seconds as i64),
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
        }
    }

    pub fn start(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop(shutdown).await;
            tracing::info!("gateway loop exited");
        })
    }

    #[tracing::instrument(level = "info", skip_all)]
    async fn run_loop(&self, shutdown: CancellationToken) {
        let mut rx = self.inbound_rx.lock().await;
        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => return,
                event = rx.recv() => event,
            };
            let Some(event) = event else {
                return;
            };
            self.handle_event(event);
        }
    }

    fn handle_event(&self, event: InboundEvent) {
        if event.from_me {
            return;
        }
        let Some(content) = event.content.as_ref() else {
            return;
        };
        if event.delivery == DeliveryKind::Append {
            let age = Utc::now().signed_duration_since(event.timestamp);
            if age > self.stale_after {
                // Stale history replayed after a reconnect: drop unprocessed.
                return;
            }
        }

        let classified = classify(content);
        let text = classified.text.trim();
        if text.is_empty() {
            tracing::debug!(
                sender_id = %event.sender_id,
                kind = classified.kind.as_str(),
                "event ignored (no usable text)"
            );
            return;
        }
        tracing::info!(
            sender_id = %event.sender_id,
            kind = classified.kind.as_str(),
            delivery = ?event.delivery,
            "inbound message accepted"
        );

        // The exit signal is recorded before buffering; the message itself
        // still forwards like any other text.
        if self.matches_exit_phrase(text) {
            self.state.set(&event.sender_id, false);
        }

        let meta = TurnMeta {
            display_name: event.push_name.clone(),
            kind: classified.kind,
            last_message_id: event.message_id.clone(),
            is_group: event.is_group,
        };
        self.aggregator
            .ingest(event.sender_id.clone(), text.to_string(), meta);
    }

    fn matches_exit_phrase(&self, text: &str) -> bool {
        let folded = text.trim().to_lowercase();
        self.exit_phrases.iter().any(|phrase| *phrase == folded)
    }
}
