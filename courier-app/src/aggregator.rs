//! Per-sender debounce aggregation.
//!
//! Consecutive texts from one sender are buffered behind a resettable timer
//! and flushed as a single turn after the quiet period elapses with no new
//! message. Each buffer generation is flushed at most once.

use async_trait::async_trait;
use courier_channels::{MessageId, MessageKind, SenderId};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Snapshot of the most recent buffered message's metadata.
#[derive(Debug, Clone)]
pub struct TurnMeta {
    pub display_name: Option<String>,
    pub kind: MessageKind,
    pub last_message_id: MessageId,
    pub is_group: bool,
}

/// One aggregated unit of sender input, handed off at flush time.
#[derive(Debug, Clone)]
pub struct AggregatedTurn {
    pub turn_id: Uuid,
    pub sender_id: SenderId,
    pub texts: Vec<String>,
    pub meta: TurnMeta,
}

/// Consumer of flushed turns. In production this is the forward pipeline.
#[async_trait]
pub trait TurnSink: Send + Sync {
    async fn deliver(&self, turn: AggregatedTurn);
}

struct SenderBuffer {
    texts: Vec<String>,
    last_meta: TurnMeta,
    /// Bumped on every ingest; a timer flushes only the generation it was
    /// armed for, so a stale timer that lost a re-arm race no-ops.
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct TurnAggregator {
    inner: Arc<AggregatorInner>,
}

struct AggregatorInner {
    buffers: DashMap<SenderId, SenderBuffer>,
    quiet_period: Duration,
    sink: Arc<dyn TurnSink>,
}

impl TurnAggregator {
    pub fn new(quiet_period: Duration, sink: Arc<dyn TurnSink>) -> Self {
        Self {
            inner: Arc::new(AggregatorInner {
                buffers: DashMap::new(),
                quiet_period,
                sink,
            }),
        }
    }

    /// Buffer one message and re-arm the sender's flush timer for a full
    /// quiet period from now.
    pub fn ingest(&self, sender_id: SenderId, text: String, meta: TurnMeta) {
        let buffered = {
            let mut entry = self
                .inner
                .buffers
                .entry(sender_id.clone())
                .or_insert_with(|| SenderBuffer {
                    texts: Vec::new(),
                    last_meta: meta.clone(),
                    generation: 0,
                    timer: None,
                });
            entry.texts.push(text);
            entry.last_meta = meta;
            entry.generation += 1;
            if let Some(stale) = entry.timer.take() {
                stale.abort();
            }
            entry.timer = Some(self.arm_timer(sender_id.clone(), entry.generation));
            entry.texts.len()
        };
        tracing::debug!(
            sender_id = %sender_id,
            buffered,
            quiet_period_ms = self.inner.quiet_period.as_millis() as u64,
            "message buffered; flush scheduled after quiet period"
        );
    }

    fn arm_timer(&self, sender_id: SenderId, generation: u64) -> JoinHandle<()> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.quiet_period).await;
            inner.flush(sender_id, generation);
        })
    }
}

impl AggregatorInner {
    /// Remove the sender's buffer and hand it to the sink. The removal is
    /// atomic and generation-checked: a message racing an in-flight flush
    /// always lands in a brand-new buffer, never in the snapshot being sent.
    fn flush(&self, sender_id: SenderId, generation: u64) {
        let Some((_, buffer)) = self
            .buffers
            .remove_if(&sender_id, |_, buffer| buffer.generation == generation)
        else {
            return;
        };
        if buffer.texts.is_empty() {
            return;
        }

        let turn = AggregatedTurn {
            turn_id: Uuid::new_v4(),
            sender_id,
            texts: buffer.texts,
            meta: buffer.last_meta,
        };
        tracing::info!(
            turn_id = %turn.turn_id,
            sender_id = %turn.sender_id,
            messages = turn.texts.len(),
            "quiet period elapsed; forwarding aggregated turn"
        );

        // Detached task: a later ingest aborts only the timer, never an
        // in-flight forward.
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            sink.deliver(turn).await;
        });
    }
}
