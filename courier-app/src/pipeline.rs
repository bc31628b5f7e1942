//! Forward pipeline: aggregated turn -> reasoning service -> dispatcher.

use crate::aggregator::{AggregatedTurn, TurnSink};
use crate::dispatcher::ReplyDispatcher;
use crate::state::ConversationStore;
use async_trait::async_trait;
use chrono::Utc;
use courier_brain::{BrainClient, BrainError, BrainOutcome, TurnBody, TurnPayload};
use std::sync::Arc;

pub struct BrainPipeline {
    brain: BrainClient,
    state: Arc<ConversationStore>,
    dispatcher: Arc<ReplyDispatcher>,
}

impl BrainPipeline {
    pub fn new(
        brain: BrainClient,
        state: Arc<ConversationStore>,
        dispatcher: Arc<ReplyDispatcher>,
    ) -> Self {
        Self {
            brain,
            state,
            dispatcher,
        }
    }

    fn build_payload(&self, turn: &AggregatedTurn) -> TurnPayload {
        TurnPayload {
            conversation_activate: self.state.get(&turn.sender_id),
            from: turn.sender_id.to_string(),
            time_stamp: Utc::now().timestamp_millis(),
            name: turn.meta.display_name.clone(),
            menssage_id: turn.meta.last_message_id.to_string(),
            is_group: turn.meta.is_group,
            message_type: turn.meta.kind.as_str().to_string(),
            device_type: courier_brain::DEVICE_TYPE.to_string(),
            body: TurnBody::from_texts(turn.texts.clone()),
        }
    }

    async fn handle_outcome(
        &self,
        turn: &AggregatedTurn,
        outcome: Result<BrainOutcome, BrainError>,
    ) {
        match outcome {
            Ok(BrainOutcome::NoReply) => {
                tracing::info!(turn_id = %turn.turn_id, "reasoning service returned 204; nothing to relay");
            }
            Ok(BrainOutcome::Reply(reply)) => match reply.reply_text() {
                Some(text) => {
                    self.dispatcher.deliver_reply(&turn.sender_id, text).await;
                }
                None => {
                    tracing::info!(
                        turn_id = %turn.turn_id,
                        is_success = reply.is_success,
                        "reasoning service returned no reply text"
                    );
                }
            },
            Ok(BrainOutcome::Ignored { status }) => {
                tracing::warn!(
                    turn_id = %turn.turn_id,
                    status,
                    "unexpected reasoning service status; dropping reply"
                );
            }
            Err(error) => {
                tracing::error!(turn_id = %turn.turn_id, %error, "turn forwarding failed; sending fallback");
                self.dispatcher.deliver_fallback(&turn.sender_id).await;
            }
        }
    }
}

#[async_trait]
impl TurnSink for BrainPipeline {
    async fn deliver(&self, turn: AggregatedTurn) {
        if turn.texts.is_empty() {
            return;
        }
        let payload = self.build_payload(&turn);
        let outcome = self.brain.process(&payload).await;
        self.handle_outcome(&turn, outcome).await;
    }
}
