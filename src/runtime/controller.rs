//! Conversation controller
//!
//! Consumes transport frames one at a time, runs the decision engine and
//! carries out its effects against the rate gate, the send primitive and the
//! contact store.

use super::supervisor::SessionEnd;
use super::traits::{Clock, Messenger};
use crate::db::ContactDb;
use crate::rate_gate::RateGate;
use crate::state_machine::{transition, Decision, Effect, Event, WelcomePolicy};
use crate::transport::{ConversationId, EventStream, Excluded, InboundMessage, TransportEvent};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

/// What to send and when
#[derive(Debug, Clone)]
pub struct WelcomeSettings {
    pub text: String,
    pub policy: WelcomePolicy,
    /// Upper bound on one send; exceeding it counts as a failed send
    pub send_timeout: Duration,
}

/// Why a message event was dropped before reaching the decision engine
#[allow(dead_code)] // Inspected in tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoContent,
    Excluded(Excluded),
}

/// What happened to the welcome for one processed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Decision engine did not ask for a send
    NotDue,
    Sent,
    /// Rate gate denied the send; nothing was attempted
    RateLimited,
    /// Send returned an error or timed out
    Failed,
}

#[allow(dead_code)] // Inspected in tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Ignored(IgnoreReason),
    Processed {
        conversation_id: ConversationId,
        decision: Decision,
        dispatch: Dispatch,
    },
}

/// Applies the welcome logic to inbound message events
pub struct ConversationController<M: Messenger> {
    store: ContactDb,
    gate: Arc<RateGate>,
    messenger: M,
    clock: Arc<dyn Clock>,
    settings: WelcomeSettings,
}

impl<M: Messenger> ConversationController<M> {
    pub fn new(
        store: ContactDb,
        gate: Arc<RateGate>,
        messenger: M,
        clock: Arc<dyn Clock>,
        settings: WelcomeSettings,
    ) -> Self {
        Self {
            store,
            gate,
            messenger,
            clock,
            settings,
        }
    }

    /// Drive one connection's frames until it closes
    #[allow(clippy::needless_pass_by_value)] // The stream belongs to this session
    pub async fn run_session(&self, mut events: EventStream) -> SessionEnd {
        let mut end = SessionEnd::default();

        while let Some(frame) = events.next().await {
            match frame {
                Ok(TransportEvent::Open) => {
                    end.opened = true;
                    tracing::info!("Chat transport connected");
                }
                Ok(TransportEvent::Message(message)) => {
                    self.handle(&message).await;
                }
                Ok(TransportEvent::Close { status }) => {
                    end.status = status;
                    return end;
                }
                Err(e) => {
                    end.status = e.status;
                    end.error = Some(e);
                    return end;
                }
            }
        }

        end
    }

    /// Process one message event.
    ///
    /// The store lock is held from read to write-back, send included, so no
    /// other read-modify-write of the contact table can interleave.
    pub async fn handle(&self, message: &InboundMessage) -> MessageOutcome {
        if !message.has_content {
            tracing::debug!(remote = %message.remote, "Ignoring message without content");
            return MessageOutcome::Ignored(IgnoreReason::NoContent);
        }

        let conversation_id = match ConversationId::from_address(&message.remote) {
            Ok(id) => id,
            Err(reason) => {
                tracing::debug!(remote = %message.remote, ?reason, "Ignoring non-customer conversation");
                return MessageOutcome::Ignored(IgnoreReason::Excluded(reason));
            }
        };

        let mut contacts = self.store.lock().await;
        let current = contacts.get(conversation_id.as_str());
        let result = transition(
            &current,
            self.clock.now(),
            message.direction().into(),
            &self.settings.policy,
        );

        let decision = result.decision;
        let mut state = result.new_state;
        let mut dispatch = Dispatch::NotDue;

        for effect in result.effects {
            match effect {
                Effect::SendWelcome => {
                    dispatch = self.send_welcome(&message.remote, &conversation_id).await;
                    if dispatch == Dispatch::Sent {
                        // Stamped after the send resolved
                        let delivered_at = self.clock.now();
                        state = transition(&state, delivered_at, Event::WelcomeDelivered, &self.settings.policy)
                            .new_state;
                    }
                }
                Effect::PersistState => {
                    contacts.put(conversation_id.as_str(), state.clone());
                }
            }
        }

        tracing::debug!(
            conversation_id = %conversation_id,
            decision = %decision,
            dispatch = ?dispatch,
            "Processed message"
        );

        MessageOutcome::Processed {
            conversation_id,
            decision,
            dispatch,
        }
    }

    async fn send_welcome(&self, address: &str, conversation_id: &ConversationId) -> Dispatch {
        if !self.gate.try_admit() {
            tracing::warn!(
                conversation_id = %conversation_id,
                limit_per_minute = self.gate.limit(),
                "Rate limit reached, welcome not sent"
            );
            return Dispatch::RateLimited;
        }

        let send = self.messenger.send_text(address, &self.settings.text);
        match tokio::time::timeout(self.settings.send_timeout, send).await {
            Ok(Ok(())) => {
                tracing::info!(conversation_id = %conversation_id, "Welcome sent");
                Dispatch::Sent
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    error = %e,
                    retryable = e.kind.is_retryable(),
                    "Welcome send failed"
                );
                Dispatch::Failed
            }
            Err(_) => {
                tracing::warn!(
                    conversation_id = %conversation_id,
                    timeout_ms = %self.settings.send_timeout.as_millis(),
                    "Welcome send timed out"
                );
                Dispatch::Failed
            }
        }
    }
}
