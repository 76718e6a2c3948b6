//! Pure state transition function
//!
//! Operator messages only update bookkeeping. Customer messages decide
//! whether a welcome is due:
//!
//! - never, once the operator opened the conversation;
//! - always, if no welcome was ever sent;
//! - otherwise only if no operator replied since the last welcome and the
//!   gap since the customer's previous message is at least the cooldown.
//!
//! The cooldown is anchored on the previous customer message, not on the last
//! welcome, so renewed activity after a long silence re-arms the welcome.

use super::{Effect, Event};
use crate::db::{ConversationState, Timestamp};
use std::fmt;
use std::time::Duration;

/// Tunables for the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WelcomePolicy {
    pub cooldown: Duration,
}

impl WelcomePolicy {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown }
    }

    fn cooldown_ms(&self) -> i64 {
        i64::try_from(self.cooldown.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Why a transition came out the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Operator message recorded, nothing to send
    OperatorRecorded,
    /// Operator opened this conversation; automation is off for good
    OperatorInitiated,
    /// No welcome was ever sent
    FirstContact,
    /// Operator silent since the last welcome and the customer was idle long enough
    CooldownElapsed,
    /// An operator replied after the last welcome
    OperatorEngaged,
    /// Customer's previous message is too recent
    CooldownActive,
    /// Welcome send completed
    Delivered,
}

impl Decision {
    pub fn should_send(self) -> bool {
        matches!(self, Decision::FirstContact | Decision::CooldownElapsed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Decision::OperatorRecorded => "operator_recorded",
            Decision::OperatorInitiated => "operator_initiated",
            Decision::FirstContact => "first_contact",
            Decision::CooldownElapsed => "cooldown_elapsed",
            Decision::OperatorEngaged => "operator_engaged",
            Decision::CooldownActive => "cooldown_active",
            Decision::Delivered => "delivered",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub decision: Decision,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    fn new(state: ConversationState, decision: Decision) -> Self {
        Self {
            new_state: state,
            decision,
            effects: vec![],
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Pure transition function.
///
/// Given the same inputs it always produces the same outputs. The caller
/// supplies `now`; nothing here reads the clock.
pub fn transition(
    state: &ConversationState,
    now: Timestamp,
    event: Event,
    policy: &WelcomePolicy,
) -> TransitionResult {
    let mut next = state.clone();

    match event {
        Event::OperatorMessage => {
            if !next.has_customer_activity() {
                next.operator_initiated = true;
            }
            next.last_operator_message_at = Some(now);
            TransitionResult::new(next, Decision::OperatorRecorded).with_effect(Effect::PersistState)
        }

        Event::CustomerMessage => {
            let previous = next.last_customer_message_at;
            next.previous_customer_message_at = previous;
            next.last_customer_message_at = Some(now);

            let decision = if next.operator_initiated {
                Decision::OperatorInitiated
            } else if next.last_welcome_sent_at.is_none() {
                Decision::FirstContact
            } else if next.operator_after_welcome() {
                Decision::OperatorEngaged
            } else if cooldown_elapsed(previous, now, policy) {
                Decision::CooldownElapsed
            } else {
                Decision::CooldownActive
            };

            let result = TransitionResult::new(next, decision);
            if decision.should_send() {
                result
                    .with_effect(Effect::SendWelcome)
                    .with_effect(Effect::PersistState)
            } else {
                result.with_effect(Effect::PersistState)
            }
        }

        // Persisting is left to the message event that triggered the send
        Event::WelcomeDelivered => {
            next.last_welcome_sent_at = Some(now);
            TransitionResult::new(next, Decision::Delivered)
        }
    }
}

/// No previous customer message counts as an infinitely long gap
fn cooldown_elapsed(previous: Option<Timestamp>, now: Timestamp, policy: &WelcomePolicy) -> bool {
    match previous {
        Some(previous) => now.saturating_sub(previous) >= policy.cooldown_ms(),
        None => true,
    }
}
