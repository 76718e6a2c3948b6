//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::transition::TransitionResult;
use super::*;
use crate::db::ConversationState;
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn policy() -> WelcomePolicy {
    WelcomePolicy::new(Duration::from_secs(6 * 60 * 60))
}

/// Apply an event, delivering any requested welcome when `delivered` is set
fn apply(state: &ConversationState, now: i64, event: Event, delivered: bool) -> TransitionResult {
    let mut result = transition(state, now, event, &policy());
    if delivered && result.effects.contains(&Effect::SendWelcome) {
        result.new_state = transition(&result.new_state, now, Event::WelcomeDelivered, &policy()).new_state;
    }
    result
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_message_event() -> impl Strategy<Value = Event> {
    prop_oneof![Just(Event::CustomerMessage), Just(Event::OperatorMessage)]
}

/// (event, gap since previous event in ms, whether a requested send succeeds)
fn arb_steps() -> impl Strategy<Value = Vec<(Event, i64, bool)>> {
    prop::collection::vec(
        (arb_message_event(), 0i64..(12 * 60 * 60 * 1000), any::<bool>()),
        1..40,
    )
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn operator_messages_never_request_a_send(steps in arb_steps()) {
        let mut state = ConversationState::default();
        let mut now = 0;
        for (event, gap, delivered) in steps {
            now += gap;
            let result = apply(&state, now, event, delivered);
            if event == Event::OperatorMessage {
                prop_assert!(!result.effects.contains(&Effect::SendWelcome));
            }
            state = result.new_state;
        }
    }

    #[test]
    fn every_message_event_persists_exactly_once(steps in arb_steps()) {
        let mut state = ConversationState::default();
        let mut now = 0;
        for (event, gap, delivered) in steps {
            now += gap;
            let result = apply(&state, now, event, delivered);
            let persists = result.effects.iter().filter(|e| **e == Effect::PersistState).count();
            prop_assert_eq!(persists, 1);
            prop_assert_eq!(result.effects.last(), Some(&Effect::PersistState));
            state = result.new_state;
        }
    }

    #[test]
    fn operator_initiated_is_sticky_and_silences(steps in arb_steps()) {
        let mut state = transition(&ConversationState::default(), 0, Event::OperatorMessage, &policy()).new_state;
        prop_assert!(state.operator_initiated);

        let mut now = 0;
        for (event, gap, delivered) in steps {
            now += gap;
            let result = apply(&state, now, event, delivered);
            prop_assert!(result.new_state.operator_initiated);
            prop_assert!(!result.decision.should_send());
            state = result.new_state;
        }
        prop_assert_eq!(state.last_welcome_sent_at, None);
    }

    #[test]
    fn operator_initiated_only_without_customer_history(steps in arb_steps()) {
        let mut state = ConversationState::default();
        let mut now = 0;
        for (event, gap, delivered) in steps {
            now += gap;
            let before = state.clone();
            state = apply(&state, now, event, delivered).new_state;
            if !before.operator_initiated && state.operator_initiated {
                prop_assert_eq!(event, Event::OperatorMessage);
                prop_assert!(before.last_customer_message_at.is_none());
            }
        }
    }

    #[test]
    fn timestamps_never_move_backwards(steps in arb_steps()) {
        let mut state = ConversationState::default();
        let mut now = 0;
        for (event, gap, delivered) in steps {
            now += gap;
            let next = apply(&state, now, event, delivered).new_state;
            prop_assert!(next.last_customer_message_at >= state.last_customer_message_at);
            prop_assert!(next.previous_customer_message_at >= state.previous_customer_message_at);
            prop_assert!(next.last_operator_message_at >= state.last_operator_message_at);
            prop_assert!(next.last_welcome_sent_at >= state.last_welcome_sent_at);
            state = next;
        }
    }

    #[test]
    fn first_customer_message_always_qualifies(gap in 0i64..i64::from(u32::MAX)) {
        let result = transition(&ConversationState::default(), gap, Event::CustomerMessage, &policy());
        prop_assert_eq!(result.decision, Decision::FirstContact);
    }

    #[test]
    fn no_repeat_welcome_while_operator_covers(steps in arb_steps()) {
        let mut state = ConversationState::default();
        let mut now = 0;
        for (event, gap, delivered) in steps {
            now += gap;
            let result = apply(&state, now, event, delivered);
            if event == Event::CustomerMessage
                && state.last_welcome_sent_at.is_some()
                && state.operator_after_welcome()
            {
                prop_assert_eq!(result.decision, Decision::OperatorEngaged);
            }
            state = result.new_state;
        }
    }
}
