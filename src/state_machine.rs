//! Welcome decision state machine
//!
//! Pure transitions: given a conversation's state, the current instant and
//! an event, produce the next state and the effects the runtime must carry
//! out. No I/O happens here.

mod effect;
pub mod event;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use transition::{transition, Decision, WelcomePolicy};
