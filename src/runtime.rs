//! Runtime for processing chat traffic
//!
//! Wires the decision engine to real I/O: the controller applies it to each
//! inbound message, the supervisor keeps a transport connection alive.

mod controller;
mod supervisor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use controller::{ConversationController, WelcomeSettings};
pub use supervisor::{supervise, ReconnectPolicy, SupervisorExit};
pub use traits::*;
