//! Effects produced by state transitions

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Ask the rate gate, then send the welcome text
    SendWelcome,
    /// Write the conversation state back to the store
    PersistState,
}
