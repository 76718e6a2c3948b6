//! Events that can occur in a conversation

/// Who authored an inbound message event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Sent by the remote party
    Customer,
    /// Sent from our own account, i.e. by a human operator
    Operator,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CustomerMessage,
    OperatorMessage,
    /// The welcome send resolved successfully
    WelcomeDelivered,
}

impl From<Direction> for Event {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Customer => Event::CustomerMessage,
            Direction::Operator => Event::OperatorMessage,
        }
    }
}
