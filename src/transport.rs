//! Chat transport boundary
//!
//! The chat network itself lives behind a bridge process. This module
//! describes what comes out of it (connection lifecycle and message frames)
//! and how conversation ids are derived from its addresses.

mod address;
pub mod bridge;
mod error;

pub use address::{ConversationId, Excluded};
pub use bridge::BridgeTransport;
pub use error::{TransportError, UNAUTHORIZED_STATUS};
#[cfg(test)]
pub use error::TransportErrorKind;

use crate::state_machine::event::Direction;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// One frame of the inbound event stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    Open,
    Close {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },
    Message(InboundMessage),
}

/// A message observed on the chat account, in either direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    /// Address of the other party (for our own messages, the recipient)
    pub remote: String,
    /// Authored from our own account
    #[serde(default)]
    pub from_me: bool,
    /// Carries renderable content (not a receipt, reaction stub, etc.)
    pub has_content: bool,
}

impl InboundMessage {
    pub fn direction(&self) -> Direction {
        if self.from_me {
            Direction::Operator
        } else {
            Direction::Customer
        }
    }
}

/// Stream of frames for one connection; ends when the connection drops
pub type EventStream = BoxStream<'static, Result<TransportEvent, TransportError>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_decoding() {
        let open: TransportEvent = serde_json::from_str(r#"{"type":"open"}"#).unwrap();
        assert_eq!(open, TransportEvent::Open);

        let close: TransportEvent = serde_json::from_str(r#"{"type":"close","status":401}"#).unwrap();
        assert_eq!(close, TransportEvent::Close { status: Some(401) });

        let close: TransportEvent = serde_json::from_str(r#"{"type":"close"}"#).unwrap();
        assert_eq!(close, TransportEvent::Close { status: None });

        let msg: TransportEvent = serde_json::from_str(
            r#"{"type":"message","remote":"628123@s.whatsapp.net","fromMe":true,"hasContent":true}"#,
        )
        .unwrap();
        let TransportEvent::Message(msg) = msg else {
            panic!("Expected message frame");
        };
        assert_eq!(msg.direction(), Direction::Operator);
    }

    #[test]
    fn test_from_me_defaults_to_customer() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"remote":"628123@s.whatsapp.net","hasContent":false}"#).unwrap();
        assert_eq!(msg.direction(), Direction::Customer);
        assert!(!msg.has_content);
    }
}
