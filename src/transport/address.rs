//! Conversation addressing

use std::fmt;

const GROUP_SUFFIX: &str = "@g.us";
const BROADCAST_SUFFIX: &str = "@broadcast";

/// Stable key for one customer thread: the address part before `@`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(String);

/// Why an address does not map to a customer conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Excluded {
    Group,
    Broadcast,
    Empty,
}

impl ConversationId {
    /// Derive the id from a transport address such as `628123@s.whatsapp.net`
    pub fn from_address(address: &str) -> Result<Self, Excluded> {
        if address.ends_with(GROUP_SUFFIX) {
            return Err(Excluded::Group);
        }
        if address.ends_with(BROADCAST_SUFFIX) {
            return Err(Excluded::Broadcast);
        }
        let id = address.split('@').next().unwrap_or_default().trim();
        if id.is_empty() {
            return Err(Excluded::Empty);
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
