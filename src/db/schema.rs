//! On-disk state types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Per-conversation welcome bookkeeping.
///
/// `None` means "never happened". Legacy field names are accepted on load so
/// state files written by older deployments keep working.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversationState {
    #[serde(alias = "lastCustomerMsg", skip_serializing_if = "Option::is_none")]
    pub last_customer_message_at: Option<Timestamp>,
    #[serde(alias = "prevCustomerMsg", skip_serializing_if = "Option::is_none")]
    pub previous_customer_message_at: Option<Timestamp>,
    #[serde(alias = "lastOperatorMsg", skip_serializing_if = "Option::is_none")]
    pub last_operator_message_at: Option<Timestamp>,
    #[serde(alias = "lastWelcome", skip_serializing_if = "Option::is_none")]
    pub last_welcome_sent_at: Option<Timestamp>,
    /// Operator spoke before the customer ever did. Sticky.
    #[serde(alias = "operatorFirst")]
    pub operator_initiated: bool,
}

impl ConversationState {
    /// True once any customer message has been recorded
    pub fn has_customer_activity(&self) -> bool {
        self.last_customer_message_at.is_some()
    }

    /// Whether an operator replied after the most recent automated welcome.
    ///
    /// Strictly greater: an operator message stamped at the same instant as the
    /// welcome does not count as coverage.
    pub fn operator_after_welcome(&self) -> bool {
        match (self.last_operator_message_at, self.last_welcome_sent_at) {
            (Some(operator), Some(welcome)) => operator > welcome,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Root of the durable state file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactsFile {
    #[serde(default)]
    pub contacts: BTreeMap<String, ConversationState>,
}
