//! Connection supervisor
//!
//! Connect, drive the controller until the connection drops, wait, repeat.
//! An unauthorized status stops the loop: the credentials are gone and only
//! an out-of-band re-pairing can fix that.

use super::controller::ConversationController;
use super::traits::{Messenger, Transport};
use crate::transport::{TransportError, UNAUTHORIZED_STATUS};
use std::time::Duration;

/// Fixed delay between reconnects
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    /// Consecutive failed attempts before giving up; `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
            max_attempts: None,
        }
    }
}

/// How one connection ended
#[derive(Debug, Default)]
pub struct SessionEnd {
    /// The transport reported the connection as open at some point
    pub opened: bool,
    /// Status code attached to the close, if any
    pub status: Option<u16>,
    /// Stream error that ended the session, if any
    pub error: Option<TransportError>,
}

impl SessionEnd {
    pub fn is_unauthorized(&self) -> bool {
        self.status == Some(UNAUTHORIZED_STATUS)
            || self.error.as_ref().is_some_and(TransportError::is_unauthorized)
    }
}

/// Why the supervisor stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// Transport rejected our credentials
    Unauthorized,
    /// `max_attempts` consecutive attempts failed
    AttemptsExhausted { attempts: u32 },
}

/// Keep the transport connected and feed every session to the controller.
///
/// A session that reached `open` resets the failure count.
pub async fn supervise<T, M>(
    transport: &T,
    controller: &ConversationController<M>,
    policy: &ReconnectPolicy,
) -> SupervisorExit
where
    T: Transport + ?Sized,
    M: Messenger,
{
    let mut failures: u32 = 0;

    loop {
        match transport.connect().await {
            Ok(events) => {
                let end = controller.run_session(events).await;
                if end.opened {
                    failures = 0;
                }
                if end.is_unauthorized() {
                    tracing::error!(status = ?end.status, "Chat session unauthorized, not reconnecting");
                    return SupervisorExit::Unauthorized;
                }
                match &end.error {
                    Some(e) => tracing::warn!(status = ?end.status, error = %e, "Chat connection lost"),
                    None => tracing::warn!(status = ?end.status, "Chat connection closed"),
                }
            }
            Err(e) if e.is_unauthorized() => {
                tracing::error!(error = %e, "Chat transport rejected credentials, not reconnecting");
                return SupervisorExit::Unauthorized;
            }
            Err(e) => {
                tracing::warn!(error = %e, retryable = e.kind.is_retryable(), "Failed to connect to chat transport");
            }
        }

        failures += 1;
        if let Some(max) = policy.max_attempts {
            if failures >= max {
                tracing::error!(attempts = failures, "Giving up on chat transport");
                return SupervisorExit::AttemptsExhausted { attempts: failures };
            }
        }

        tracing::info!(delay_ms = %policy.delay.as_millis(), "Reconnecting");
        tokio::time::sleep(policy.delay).await;
    }
}
