//! Process-wide outbound send throttle
//!
//! Fixed window: the first admission once more than a full window has passed
//! starts a new one and clears the count. There is no queue; a denied send is simply
//! dropped.

use crate::db::Timestamp;
use crate::runtime::Clock;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Length of one admission window
pub const ADMISSION_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Window {
    started_at: Timestamp,
    admitted: u32,
}

/// Admission controller shared by every conversation
pub struct RateGate {
    clock: Arc<dyn Clock>,
    limit: u32,
    window_ms: i64,
    window: Mutex<Window>,
}

impl RateGate {
    pub fn new(limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self::with_window(limit, ADMISSION_WINDOW, clock)
    }

    pub fn with_window(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now();
        Self {
            clock,
            limit,
            window_ms: i64::try_from(window.as_millis()).unwrap_or(i64::MAX),
            window: Mutex::new(Window {
                started_at,
                admitted: 0,
            }),
        }
    }

    /// Take one slot from the current window if any are left
    pub fn try_admit(&self) -> bool {
        let now = self.clock.now();
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);

        if now.saturating_sub(window.started_at) > self.window_ms {
            window.started_at = now;
            window.admitted = 0;
        }

        if window.admitted < self.limit {
            window.admitted += 1;
            true
        } else {
            false
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}
