//! Mock implementations for testing
//!
//! These mocks enable testing the controller and supervisor without a real
//! clock or network.

use super::traits::*;
use crate::db::Timestamp;
use crate::transport::{EventStream, TransportError, TransportEvent};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap()
}

// ============================================================================
// Mock Clock
// ============================================================================

/// Manually driven clock
pub struct MockClock {
    now: AtomicI64,
}

impl MockClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_ms(by), Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Mock Messenger
// ============================================================================

/// Mock send primitive that records what it sent
#[allow(dead_code)]
pub struct MockMessenger {
    /// Queued results; an empty queue means success
    outcomes: Mutex<VecDeque<Result<(), TransportError>>>,
    /// Successfully sent (address, text) pairs
    sent: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    /// Real delay before resolving (for timeout testing)
    delay: Option<Duration>,
    /// Simulated latency applied to a mock clock
    clock_latency: Option<(Arc<MockClock>, Duration)>,
}

#[allow(dead_code)]
impl MockMessenger {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            delay: None,
            clock_latency: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_clock_latency(mut self, clock: Arc<MockClock>, latency: Duration) -> Self {
        self.clock_latency = Some((clock, latency));
        self
    }

    /// Queue the result of the next send
    pub fn queue_outcome(&self, outcome: Result<(), TransportError>) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((clock, latency)) = &self.clock_latency {
            clock.advance(*latency);
        }

        let outcome = self.outcomes.lock().unwrap().pop_front().unwrap_or(Ok(()));
        if outcome.is_ok() {
            self.sent
                .lock()
                .unwrap()
                .push((address.to_string(), text.to_string()));
        }
        outcome
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// Mock transport that hands out queued sessions
pub struct MockTransport {
    connections: Mutex<VecDeque<Result<Vec<TransportEvent>, TransportError>>>,
    connects: AtomicUsize,
    messenger: MockMessenger,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(VecDeque::new()),
            connects: AtomicUsize::new(0),
            messenger: MockMessenger::new(),
        }
    }

    /// Queue a connection that yields these frames and then ends
    pub fn queue_session(&self, frames: Vec<TransportEvent>) {
        self.connections.lock().unwrap().push_back(Ok(frames));
    }

    /// Queue a failed connection attempt
    pub fn queue_connect_error(&self, error: TransportError) {
        self.connections.lock().unwrap().push_back(Err(error));
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.messenger.sent()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Messenger for MockTransport {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        self.messenger.send_text(address, text).await
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> Result<EventStream, TransportError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self
            .connections
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock connection queued")));
        let frames = next?;
        Ok(futures::stream::iter(frames.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock() {
        let clock = MockClock::new(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now(), 3_000);
        clock.set(0);
        assert_eq!(clock.now(), 0);
    }

    #[tokio::test]
    async fn test_mock_messenger_queued_failure() {
        let messenger = MockMessenger::new();
        messenger.queue_outcome(Err(TransportError::network("down")));

        assert!(messenger.send_text("a@x", "hi").await.is_err());
        assert!(messenger.send_text("a@x", "hi").await.is_ok());
        assert_eq!(messenger.attempts(), 2);
        assert_eq!(messenger.sent(), vec![("a@x".to_string(), "hi".to_string())]);
    }

    #[tokio::test]
    async fn test_mock_transport_sessions() {
        let transport = MockTransport::new();
        transport.queue_session(vec![TransportEvent::Open]);

        let frames: Vec<_> = transport.connect().await.unwrap().collect().await;
        assert_eq!(frames.len(), 1);

        // Nothing queued: behaves like an unreachable bridge
        let err = transport.connect().await.err().unwrap();
        assert!(err.kind.is_retryable());
        assert_eq!(transport.connect_count(), 2);
    }
}
