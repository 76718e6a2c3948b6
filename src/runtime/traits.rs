//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the controller and supervisor with mock
//! implementations.

use crate::db::Timestamp;
use crate::transport::{BridgeTransport, EventStream, TransportError};
use async_trait::async_trait;
use std::sync::Arc;

/// Source of "now"
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now(&self) -> Timestamp;
}

/// Outbound half of the transport: the send primitive
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a plain text message to a conversation address
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError>;
}

/// A transport that can be (re)connected to obtain an inbound event stream
#[async_trait]
pub trait Transport: Messenger {
    async fn connect(&self) -> Result<EventStream, TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        (**self).send_text(address, text).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn connect(&self) -> Result<EventStream, TransportError> {
        (**self).connect().await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}

#[async_trait]
impl Messenger for BridgeTransport {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        self.post_text(address, text).await
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn connect(&self) -> Result<EventStream, TransportError> {
        self.open_events().await
    }
}
