//! Transport error types

use thiserror::Error;

/// HTTP status the bridge uses for revoked credentials
pub const UNAUTHORIZED_STATUS: u16 = 401;

/// Transport error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// Status code reported by the transport, if any
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unauthorized, message).with_status(UNAUTHORIZED_STATUS)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Server, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Protocol, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        let err = match status {
            UNAUTHORIZED_STATUS => Self::unauthorized(format!("Unauthorized: {body}")),
            500..=599 => Self::server_error(format!("Bridge error: {body}")),
            _ => Self::unknown(format!("HTTP {status}: {body}")),
        };
        err.with_status(status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == TransportErrorKind::Unauthorized
    }
}

/// Error classification for reconnect logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, reset, DNS - retryable
    Network,
    /// Credentials invalidated (401) - terminal
    Unauthorized,
    /// Bridge-side failure (5xx) - retryable
    Server,
    /// Frame could not be decoded
    Protocol,
    /// Operation did not complete in time
    Timeout,
    /// Unknown error
    Unknown,
}

impl TransportErrorKind {
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Unauthorized)
    }
}
