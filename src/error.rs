//! Error types for MediaGraph
//!
//! This module defines the error types used throughout the client,
//! using `thiserror` for ergonomic error handling.
//!
//! Backend calls fail with [`TransportError`]. The variants all mean "the
//! call did not succeed", but they keep the cause apart so the chat
//! controller can tell an unreachable backend from one that rejected the
//! request.

use std::fmt;

use thiserror::Error;

/// Failure of a single backend call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced an HTTP response (connect, DNS, timeout)
    #[error("{endpoint} unreachable: {message}")]
    Unreachable {
        /// Endpoint that was being called (e.g. `POST /chat/session`)
        endpoint: String,
        /// Underlying client error
        message: String,
    },

    /// The backend answered with a non-success status
    #[error("{endpoint} rejected with HTTP {status}")]
    Rejected {
        /// Endpoint that was being called
        endpoint: String,
        /// HTTP status code returned by the backend
        status: u16,
    },

    /// The backend answered 2xx but the body did not have the expected shape
    #[error("{endpoint} returned an invalid body: {message}")]
    Decode {
        /// Endpoint that was being called
        endpoint: String,
        /// Decoder error
        message: String,
    },
}

/// Coarse classification of a [`TransportError`] for display purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Backend could not be reached
    NetworkUnreachable,
    /// Backend refused the request
    ServerRejected,
    /// Backend replied with something we could not read
    InvalidResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NetworkUnreachable => write!(f, "network unreachable"),
            FailureKind::ServerRejected => write!(f, "server rejected request"),
            FailureKind::InvalidResponse => write!(f, "invalid server response"),
        }
    }
}

impl TransportError {
    /// Classify this error
    ///
    /// # Examples
    ///
    /// ```
    /// use mediagraph::error::{FailureKind, TransportError};
    ///
    /// let err = TransportError::Rejected { endpoint: "GET /chat/sessions".into(), status: 500 };
    /// assert_eq!(err.kind(), FailureKind::ServerRejected);
    /// ```
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::Unreachable { .. } => FailureKind::NetworkUnreachable,
            TransportError::Rejected { .. } => FailureKind::ServerRejected,
            TransportError::Decode { .. } => FailureKind::InvalidResponse,
        }
    }

    /// HTTP status, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure of the two-step send protocol (ensure session, then query)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Allocating a backend session before the first query failed
    #[error("session creation failed: {0}")]
    SessionCreation(TransportError),

    /// The query itself failed
    #[error("query failed: {0}")]
    Query(TransportError),
}

impl SendError {
    /// The transport failure behind this error
    pub fn transport(&self) -> &TransportError {
        match self {
            SendError::SessionCreation(e) | SendError::Query(e) => e,
        }
    }

    /// Shortcut for `self.transport().kind()`
    pub fn kind(&self) -> FailureKind {
        self.transport().kind()
    }
}

/// Main error type for MediaGraph operations
#[derive(Error, Debug)]
pub enum MediaGraphError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend call failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Sending a chat query failed
    #[error("Send error: {0}")]
    Send(#[from] SendError),

    /// Interactive command errors (unknown conversation, bad arguments)
    #[error("Command error: {0}")]
    Command(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid base URL or endpoint
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Line editor errors
    #[error("Readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Result type alias for MediaGraph operations
///
/// Uses `anyhow::Error` so callers can attach context while the typed
/// errors above stay reachable through `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
