//! Session transport abstraction and implementations
//!
//! This module defines the [`SessionTransport`] trait that every backend
//! client satisfies. Concrete implementations live in submodules:
//!
//! - [`http::HttpSessionTransport`] -- talks to the MediaGraph REST API.
//! - [`fake::FakeTransport`] -- in-memory fake used in tests (cfg(test)
//!   only).
//!
//! # Sending a query
//!
//! A query is always sent inside a session. Callers that may not have one
//! yet use the two explicit steps, [`SessionTransport::ensure_session`]
//! followed by [`SessionTransport::query`], or the combined
//! [`SessionTransport::send_message`]. The combined call creates at most
//! one session and never retries; its [`SendError`] says which step
//! failed.

use async_trait::async_trait;

use crate::error::{SendError, TransportError};
use crate::session::{ChatSession, HealthReport, QueryResponse, SendResult};

pub mod http;

#[cfg(test)]
pub mod fake;

pub use http::HttpSessionTransport;

/// Result alias for single backend calls
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Client side of the MediaGraph chat API
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Allocate a new backend session and return its id
    async fn create_session(&self) -> TransportResult<String>;

    /// Fetch one session with its full message list
    async fn get_session(&self, session_id: &str) -> TransportResult<ChatSession>;

    /// Fetch every session for the history listing
    async fn list_sessions(&self) -> TransportResult<Vec<ChatSession>>;

    /// Post a query inside an existing session
    async fn query(&self, session_id: &str, query: &str) -> TransportResult<QueryResponse>;

    /// Backend health report
    async fn health(&self) -> TransportResult<HealthReport>;

    /// Return `session_id` if present, otherwise create a session
    ///
    /// Blank ids count as absent.
    async fn ensure_session(&self, session_id: Option<&str>) -> TransportResult<String> {
        match session_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => {
                tracing::debug!("No session yet, creating one before sending");
                self.create_session().await
            }
        }
    }

    /// Send a query, creating a session first when `session_id` is `None`
    ///
    /// On success the result holds the user message and the assistant
    /// reply, both synthesized locally from the single response.
    async fn send_message(
        &self,
        query: &str,
        session_id: Option<&str>,
    ) -> Result<SendResult, SendError> {
        let session_id = self
            .ensure_session(session_id)
            .await
            .map_err(SendError::SessionCreation)?;

        let response = self
            .query(&session_id, query)
            .await
            .map_err(SendError::Query)?;

        Ok(SendResult::new(session_id, query, response))
    }
}
