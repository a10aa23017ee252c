//! Chat data model shared by the transport, store and controller
//!
//! Messages are kept in display order (oldest first). Assistant messages
//! may carry [`QueryMetadata`] describing how the backend interpreted the
//! query and which graph nodes it matched.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod normalize;

pub use normalize::{fallback_title, RawMessage, RawSession};

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the person chatting
    User,
    /// Reply produced by the backend
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Diagnostic payload attached to an assistant reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    /// Query as the user typed it
    #[serde(default)]
    pub original_query: Option<String>,
    /// Query after backend rewriting
    #[serde(default)]
    pub enhanced_query: Option<String>,
    /// Node label the backend searched (movie, character, scene, ...)
    #[serde(default)]
    pub detected_label: Option<String>,
    /// Matched search results, passed through untouched
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Backend id when persisted, otherwise a client-generated id
    pub id: String,
    /// Author of the message
    pub role: Role,
    /// Display text
    pub content: String,
    /// ISO-8601 timestamp
    pub timestamp: String,
    /// Present on assistant replies produced by a query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_metadata: Option<QueryMetadata>,
}

impl Message {
    /// Build a user message with a client-generated id
    ///
    /// # Examples
    ///
    /// ```
    /// use mediagraph::session::{Message, Role};
    ///
    /// let msg = Message::user("Show me movies about betrayal");
    /// assert_eq!(msg.role, Role::User);
    /// assert!(msg.id.ends_with("-user"));
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::synthesized(Role::User, content.into(), None)
    }

    /// Build an assistant message with a client-generated id
    pub fn assistant(content: impl Into<String>, metadata: QueryMetadata) -> Self {
        Self::synthesized(Role::Assistant, content.into(), Some(metadata))
    }

    fn synthesized(role: Role, content: String, query_metadata: Option<QueryMetadata>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}-{}", now.timestamp_millis(), role),
            role,
            content,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            query_metadata,
        }
    }
}

/// A conversation as known to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Backend-assigned session id
    pub id: String,
    /// Display title, never empty
    pub title: String,
    /// Creation timestamp as sent by the backend
    pub timestamp: String,
    /// Messages, oldest first. `None` when the listing omitted them.
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

/// Body of a successful `POST /query`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Assistant reply text
    pub response: String,
    #[serde(default)]
    pub original_query: Option<String>,
    #[serde(default)]
    pub enhanced_query: Option<String>,
    #[serde(default)]
    pub detected_label: Option<String>,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl QueryResponse {
    /// Metadata block for the assistant message built from this response
    pub fn metadata(&self) -> QueryMetadata {
        QueryMetadata {
            original_query: self.original_query.clone(),
            enhanced_query: self.enhanced_query.clone(),
            detected_label: self.detected_label.clone(),
            results: self.results.clone(),
        }
    }
}

/// Outcome of sending one query
///
/// `messages` always holds exactly the user message followed by the
/// assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendResult {
    /// Session the query was sent in (possibly freshly created)
    pub session_id: String,
    /// `[user, assistant]`
    pub messages: [Message; 2],
    /// Raw backend response
    pub response: QueryResponse,
}

impl SendResult {
    /// Synthesize the two messages for a query and its response
    pub fn new(session_id: String, query: &str, response: QueryResponse) -> Self {
        let user = Message::user(query);
        let assistant = Message::assistant(response.response.clone(), response.metadata());
        Self {
            session_id,
            messages: [user, assistant],
            response,
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// `healthy` or `degraded`
    pub status: String,
    /// Per-dependency status flags and details
    #[serde(default)]
    pub services: serde_json::Map<String, serde_json::Value>,
}

impl HealthReport {
    /// True when the backend reports itself fully healthy
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
