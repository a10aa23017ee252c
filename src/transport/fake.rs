//! In-memory fake backend for controller unit tests
//!
//! [`FakeTransport`] keeps sessions in a map, records every call it
//! receives and can be told to fail or to stall individual operations.
//! Queries append a user/assistant pair to the stored session the way
//! the real backend does, with backend-style ids that differ from the
//! ids the client synthesizes.
//!
//! # Example
//!
//! ```ignore
//! let transport = FakeTransport::new().with_session("a", Some("Heists"), vec![]);
//! let id = transport.create_session().await.unwrap();
//! assert_eq!(transport.calls(), vec!["create_session".to_string()]);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use crate::error::TransportError;
use crate::session::{ChatSession, HealthReport, Message, QueryResponse, Role};
use crate::transport::{SessionTransport, TransportResult};

#[derive(Debug, Default)]
struct FakeState {
    sessions: Vec<ChatSession>,
    calls: Vec<String>,
    next_id: usize,
    create_failure: Option<TransportError>,
    query_failure: Option<TransportError>,
    list_failure: Option<TransportError>,
    get_failure: Option<TransportError>,
    query_delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct QueryGate {
    held: bool,
    passes: usize,
}

/// In-process fake of the MediaGraph backend
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
    query_gate: Arc<Notify>,
    gate: Arc<Mutex<QueryGate>>,
}

impl FakeTransport {
    /// Empty backend with no sessions
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn gate(&self) -> MutexGuard<'_, QueryGate> {
        self.gate.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a stored session
    pub fn with_session(self, id: &str, title: Option<&str>, messages: Vec<Message>) -> Self {
        {
            let mut state = self.state();
            let timestamp = "2024-01-01T00:00:00Z".to_string();
            state.sessions.push(ChatSession {
                id: id.to_string(),
                title: title
                    .map(str::to_string)
                    .unwrap_or_else(|| crate::session::fallback_title(&timestamp)),
                timestamp,
                messages: Some(messages),
            });
        }
        self
    }

    /// Make every `create_session` fail with `err`
    pub fn fail_create(&self, err: TransportError) {
        self.state().create_failure = Some(err);
    }

    /// Make every `query` fail with `err`
    pub fn fail_query(&self, err: TransportError) {
        self.state().query_failure = Some(err);
    }

    /// Make every `list_sessions` fail with `err`
    pub fn fail_list(&self, err: TransportError) {
        self.state().list_failure = Some(err);
    }

    /// Make every `get_session` fail with `err`
    pub fn fail_get(&self, err: TransportError) {
        self.state().get_failure = Some(err);
    }

    /// Sleep this long inside every `query`
    pub fn delay_queries(&self, delay: Duration) {
        self.state().query_delay = Some(delay);
    }

    /// Hold every `query` until [`FakeTransport::release_queries`] is called
    pub fn hold_queries(&self) {
        self.gate().held = true;
    }

    /// Let held queries proceed
    pub fn release_queries(&self) {
        {
            let mut gate = self.gate();
            gate.held = false;
            gate.passes = 0;
        }
        self.query_gate.notify_waiters();
    }

    /// Let exactly one held query proceed; the rest stay held
    pub fn release_one_query(&self) {
        self.gate().passes += 1;
        self.query_gate.notify_waiters();
    }

    /// Call log, in order
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    /// Number of recorded calls starting with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Messages the backend holds for `session_id`
    pub fn stored_messages(&self, session_id: &str) -> Option<Vec<Message>> {
        self.state()
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .and_then(|s| s.messages.clone())
    }

    async fn wait_for_gate(&self) {
        loop {
            let notified = self.query_gate.notified();
            {
                let mut gate = self.gate();
                if !gate.held {
                    return;
                }
                if gate.passes > 0 {
                    gate.passes -= 1;
                    return;
                }
            }
            notified.await;
        }
    }

    fn rejected(endpoint: &str) -> TransportError {
        TransportError::Rejected {
            endpoint: endpoint.to_string(),
            status: 404,
        }
    }
}

#[async_trait]
impl SessionTransport for FakeTransport {
    async fn create_session(&self) -> TransportResult<String> {
        let mut state = self.state();
        state.calls.push("create_session".to_string());
        if let Some(err) = state.create_failure.clone() {
            return Err(err);
        }
        state.next_id += 1;
        let id = format!("sess-{}", state.next_id);
        state.sessions.push(ChatSession {
            id: id.clone(),
            title: "New Chat".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            messages: Some(Vec::new()),
        });
        Ok(id)
    }

    async fn get_session(&self, session_id: &str) -> TransportResult<ChatSession> {
        let mut state = self.state();
        state.calls.push(format!("get_session:{}", session_id));
        if let Some(err) = state.get_failure.clone() {
            return Err(err);
        }
        state
            .sessions
            .iter()
            .find(|s| s.id == session_id)
            .cloned()
            .ok_or_else(|| Self::rejected("GET /chat/session"))
    }

    async fn list_sessions(&self) -> TransportResult<Vec<ChatSession>> {
        let mut state = self.state();
        state.calls.push("list_sessions".to_string());
        if let Some(err) = state.list_failure.clone() {
            return Err(err);
        }
        // The listing carries summaries only; messages come from get_session
        Ok(state
            .sessions
            .iter()
            .map(|s| ChatSession {
                messages: None,
                ..s.clone()
            })
            .collect())
    }

    async fn query(&self, session_id: &str, query: &str) -> TransportResult<QueryResponse> {
        let delay = {
            let mut state = self.state();
            state.calls.push(format!("query:{}:{}", session_id, query));
            state.query_delay
        };

        self.wait_for_gate().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if let Some(err) = state.query_failure.clone() {
            return Err(err);
        }

        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| Self::rejected("POST /query"))?;

        let response = QueryResponse {
            response: format!("Reply to: {}", query),
            original_query: Some(query.to_string()),
            enhanced_query: Some(format!("movies: {}", query)),
            detected_label: Some("movie".to_string()),
            results: vec![json!({"node_id": "n-1", "similarity": 0.91})],
        };

        let messages = session.messages.get_or_insert_with(Vec::new);
        let base = messages.len();
        for (offset, (role, content)) in [
            (Role::User, query.to_string()),
            (Role::Assistant, response.response.clone()),
        ]
        .into_iter()
        .enumerate()
        {
            messages.push(Message {
                id: format!("db-{}-{}", session_id, base + offset),
                role,
                content,
                timestamp: "2024-01-01T00:00:00Z".to_string(),
                query_metadata: None,
            });
        }

        Ok(response)
    }

    async fn health(&self) -> TransportResult<HealthReport> {
        self.state().calls.push("health".to_string());
        Ok(HealthReport {
            status: "healthy".to_string(),
            services: serde_json::Map::new(),
        })
    }
}
