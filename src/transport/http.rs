//! HTTP transport for the MediaGraph chat API
//!
//! Endpoints, relative to the configured base URL:
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | POST | `/chat/session` | create session |
//! | GET | `/chat/session/{id}` | fetch session |
//! | GET | `/chat/sessions` | list sessions |
//! | POST | `/query?session_id={id}` | send a query |
//! | GET | `/health` | backend health |
//!
//! Any non-2xx status becomes [`TransportError::Rejected`]; error bodies
//! are not parsed.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{MediaGraphError, Result, TransportError};
use crate::session::normalize::ExtendedValue;
use crate::session::{ChatSession, HealthReport, QueryResponse, RawSession};
use crate::transport::{SessionTransport, TransportResult};

/// Response of `POST /chat/session`; only the id matters
#[derive(Debug, Deserialize)]
struct CreatedSession {
    #[serde(rename = "_id", alias = "id")]
    id: ExtendedValue,
}

/// Body of `POST /query`
#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

/// reqwest-backed [`SessionTransport`]
///
/// # Examples
///
/// ```
/// use mediagraph::config::ApiConfig;
/// use mediagraph::transport::HttpSessionTransport;
///
/// let transport = HttpSessionTransport::new(&ApiConfig::default());
/// assert!(transport.is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct HttpSessionTransport {
    client: Client,
    base_url: Url,
}

impl HttpSessionTransport {
    /// Create a transport for the backend described by `config`
    ///
    /// No network I/O happens here.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse or the HTTP client
    /// cannot be built
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url).map_err(MediaGraphError::from)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                MediaGraphError::Config(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint is resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: String,
    ) -> TransportResult<T> {
        tracing::debug!(endpoint = %endpoint, "Calling backend");

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Unreachable {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %endpoint, status = status.as_u16(), "Backend rejected request");
            return Err(TransportError::Rejected {
                endpoint,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Unreachable {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        serde_json::from_slice(&body).map_err(|e| TransportError::Decode {
            endpoint,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl SessionTransport for HttpSessionTransport {
    async fn create_session(&self) -> TransportResult<String> {
        let endpoint = "POST /chat/session".to_string();
        let request = self
            .client
            .post(self.endpoint(&["chat", "session"]))
            .header("Content-Type", "application/json");

        let created: CreatedSession = self.execute(request, endpoint.clone()).await?;
        let id = created.id.into_string();
        if id.trim().is_empty() {
            return Err(TransportError::Decode {
                endpoint,
                message: "session id is empty".to_string(),
            });
        }

        tracing::info!(session_id = %id, "Created chat session");
        Ok(id)
    }

    async fn get_session(&self, session_id: &str) -> TransportResult<ChatSession> {
        let endpoint = format!("GET /chat/session/{}", session_id);
        let request = self
            .client
            .get(self.endpoint(&["chat", "session", session_id]));

        let raw: RawSession = self.execute(request, endpoint).await?;
        let mut session = raw.into_session();
        session.messages.get_or_insert_with(Vec::new);
        Ok(session)
    }

    async fn list_sessions(&self) -> TransportResult<Vec<ChatSession>> {
        let request = self.client.get(self.endpoint(&["chat", "sessions"]));
        let raw: Vec<RawSession> = self
            .execute(request, "GET /chat/sessions".to_string())
            .await?;

        tracing::debug!(count = raw.len(), "Fetched session list");
        Ok(raw.into_iter().map(RawSession::into_session).collect())
    }

    async fn query(&self, session_id: &str, query: &str) -> TransportResult<QueryResponse> {
        let mut url = self.endpoint(&["query"]);
        url.query_pairs_mut().append_pair("session_id", session_id);

        let request = self.client.post(url).json(&QueryRequest { query });
        self.execute(request, format!("POST /query?session_id={}", session_id))
            .await
    }

    async fn health(&self) -> TransportResult<HealthReport> {
        let request = self.client.get(self.endpoint(&["health"]));
        self.execute(request, "GET /health".to_string()).await
    }
}
