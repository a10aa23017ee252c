//! Conversion of raw backend payloads into the chat data model
//!
//! The backend stores sessions in MongoDB and hands documents back more
//! or less as stored: ids may arrive as plain strings or as extended JSON
//! (`{"$oid": "..."}`), timestamps as ISO strings with or without an
//! offset, titles may be missing and messages may lack an id. Everything
//! here turns that into [`ChatSession`] and [`Message`] values with the
//! guarantees the rest of the crate relies on.

use super::{ChatSession, Message, QueryMetadata, Role};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;

/// String-like value that may be wrapped in MongoDB extended JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExtendedValue {
    /// Plain JSON string
    Plain(String),
    /// `{"$oid": "..."}`
    ObjectId {
        #[serde(rename = "$oid")]
        oid: String,
    },
    /// `{"$date": ...}`, either an ISO string or epoch milliseconds
    Date {
        #[serde(rename = "$date")]
        date: serde_json::Value,
    },
    /// Bare epoch milliseconds
    Millis(i64),
}

impl ExtendedValue {
    /// Flatten to the string the rest of the crate works with
    pub fn into_string(self) -> String {
        match self {
            ExtendedValue::Plain(s) | ExtendedValue::ObjectId { oid: s } => s,
            ExtendedValue::Date { date } => match date {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.as_i64().map(millis_to_iso).unwrap_or_default(),
                other => other.to_string(),
            },
            ExtendedValue::Millis(ms) => millis_to_iso(ms),
        }
    }
}

fn millis_to_iso(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

/// Message document as returned inside a session
#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<ExtendedValue>,
    pub role: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<ExtendedValue>,
    #[serde(default)]
    pub query_metadata: Option<QueryMetadata>,
}

impl RawMessage {
    /// Normalize into a [`Message`]
    ///
    /// A missing id is replaced by `<session_id>-msg-<index>`. The
    /// replacement is deterministic so fetching the same session twice
    /// yields identical messages.
    pub fn into_message(self, session_id: &str, index: usize) -> Message {
        let id = self
            .id
            .map(ExtendedValue::into_string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{}-msg-{}", session_id, index));

        let role = match self.role.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            other => {
                tracing::debug!(role = other, message_id = %id, "Unknown message role, showing as assistant");
                Role::Assistant
            }
        };

        let timestamp = self
            .timestamp
            .map(ExtendedValue::into_string)
            .unwrap_or_default();

        Message {
            id,
            role,
            content: self.content,
            timestamp,
            query_metadata: self.query_metadata,
        }
    }
}

/// Session document as returned by `GET /chat/session/{id}` and
/// `GET /chat/sessions`
#[derive(Debug, Clone, Deserialize)]
pub struct RawSession {
    #[serde(rename = "_id", alias = "id")]
    pub id: ExtendedValue,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<ExtendedValue>,
    #[serde(default)]
    pub messages: Option<Vec<RawMessage>>,
}

impl RawSession {
    /// Normalize into a [`ChatSession`], applying the title fallback
    pub fn into_session(self) -> ChatSession {
        let id = self.id.into_string();
        let timestamp = self
            .created_at
            .map(ExtendedValue::into_string)
            .unwrap_or_default();

        let title = match self.title {
            Some(t) if !t.trim().is_empty() => t,
            _ => fallback_title(&timestamp),
        };

        let messages = self.messages.map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(index, m)| m.into_message(&id, index))
                .collect()
        });

        ChatSession {
            id,
            title,
            timestamp,
            messages,
        }
    }
}

/// Parse the timestamp formats the backend emits
///
/// Accepts RFC 3339 with an offset, naive ISO datetimes (treated as UTC,
/// which is what the backend stores) and bare dates.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }
    None
}

/// Title used when the backend did not provide one
///
/// Dates render as US short dates (`M/D/YYYY`, no zero padding) in UTC,
/// so `2024-01-01T00:00:00Z` becomes `Chat 1/1/2024`. The result is
/// never empty.
///
/// # Examples
///
/// ```
/// use mediagraph::session::fallback_title;
///
/// assert_eq!(fallback_title("2024-01-01T00:00:00Z"), "Chat 1/1/2024");
/// assert_eq!(fallback_title(""), "New Chat");
/// ```
pub fn fallback_title(created_at: &str) -> String {
    match parse_timestamp(created_at) {
        Some(dt) => format!("Chat {}/{}/{}", dt.month(), dt.day(), dt.year()),
        None if created_at.trim().is_empty() => "New Chat".to_string(),
        None => format!("Chat {}", created_at.trim()),
    }
}
