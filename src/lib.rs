//! MediaGraph - movie discovery chat client library
//!
//! This library provides the client side of the MediaGraph chat: a typed
//! transport for the backend's session API, an in-memory conversation
//! store, and a controller that turns user intents into backend calls.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: Chat data model and normalization of backend payloads
//! - `transport`: Session transport trait and its HTTP implementation
//! - `store`: Ordered, selectable collection of conversations
//! - `controller`: Chat intents, new-chat state, loading and failure notices
//! - `commands`: Terminal front end (interactive chat and one-shot commands)
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mediagraph::{ChatController, Config, HttpSessionTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let transport = Arc::new(HttpSessionTransport::new(&config.api)?);
//!     let controller = ChatController::new(transport, config.chat.clone());
//!     controller.load_history().await;
//!     controller.send("Find films that feel like Spirited Away").await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod session;
pub mod store;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use controller::{ChatController, ChatNotice, ChatView, SendStatus};
pub use error::{FailureKind, MediaGraphError, Result, SendError, TransportError};
pub use session::{ChatSession, Message, QueryMetadata, Role, SendResult};
pub use store::{Conversation, ConversationStore};
pub use transport::{HttpSessionTransport, SessionTransport};

#[cfg(test)]
pub mod test_utils;
