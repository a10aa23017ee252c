//! Chat controller
//!
//! Mediates between user intents and session state. The controller owns
//! the [`ConversationStore`] and is the only thing that mutates it; the
//! presentation layer reads snapshots through [`ChatController::view`]
//! and issues intents (`send`, `select`, `rename`, `delete`,
//! `start_new_chat`).
//!
//! # Conversation states
//!
//! The selected conversation is either *empty* (the "new chat" view with
//! guidance is shown) or *active* (messages are shown). `start_new_chat`
//! and deleting the selected conversation enter the empty state; a send
//! leaves it immediately, before the backend answers.
//!
//! # Failures
//!
//! Every transport failure is caught here, logged, and queued as a
//! [`ChatNotice`] for the presentation layer. Intents never return
//! errors. The loading flag is released when a send settles, whatever
//! the outcome.
//!
//! # Cancellation
//!
//! Each conversation owns a cancellation token that fires when it is
//! deleted. With `cancel_on_delete` enabled, in-flight calls for a
//! deleted conversation are abandoned and their late results dropped.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::config::ChatConfig;
use crate::error::{FailureKind, SendError, TransportError};
use crate::session::{Message, SendResult};
use crate::store::{Conversation, ConversationStore};
use crate::transport::SessionTransport;

/// Failure surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatNotice {
    /// What kind of failure happened
    pub kind: FailureKind,
    /// Intent that failed (e.g. `send`, `load history`)
    pub operation: &'static str,
    /// Human-readable detail
    pub message: String,
}

/// Outcome of [`ChatController::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    /// Input was blank; nothing happened
    Ignored,
    /// Both messages were appended
    Delivered {
        /// Backend session the query went to
        session_id: String,
    },
    /// The target conversation was deleted before the reply arrived
    Discarded,
    /// The backend call failed; no message was appended
    Failed(FailureKind),
}

/// Sidebar entry in a [`ChatView`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    pub session_id: Option<String>,
    pub title: String,
    pub message_count: usize,
    pub selected: bool,
}

/// Snapshot of everything the presentation layer renders
#[derive(Debug, Clone, PartialEq)]
pub struct ChatView {
    pub conversations: Vec<ConversationSummary>,
    pub selected_id: Option<String>,
    pub is_new_chat: bool,
    pub is_loading: bool,
    /// Messages of the selected conversation, oldest first
    pub messages: Vec<Message>,
}

#[derive(Debug)]
struct ControllerState {
    store: ConversationStore,
    new_chat: bool,
    input: String,
    notices: VecDeque<ChatNotice>,
}

/// Decrements the in-flight counter when dropped
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Orchestrates chat intents against the store and the transport
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use mediagraph::config::Config;
/// use mediagraph::controller::ChatController;
/// use mediagraph::transport::{HttpSessionTransport, SessionTransport};
///
/// # async fn example() -> mediagraph::error::Result<()> {
/// let config = Config::default();
/// let transport: Arc<dyn SessionTransport> = Arc::new(HttpSessionTransport::new(&config.api)?);
/// let controller = ChatController::new(transport, config.chat.clone());
///
/// controller.start_new_chat().await;
/// controller.send("Show me movies about betrayal").await;
/// for message in controller.view().messages {
///     println!("{}: {}", message.role, message.content);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChatController<T: ?Sized = dyn SessionTransport> {
    transport: Arc<T>,
    settings: ChatConfig,
    state: Mutex<ControllerState>,
    in_flight: AtomicUsize,
}

impl<T> ChatController<T>
where
    T: SessionTransport + ?Sized,
{
    /// Controller with an empty store and nothing selected
    pub fn new(transport: Arc<T>, settings: ChatConfig) -> Self {
        Self {
            transport,
            settings,
            state: Mutex::new(ControllerState {
                store: ConversationStore::new(),
                new_chat: true,
                input: String::new(),
                notices: VecDeque::new(),
            }),
            in_flight: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The transport this controller talks through
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// True while the selected conversation shows the new-chat view
    pub fn is_new_chat(&self) -> bool {
        self.lock().new_chat
    }

    /// True while at least one send is waiting for the backend
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Currently selected conversation id
    pub fn selected_id(&self) -> Option<String> {
        self.lock().store.selected_id().map(str::to_string)
    }

    /// Current input draft
    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    /// Replace the input draft
    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().input = text.into();
    }

    /// Drain queued failure notices, oldest first
    pub fn take_notices(&self) -> Vec<ChatNotice> {
        self.lock().notices.drain(..).collect()
    }

    /// Look up a conversation by store id or backend session id
    pub fn conversation(&self, id_or_session: &str) -> Option<Conversation> {
        self.lock().store.find(id_or_session).cloned()
    }

    /// Snapshot for rendering
    pub fn view(&self) -> ChatView {
        let state = self.lock();
        let selected_id = state.store.selected_id().map(str::to_string);
        let conversations = state
            .store
            .conversations()
            .iter()
            .map(|c| ConversationSummary {
                id: c.id.clone(),
                session_id: c.session_id.clone(),
                title: c.title.clone(),
                message_count: c.messages.len(),
                selected: selected_id.as_deref() == Some(c.id.as_str()),
            })
            .collect();
        let messages = state
            .store
            .selected()
            .map(|c| c.messages.clone())
            .unwrap_or_default();

        ChatView {
            conversations,
            selected_id,
            is_new_chat: state.new_chat,
            is_loading: self.is_loading(),
            messages,
        }
    }

    fn notify(&self, operation: &'static str, err: &TransportError) -> FailureKind {
        let kind = err.kind();
        tracing::error!(operation, kind = %kind, error = %err, "Chat operation failed");
        self.lock().notices.push_back(ChatNotice {
            kind,
            operation,
            message: err.to_string(),
        });
        kind
    }

    /// Run `fut` unless `cancel` fires first; `None` means cancelled
    async fn guarded<F: Future>(&self, cancel: &CancellationToken, fut: F) -> Option<F::Output> {
        if !self.settings.cancel_on_delete {
            return Some(fut.await);
        }
        tokio::select! {
            _ = cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Fetch the session list and merge it into the store
    ///
    /// Returns false when history is unavailable; the store is left
    /// untouched in that case.
    pub async fn load_history(&self) -> bool {
        match self.transport.list_sessions().await {
            Ok(sessions) => {
                tracing::info!(count = sessions.len(), "Loaded chat history");
                let mut state = self.lock();
                state.store.replace_history(sessions);
                if state.store.selected_id().is_none() {
                    state.new_chat = true;
                }
                true
            }
            Err(e) => {
                self.notify("load history", &e);
                false
            }
        }
    }

    /// Start a new, empty conversation and select it
    ///
    /// With `eager_session` enabled a backend session is allocated right
    /// away; if that fails the conversation stays usable and the first
    /// send creates the session instead.
    pub async fn start_new_chat(&self) -> String {
        let conversation = Conversation::new_local();
        let id = conversation.id.clone();
        let cancel = conversation.cancellation();
        {
            let mut state = self.lock();
            state.store.prepend(conversation);
            state.store.select(&id);
            state.new_chat = true;
        }
        tracing::debug!(conversation = %id, "Started new chat");

        if self.settings.eager_session {
            match self.guarded(&cancel, self.transport.create_session()).await {
                Some(Ok(session_id)) => {
                    let mut state = self.lock();
                    let unassigned = state
                        .store
                        .get(&id)
                        .map(|c| c.session_id.is_none())
                        .unwrap_or(false);
                    if unassigned {
                        state.store.set_session_id(&id, &session_id);
                    }
                }
                Some(Err(e)) => {
                    self.notify("create session", &e);
                }
                None => {}
            }
        }

        id
    }

    /// Select a conversation, fetching its messages first if needed
    ///
    /// Returns false if the conversation does not exist (or was deleted
    /// while its messages were being fetched). A failed fetch still
    /// selects the conversation; selecting it again retries.
    pub async fn select(&self, id: &str) -> bool {
        let (session_id, cancel, needs_fetch) = {
            let state = self.lock();
            match state.store.get(id) {
                Some(c) => (c.session_id.clone(), c.cancellation(), !c.loaded),
                None => {
                    tracing::warn!(conversation = %id, "Cannot select unknown conversation");
                    return false;
                }
            }
        };

        if let (true, Some(session_id)) = (needs_fetch, session_id) {
            match self
                .guarded(&cancel, self.transport.get_session(&session_id))
                .await
            {
                Some(Ok(session)) => {
                    let messages = session.messages.unwrap_or_default();
                    tracing::debug!(conversation = %id, count = messages.len(), "Loaded conversation messages");
                    self.lock().store.set_messages(id, messages);
                }
                Some(Err(e)) => {
                    self.notify("open conversation", &e);
                }
                None => return false,
            }
        }

        let mut state = self.lock();
        if !state.store.select(id) {
            return false;
        }
        state.new_chat = state.store.get(id).map(|c| c.is_empty()).unwrap_or(true);
        true
    }

    /// Select the conversation for a backend session, fetching it if the
    /// store does not know it yet
    pub async fn open_session(&self, session_id: &str) -> bool {
        let known = self.lock().store.find(session_id).map(|c| c.id.clone());
        if let Some(id) = known {
            return self.select(&id).await;
        }

        match self.transport.get_session(session_id).await {
            Ok(session) => {
                let id = session.id.clone();
                {
                    let mut state = self.lock();
                    if state.store.get(&id).is_none() {
                        state.store.prepend(Conversation::from_session(session));
                    }
                }
                self.select(&id).await
            }
            Err(e) => {
                self.notify("open conversation", &e);
                false
            }
        }
    }

    /// Rename a conversation locally
    ///
    /// Returns false for unknown ids and blank titles.
    pub fn rename(&self, id: &str, title: &str) -> bool {
        let renamed = self.lock().store.rename(id, title);
        if !renamed {
            tracing::warn!(conversation = %id, "Rename refused");
        }
        renamed
    }

    /// Remove a conversation locally, abandoning its in-flight calls
    ///
    /// Deleting the selected conversation clears the selection and
    /// returns to the new-chat view.
    pub fn delete(&self, id: &str) -> bool {
        let mut state = self.lock();
        let was_selected = state.store.selected_id() == Some(id);
        let removed = state.store.remove(id).is_some();
        if removed && was_selected {
            state.new_chat = true;
        }
        if removed {
            tracing::debug!(conversation = %id, "Deleted conversation");
        }
        removed
    }

    /// Send `text` in the selected conversation
    ///
    /// Blank input is ignored without touching the transport. Other input
    /// is sent as typed. Otherwise
    /// the new-chat view is left immediately, the input draft is cleared,
    /// and once the backend answers the user message and the assistant
    /// reply are appended together. With nothing selected a new
    /// conversation is started first.
    pub async fn send(&self, text: &str) -> SendStatus {
        if text.trim().is_empty() {
            return SendStatus::Ignored;
        }

        let (target, session_id, cancel) = {
            let mut state = self.lock();
            let target = match state.store.selected_id() {
                Some(id) => id.to_string(),
                None => {
                    let conversation = Conversation::new_local();
                    let id = conversation.id.clone();
                    state.store.prepend(conversation);
                    state.store.select(&id);
                    id
                }
            };
            state.new_chat = false;
            state.input.clear();
            match state.store.get(&target) {
                Some(c) => (target, c.session_id.clone(), c.cancellation()),
                None => return SendStatus::Discarded,
            }
        };

        let _loading = LoadingGuard::new(&self.in_flight);
        match self.exchange(&target, session_id, text, &cancel).await {
            Ok(Some(result)) => {
                let [user, assistant] = result.messages;
                let appended = self
                    .lock()
                    .store
                    .append_messages(&target, [user, assistant]);
                if appended {
                    SendStatus::Delivered {
                        session_id: result.session_id,
                    }
                } else {
                    tracing::debug!(conversation = %target, "Reply arrived after conversation was deleted");
                    SendStatus::Discarded
                }
            }
            Ok(None) => {
                tracing::debug!(conversation = %target, "Send abandoned, conversation deleted");
                SendStatus::Discarded
            }
            Err(e) => {
                let operation = match e {
                    SendError::SessionCreation(_) => "create session",
                    SendError::Query(_) => "send",
                };
                SendStatus::Failed(self.notify(operation, e.transport()))
            }
        }
    }

    /// Ensure a session, then query; `Ok(None)` when cancelled
    async fn exchange(
        &self,
        target: &str,
        session_id: Option<String>,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<SendResult>, SendError> {
        let session_id = match self
            .guarded(cancel, self.transport.ensure_session(session_id.as_deref()))
            .await
        {
            Some(result) => result.map_err(SendError::SessionCreation)?,
            None => return Ok(None),
        };

        {
            let mut state = self.lock();
            let unassigned = state
                .store
                .get(target)
                .map(|c| c.session_id.is_none())
                .unwrap_or(false);
            if unassigned {
                state.store.set_session_id(target, &session_id);
            }
        }

        let response = match self
            .guarded(cancel, self.transport.query(&session_id, query))
            .await
        {
            Some(result) => result.map_err(SendError::Query)?,
            None => return Ok(None),
        };

        Ok(Some(SendResult::new(session_id, query, response)))
    }
}
