//! Client-side conversation store
//!
//! Holds the conversation list (newest first, as shown in the sidebar)
//! and the currently selected conversation. The store is plain data: it
//! performs no I/O and is only mutated through the update functions
//! below, which the chat controller calls in response to user intents.
//!
//! Two id spaces coexist. [`Conversation::id`] is the store key; for
//! conversations loaded from history it equals the backend session id,
//! for conversations started locally it is client-generated.
//! [`Conversation::session_id`] is the backend session id once one is
//! known.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use tokio_util::sync::CancellationToken;

use crate::session::{fallback_title, ChatSession, Message};

static LOCAL_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generate a client-side conversation id (`local-<millis>-<seq>`)
pub fn local_id() -> String {
    let seq = LOCAL_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("local-{}-{}", Utc::now().timestamp_millis(), seq)
}

/// One conversation in the sidebar
#[derive(Debug, Clone)]
pub struct Conversation {
    /// Store key
    pub id: String,
    /// Backend session id, once known
    pub session_id: Option<String>,
    /// Display title, never empty
    pub title: String,
    /// Creation timestamp (ISO-8601)
    pub created_at: String,
    /// Messages, oldest first
    pub messages: Vec<Message>,
    /// False while the messages have not been fetched from the backend
    pub loaded: bool,
    /// Came from the last history listing
    listed: bool,
    /// Cancelled when the conversation is removed
    cancel: CancellationToken,
}

impl Conversation {
    /// A fresh, empty, locally created conversation
    pub fn new_local() -> Self {
        let created_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Self {
            id: local_id(),
            session_id: None,
            title: fallback_title(&created_at),
            created_at,
            messages: Vec::new(),
            loaded: true,
            listed: false,
            cancel: CancellationToken::new(),
        }
    }

    /// A conversation backed by a backend session
    pub fn from_session(session: ChatSession) -> Self {
        let loaded = session.messages.is_some();
        Self {
            id: session.id.clone(),
            session_id: Some(session.id),
            title: session.title,
            created_at: session.timestamp,
            messages: session.messages.unwrap_or_default(),
            loaded,
            listed: false,
            cancel: CancellationToken::new(),
        }
    }

    /// True when the conversation has no messages
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn session_in(&self, listed: &HashSet<String>) -> bool {
        self.session_id
            .as_deref()
            .map(|s| listed.contains(s))
            .unwrap_or(false)
    }

    /// Token cancelled when this conversation leaves the store
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Conversation list plus selection
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    selected: Option<String>,
}

impl ConversationStore {
    /// Empty store with nothing selected
    pub fn new() -> Self {
        Self::default()
    }

    /// All conversations, newest first
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Look up a conversation by store id
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    /// Look up a conversation by store id or backend session id
    pub fn find(&self, id_or_session: &str) -> Option<&Conversation> {
        self.get(id_or_session).or_else(|| {
            self.conversations
                .iter()
                .find(|c| c.session_id.as_deref() == Some(id_or_session))
        })
    }

    /// Selected conversation id, if any
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Selected conversation, if any
    pub fn selected(&self) -> Option<&Conversation> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    /// Insert at the top of the list
    pub fn prepend(&mut self, conversation: Conversation) {
        self.conversations.insert(0, conversation);
    }

    /// Merge a fresh history listing into the store
    ///
    /// Conversations that never obtained a backend session stay at the
    /// top, followed by conversations whose session the listing does not
    /// mention but that did not come from a previous listing either
    /// (sessions created or opened since). Conversations that came from a
    /// previous listing and vanished from this one are dropped and their
    /// in-flight work is cancelled. Conversations whose session appears in
    /// `sessions` keep their loaded messages when the listing omitted
    /// them. The selection is kept if it still exists.
    pub fn replace_history(&mut self, sessions: Vec<ChatSession>) {
        let mut previous = std::mem::take(&mut self.conversations);
        let listed: HashSet<String> = sessions.iter().map(|s| s.id.clone()).collect();

        let mut next: Vec<Conversation> = Vec::with_capacity(previous.len() + sessions.len());
        next.extend(
            previous
                .iter()
                .filter(|c| c.session_id.is_none())
                .cloned(),
        );
        next.extend(
            previous
                .iter()
                .filter(|c| c.session_id.is_some() && !c.listed && !c.session_in(&listed))
                .cloned(),
        );

        for session in sessions {
            let existing = previous
                .iter()
                .position(|c| c.session_id.as_deref() == Some(session.id.as_str()));
            let mut conversation = match existing {
                Some(index) if session.messages.is_none() => {
                    let mut kept = previous.swap_remove(index);
                    kept.title = session.title;
                    kept
                }
                Some(index) => {
                    let old = previous.swap_remove(index);
                    let mut fresh = Conversation::from_session(session);
                    fresh.id = old.id;
                    fresh.cancel = old.cancel;
                    fresh
                }
                None => Conversation::from_session(session),
            };
            conversation.listed = true;
            next.push(conversation);
        }

        for dropped in previous
            .iter()
            .filter(|c| c.listed && !c.session_in(&listed))
        {
            dropped.cancel.cancel();
        }

        self.conversations = next;
        if let Some(selected) = &self.selected {
            if self.get(selected).is_none() {
                self.selected = None;
            }
        }
    }

    /// Select a conversation; returns false if `id` is unknown
    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    /// Change a title; blank titles are refused
    pub fn rename(&mut self, id: &str, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        match self.get_mut(id) {
            Some(c) => {
                c.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a conversation and cancel its in-flight work
    ///
    /// Returns the removed conversation. Removing the selected
    /// conversation clears the selection.
    pub fn remove(&mut self, id: &str) -> Option<Conversation> {
        let index = self.conversations.iter().position(|c| c.id == id)?;
        let removed = self.conversations.remove(index);
        removed.cancel.cancel();
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Some(removed)
    }

    /// Record the backend session a local conversation now maps to
    pub fn set_session_id(&mut self, id: &str, session_id: &str) -> bool {
        match self.get_mut(id) {
            Some(c) => {
                c.session_id = Some(session_id.to_string());
                true
            }
            None => false,
        }
    }

    /// Replace the messages with a fetched copy and mark them loaded
    pub fn set_messages(&mut self, id: &str, messages: Vec<Message>) -> bool {
        match self.get_mut(id) {
            Some(c) => {
                c.messages = messages;
                c.loaded = true;
                true
            }
            None => false,
        }
    }

    /// Append messages in order; returns false if `id` is gone
    pub fn append_messages<I>(&mut self, id: &str, messages: I) -> bool
    where
        I: IntoIterator<Item = Message>,
    {
        match self.get_mut(id) {
            Some(c) => {
                c.messages.extend(messages);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, messages: Option<Vec<Message>>) -> ChatSession {
        ChatSession {
            id: id.to_string(),
            title: format!("Title {}", id),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            messages,
        }
    }

    #[test]
    fn test_local_ids_are_unique() {
        let a = local_id();
        let b = local_id();
        assert_ne!(a, b);
        assert!(a.starts_with("local-"));
    }

    #[test]
    fn test_new_local_conversation_is_empty_with_title() {
        let c = Conversation::new_local();
        assert!(c.is_empty());
        assert!(c.loaded);
        assert!(c.session_id.is_none());
        assert!(c.title.starts_with("Chat "));
    }

    #[test]
    fn test_prepend_puts_newest_first() {
        let mut store = ConversationStore::new();
        let first = Conversation::new_local();
        let second = Conversation::new_local();
        let second_id = second.id.clone();
        store.prepend(first);
        store.prepend(second);
        assert_eq!(store.conversations()[0].id, second_id);
    }

    #[test]
    fn test_select_unknown_id_is_refused() {
        let mut store = ConversationStore::new();
        assert!(!store.select("missing"));
        assert!(store.selected_id().is_none());
    }

    #[test]
    fn test_remove_selected_clears_selection_and_cancels() {
        let mut store = ConversationStore::new();
        let c = Conversation::new_local();
        let id = c.id.clone();
        let token = c.cancellation();
        store.prepend(c);
        store.select(&id);

        let removed = store.remove(&id);
        assert!(removed.is_some());
        assert!(store.selected_id().is_none());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_remove_other_keeps_selection() {
        let mut store = ConversationStore::new();
        let a = Conversation::new_local();
        let b = Conversation::new_local();
        let (a_id, b_id) = (a.id.clone(), b.id.clone());
        store.prepend(a);
        store.prepend(b);
        store.select(&a_id);
        store.remove(&b_id);
        assert_eq!(store.selected_id(), Some(a_id.as_str()));
    }

    #[test]
    fn test_rename_refuses_blank() {
        let mut store = ConversationStore::new();
        let c = Conversation::new_local();
        let id = c.id.clone();
        store.prepend(c);
        assert!(!store.rename(&id, "   "));
        assert!(store.rename(&id, "  Noir picks "));
        assert_eq!(store.get(&id).unwrap().title, "Noir picks");
    }

    #[test]
    fn test_append_to_missing_conversation_fails() {
        let mut store = ConversationStore::new();
        assert!(!store.append_messages("gone", vec![Message::user("hi")]));
    }

    #[test]
    fn test_history_without_messages_is_not_loaded() {
        let c = Conversation::from_session(session("a", None));
        assert!(!c.loaded);
        assert_eq!(c.session_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_replace_history_keeps_unsynced_local_conversations() {
        let mut store = ConversationStore::new();
        let local = Conversation::new_local();
        let local_id = local.id.clone();
        store.prepend(local);

        store.replace_history(vec![session("a", Some(vec![])), session("b", None)]);

        let ids: Vec<&str> = store.conversations().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![local_id.as_str(), "a", "b"]);
    }

    #[test]
    fn test_replace_history_preserves_loaded_messages_and_local_key() {
        let mut store = ConversationStore::new();
        let mut local = Conversation::new_local();
        let local_id = local.id.clone();
        local.session_id = Some("sess-1".to_string());
        local.messages.push(Message::user("kept"));
        store.prepend(local);
        store.select(&local_id);

        store.replace_history(vec![session("sess-1", None)]);

        let c = store.get(&local_id).unwrap();
        assert_eq!(c.messages.len(), 1);
        assert_eq!(c.title, "Title sess-1");
        assert_eq!(store.selected_id(), Some(local_id.as_str()));
    }

    #[test]
    fn test_replace_history_drops_vanished_selection() {
        let mut store = ConversationStore::new();
        store.replace_history(vec![session("a", Some(vec![]))]);
        store.select("a");
        store.replace_history(vec![session("b", Some(vec![]))]);
        assert!(store.selected_id().is_none());
        assert!(store.find("a").is_none());
    }

    #[test]
    fn test_replace_history_keeps_sessions_missing_from_stale_listing() {
        let mut store = ConversationStore::new();
        let mut local = Conversation::new_local();
        let local_id = local.id.clone();
        local.session_id = Some("sess-new".to_string());
        local.messages.push(Message::user("in flight"));
        let token = local.cancellation();
        store.prepend(local);
        store.prepend(Conversation::from_session(session("opened", Some(vec![]))));
        let unsynced = Conversation::new_local();
        let unsynced_id = unsynced.id.clone();
        store.prepend(unsynced);
        store.select(&local_id);

        store.replace_history(vec![session("a", None)]);

        let ids: Vec<&str> = store.conversations().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![unsynced_id.as_str(), "opened", local_id.as_str(), "a"]
        );
        assert_eq!(store.selected_id(), Some(local_id.as_str()));
        assert_eq!(store.get(&local_id).unwrap().messages.len(), 1);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_replace_history_drops_previously_listed_and_cancels() {
        let mut store = ConversationStore::new();
        store.replace_history(vec![session("a", None), session("b", None)]);
        let token = store.get("a").unwrap().cancellation();

        store.replace_history(vec![session("b", None)]);

        assert!(store.get("a").is_none());
        assert!(token.is_cancelled());
        assert!(store.get("b").is_some());
    }

    #[test]
    fn test_find_by_session_id() {
        let mut store = ConversationStore::new();
        let mut local = Conversation::new_local();
        local.session_id = Some("sess-9".to_string());
        let local_id = local.id.clone();
        store.prepend(local);
        assert_eq!(store.find("sess-9").unwrap().id, local_id);
    }
}
