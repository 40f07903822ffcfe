//! Application state store.
//!
//! [`Store`] owns the current [`ChatState`] and a [`SnapshotStorage`]
//! backend. All mutations go through [`Store::dispatch`], which
//!
//! 1. applies the [`Action`] with the pure [`reduce`] function,
//! 2. swaps in the new state, and
//! 3. writes the persisted subset (user, chatrooms, active id, theme) to
//!    storage if, and only if, that subset changed.
//!
//! Loading is fail-open: a missing, unreadable, corrupt, or invalid blob
//! yields the default state and a logged warning, never an error.
//!
//! Storage write failures are logged and surfaced as a notice; the
//! in-memory state stays authoritative.

pub mod actions;
pub mod state;
pub mod storage;

use std::sync::Arc;

use aichat_proto::chatroom::{Chatroom, ChatroomId};
use aichat_proto::message::{Message, MessageId, NewMessage};
use aichat_proto::snapshot;
use aichat_proto::theme::Theme;
use aichat_proto::user::User;

use crate::notify::Notifier;

pub use actions::{Action, reduce};
pub use state::ChatState;
pub use storage::{FileStorage, MemoryStorage, SnapshotStorage, StorageError};

/// A store shared between the front end and in-flight simulated calls.
///
/// Lock only for synchronous mutations; never hold the guard across an
/// `.await`.
pub type SharedStore<S> = Arc<parking_lot::Mutex<Store<S>>>;

/// Single source of truth for session and chat data, mirrored to storage.
pub struct Store<S: SnapshotStorage> {
    state: Arc<ChatState>,
    storage: S,
    notifier: Option<Notifier>,
}

impl<S: SnapshotStorage> Store<S> {
    /// Creates a store by loading the persisted snapshot from `storage`.
    ///
    /// Any failure to read or decode the snapshot is treated as "nothing
    /// persisted".
    pub fn load(storage: S) -> Self {
        let state = match storage.read() {
            Ok(Some(blob)) => match snapshot::decode(&blob) {
                Ok(snap) => {
                    tracing::info!(
                        chatrooms = snap.chatrooms.len(),
                        signed_in = snap.user.is_some(),
                        "restored persisted state"
                    );
                    ChatState::from_snapshot(snap)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "persisted state is invalid, starting fresh");
                    ChatState::default()
                }
            },
            Ok(None) => ChatState::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read persisted state, starting fresh");
                ChatState::default()
            }
        };

        Self {
            state: Arc::new(state),
            storage,
            notifier: None,
        }
    }

    /// Attaches a notifier for storage failure notices.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Wraps the store for sharing.
    #[must_use]
    pub fn into_shared(self) -> SharedStore<S> {
        Arc::new(parking_lot::Mutex::new(self))
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> Arc<ChatState> {
        Arc::clone(&self.state)
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Applies an action and persists if the persisted subset changed.
    pub fn dispatch(&mut self, action: Action) -> Arc<ChatState> {
        let next = reduce(&self.state, action);
        let dirty = !next.same_persisted(&self.state);
        self.state = Arc::new(next);
        if dirty {
            self.persist();
        }
        Arc::clone(&self.state)
    }

    fn persist(&self) {
        let result = snapshot::encode(&self.state.to_snapshot())
            .map_err(|e| e.to_string())
            .and_then(|blob| self.storage.write(&blob).map_err(|e| e.to_string()));

        if let Err(reason) = result {
            tracing::warn!(error = %reason, "failed to persist state");
            if let Some(notifier) = &self.notifier {
                notifier.error("Could not save your chats");
            }
        }
    }

    /// Replaces the session user.
    pub fn set_user(&mut self, user: Option<User>) {
        self.dispatch(Action::SetUser(user));
    }

    /// Creates a chatroom, prepends it, makes it active, and returns it.
    pub fn create_chatroom(&mut self, title: Option<&str>) -> Chatroom {
        let chatroom = Chatroom::new(title);
        tracing::info!(chatroom_id = %chatroom.id, "chatroom created");
        self.dispatch(Action::CreateChatroom(chatroom.clone()));
        chatroom
    }

    /// Deletes a chatroom. Unknown ids are ignored.
    pub fn delete_chatroom(&mut self, id: &ChatroomId) {
        self.dispatch(Action::DeleteChatroom(*id));
    }

    /// Selects a chatroom. Unknown ids are ignored.
    pub fn set_active_chatroom(&mut self, id: &ChatroomId) {
        self.dispatch(Action::SetActiveChatroom(*id));
    }

    /// Assigns an id to `message` and appends it to the chatroom.
    ///
    /// Returns the stored message, or `None` if the chatroom does not exist.
    pub fn add_message(&mut self, chatroom_id: &ChatroomId, message: NewMessage) -> Option<Message> {
        if self.state.chatroom(chatroom_id).is_none() {
            tracing::debug!(chatroom_id = %chatroom_id, "message dropped: unknown chatroom");
            return None;
        }
        let message = message.into_message(MessageId::new());
        self.dispatch(Action::AddMessage {
            chatroom_id: *chatroom_id,
            message: message.clone(),
        });
        Some(message)
    }

    /// Sets the "assistant is typing" flag.
    pub fn set_typing(&mut self, is_typing: bool) {
        self.dispatch(Action::SetTyping(is_typing));
    }

    /// Sets the sidebar search filter.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.dispatch(Action::SetSearchQuery(query.into()));
    }

    /// Expands or collapses the sidebar.
    pub fn set_sidebar_open(&mut self, open: bool) {
        self.dispatch(Action::SetSidebarOpen(open));
    }

    /// Flips the sidebar.
    pub fn toggle_sidebar(&mut self) {
        let open = !self.state.sidebar_open;
        self.set_sidebar_open(open);
    }

    /// Sets the color theme.
    pub fn set_theme(&mut self, theme: Theme) {
        self.dispatch(Action::SetTheme(theme));
    }

    /// Flips between light and dark, returning the new theme.
    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.state.theme.toggled();
        self.set_theme(theme);
        theme
    }

    /// Clears the session user.
    pub fn logout(&mut self) {
        self.dispatch(Action::Logout);
    }

    /// Drops all state and removes the persisted blob.
    ///
    /// If the blob cannot be removed it is overwritten with the empty
    /// state instead, so the old chats do not come back on the next load.
    pub fn reset(&mut self) {
        self.state = Arc::new(reduce(&self.state, Action::Reset));
        if let Err(e) = self.storage.clear() {
            tracing::warn!(error = %e, "failed to clear persisted state, overwriting");
            if let Some(notifier) = &self.notifier {
                notifier.error("Could not remove saved chats");
            }
            self.persist();
        }
    }
}
