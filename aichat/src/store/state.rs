//! Immutable store snapshot and derived queries.

use std::sync::Arc;

use aichat_proto::chatroom::{Chatroom, ChatroomId};
use aichat_proto::snapshot::{SNAPSHOT_VERSION, Snapshot};
use aichat_proto::theme::Theme;
use aichat_proto::user::User;

/// One immutable version of the application state.
///
/// The chatroom collection sits behind an [`Arc`] so that versions produced
/// by actions that leave it untouched share the same allocation. Compare
/// with [`Arc::ptr_eq`] to detect "referentially unchanged".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatState {
    /// Signed-in user, if any.
    pub user: Option<User>,
    /// Chatrooms, most recently created first.
    pub chatrooms: Arc<Vec<Chatroom>>,
    /// Selected chatroom. Always references an entry of `chatrooms`.
    pub active_chatroom_id: Option<ChatroomId>,
    /// Whether the assistant is composing a reply.
    pub is_typing: bool,
    /// Sidebar search filter.
    pub search_query: String,
    /// Whether the sidebar is expanded.
    pub sidebar_open: bool,
    /// Color theme.
    pub theme: Theme,
}

impl Default for ChatState {
    fn default() -> Self {
        Self {
            user: None,
            chatrooms: Arc::new(Vec::new()),
            active_chatroom_id: None,
            is_typing: false,
            search_query: String::new(),
            sidebar_open: true,
            theme: Theme::default(),
        }
    }
}

impl ChatState {
    /// Rebuilds state from a decoded snapshot. Transient UI flags start at
    /// their defaults.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            user: snapshot.user,
            chatrooms: Arc::new(snapshot.chatrooms),
            active_chatroom_id: snapshot.active_chatroom_id,
            theme: snapshot.theme,
            ..Self::default()
        }
    }

    /// The persisted subset of this state.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            user: self.user.clone(),
            chatrooms: self.chatrooms.as_ref().clone(),
            active_chatroom_id: self.active_chatroom_id,
            theme: self.theme,
        }
    }

    /// Returns `true` if the persisted subset of `self` and `other` is equal.
    ///
    /// Shared chatroom allocations are compared by pointer first.
    #[must_use]
    pub fn same_persisted(&self, other: &Self) -> bool {
        self.user == other.user
            && self.active_chatroom_id == other.active_chatroom_id
            && self.theme == other.theme
            && (Arc::ptr_eq(&self.chatrooms, &other.chatrooms)
                || self.chatrooms == other.chatrooms)
    }

    /// Looks up a chatroom by id.
    #[must_use]
    pub fn chatroom(&self, id: &ChatroomId) -> Option<&Chatroom> {
        self.chatrooms.iter().find(|c| c.id == *id)
    }

    /// The chatroom matching the active id, if any.
    #[must_use]
    pub fn active_chatroom(&self) -> Option<&Chatroom> {
        self.active_chatroom_id
            .as_ref()
            .and_then(|id| self.chatroom(id))
    }

    /// Chatrooms whose title contains the search query, ignoring case.
    ///
    /// An empty query returns every chatroom. Order is preserved.
    #[must_use]
    pub fn filtered_chatrooms(&self) -> Vec<&Chatroom> {
        if self.search_query.is_empty() {
            return self.chatrooms.iter().collect();
        }
        let needle = self.search_query.to_lowercase();
        self.chatrooms
            .iter()
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Whether a user is signed in and verified.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_authenticated)
    }
}
