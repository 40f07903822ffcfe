//! Store mutations as pure functions over [`ChatState`].
//!
//! Every mutation the application can perform is an [`Action`]; [`reduce`]
//! applies one to a state and returns the next state without touching the
//! input. Identities and timestamps are generated by the caller before
//! dispatch, so `reduce` is deterministic.
//!
//! Actions that reference an unknown chatroom return a state whose chatroom
//! collection is the same allocation as the input's.

use std::sync::Arc;

use aichat_proto::chatroom::{Chatroom, ChatroomId};
use aichat_proto::message::Message;
use aichat_proto::theme::Theme;
use aichat_proto::user::User;

use super::state::ChatState;

/// A single store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Replace the session user (or clear it).
    SetUser(Option<User>),
    /// Prepend a freshly built chatroom and make it active.
    CreateChatroom(Chatroom),
    /// Remove a chatroom, reselecting the active one if needed.
    DeleteChatroom(ChatroomId),
    /// Select a chatroom. Unknown ids are ignored.
    SetActiveChatroom(ChatroomId),
    /// Append a message to a chatroom.
    AddMessage {
        /// Target chatroom.
        chatroom_id: ChatroomId,
        /// Message with its identity already assigned.
        message: Message,
    },
    /// Set the "assistant is typing" flag.
    SetTyping(bool),
    /// Set the sidebar search filter.
    SetSearchQuery(String),
    /// Expand or collapse the sidebar.
    SetSidebarOpen(bool),
    /// Set the color theme.
    SetTheme(Theme),
    /// Clear the session user, keeping chats.
    Logout,
    /// Return to the initial state.
    Reset,
}

/// Applies `action` to `state`, returning the next state.
#[must_use]
pub fn reduce(state: &ChatState, action: Action) -> ChatState {
    match action {
        Action::SetUser(user) => ChatState {
            user,
            ..state.clone()
        },
        Action::CreateChatroom(chatroom) => create_chatroom(state, chatroom),
        Action::DeleteChatroom(id) => delete_chatroom(state, &id),
        Action::SetActiveChatroom(id) => set_active_chatroom(state, id),
        Action::AddMessage {
            chatroom_id,
            message,
        } => add_message(state, &chatroom_id, message),
        Action::SetTyping(is_typing) => ChatState {
            is_typing,
            ..state.clone()
        },
        Action::SetSearchQuery(search_query) => ChatState {
            search_query,
            ..state.clone()
        },
        Action::SetSidebarOpen(sidebar_open) => ChatState {
            sidebar_open,
            ..state.clone()
        },
        Action::SetTheme(theme) => ChatState {
            theme,
            ..state.clone()
        },
        Action::Logout => ChatState {
            user: None,
            ..state.clone()
        },
        Action::Reset => ChatState::default(),
    }
}

fn create_chatroom(state: &ChatState, chatroom: Chatroom) -> ChatState {
    if state.chatroom(&chatroom.id).is_some() {
        tracing::debug!(chatroom_id = %chatroom.id, "create ignored: id already present");
        return state.clone();
    }
    let id = chatroom.id;
    let mut rooms = Vec::with_capacity(state.chatrooms.len() + 1);
    rooms.push(chatroom);
    rooms.extend(state.chatrooms.iter().cloned());
    ChatState {
        chatrooms: Arc::new(rooms),
        active_chatroom_id: Some(id),
        ..state.clone()
    }
}

fn delete_chatroom(state: &ChatState, id: &ChatroomId) -> ChatState {
    if state.chatroom(id).is_none() {
        tracing::debug!(chatroom_id = %id, "delete ignored: unknown chatroom");
        return state.clone();
    }

    let remaining: Vec<Chatroom> = state
        .chatrooms
        .iter()
        .filter(|c| c.id != *id)
        .cloned()
        .collect();

    let active_chatroom_id = if state.active_chatroom_id == Some(*id) {
        most_recent(&remaining)
    } else {
        state.active_chatroom_id
    };

    ChatState {
        chatrooms: Arc::new(remaining),
        active_chatroom_id,
        is_typing: false,
        ..state.clone()
    }
}

/// The most recently created chatroom; the earliest in order wins a tie.
fn most_recent(rooms: &[Chatroom]) -> Option<ChatroomId> {
    rooms
        .iter()
        .min_by_key(|c| std::cmp::Reverse(c.created_at))
        .map(|c| c.id)
}

fn set_active_chatroom(state: &ChatState, id: ChatroomId) -> ChatState {
    if state.chatroom(&id).is_none() {
        tracing::debug!(chatroom_id = %id, "select ignored: unknown chatroom");
        return state.clone();
    }
    ChatState {
        active_chatroom_id: Some(id),
        ..state.clone()
    }
}

fn add_message(state: &ChatState, chatroom_id: &ChatroomId, message: Message) -> ChatState {
    let Some(index) = state.chatrooms.iter().position(|c| c.id == *chatroom_id) else {
        tracing::debug!(chatroom_id = %chatroom_id, "message dropped: unknown chatroom");
        return state.clone();
    };
    if state.chatrooms[index].contains_message(&message.id) {
        tracing::debug!(message_id = %message.id, "message dropped: duplicate id");
        return state.clone();
    }

    let mut rooms = state.chatrooms.as_ref().clone();
    rooms[index].push_message(message);
    ChatState {
        chatrooms: Arc::new(rooms),
        ..state.clone()
    }
}
