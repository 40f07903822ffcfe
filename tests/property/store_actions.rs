//! Property-based tests for store actions.
//!
//! Uses proptest to apply random action sequences and verify:
//! 1. The active id always references an existing chatroom (or is unset).
//! 2. Chatroom ids stay unique and titles never change after the first message.
//! 3. Actions on unknown chatrooms leave the collection referentially unchanged.
//! 4. The store writes storage exactly when the persisted subset changes, and
//!    what it writes reloads to the same persisted state.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use aichat::store::{Action, ChatState, MemoryStorage, Store, reduce};
use aichat_proto::chatroom::{Chatroom, ChatroomId};
use aichat_proto::message::{MessageId, NewMessage};
use aichat_proto::theme::Theme;
use aichat_proto::user::User;

// --- Strategies ---

/// An action template; chatroom references are resolved against the state
/// it is applied to so sequences mostly hit existing rooms.
#[derive(Debug, Clone)]
enum Op {
    Create(Option<String>, i64),
    Delete(prop::sample::Index),
    DeleteUnknown,
    Select(prop::sample::Index),
    SelectUnknown,
    Message(prop::sample::Index, String),
    Typing(bool),
    Search(String),
    Sidebar(bool),
    Theme(bool),
    Login,
    Logout,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (proptest::option::of("[a-z ]{1,20}"), 0i64..10_000)
            .prop_map(|(t, m)| Op::Create(t, m)),
        2 => any::<prop::sample::Index>().prop_map(Op::Delete),
        1 => Just(Op::DeleteUnknown),
        2 => any::<prop::sample::Index>().prop_map(Op::Select),
        1 => Just(Op::SelectUnknown),
        4 => (any::<prop::sample::Index>(), "[^\x00]{0,80}")
            .prop_map(|(i, text)| Op::Message(i, text)),
        1 => any::<bool>().prop_map(Op::Typing),
        1 => "[a-z]{0,5}".prop_map(Op::Search),
        1 => any::<bool>().prop_map(Op::Sidebar),
        1 => any::<bool>().prop_map(Op::Theme),
        1 => Just(Op::Login),
        1 => Just(Op::Logout),
    ]
}

fn pick(state: &ChatState, index: &prop::sample::Index) -> ChatroomId {
    if state.chatrooms.is_empty() {
        ChatroomId::new()
    } else {
        state.chatrooms[index.index(state.chatrooms.len())].id
    }
}

fn to_action(state: &ChatState, op: Op) -> Action {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    match op {
        Op::Create(title, minutes) => Action::CreateChatroom(Chatroom::new_at(
            title.as_deref(),
            base + Duration::minutes(minutes),
        )),
        Op::Delete(i) => Action::DeleteChatroom(pick(state, &i)),
        Op::DeleteUnknown => Action::DeleteChatroom(ChatroomId::new()),
        Op::Select(i) => Action::SetActiveChatroom(pick(state, &i)),
        Op::SelectUnknown => Action::SetActiveChatroom(ChatroomId::new()),
        Op::Message(i, text) => Action::AddMessage {
            chatroom_id: pick(state, &i),
            message: NewMessage::user(text).into_message(MessageId::new()),
        },
        Op::Typing(on) => Action::SetTyping(on),
        Op::Search(q) => Action::SetSearchQuery(q),
        Op::Sidebar(open) => Action::SetSidebarOpen(open),
        Op::Theme(dark) => Action::SetTheme(if dark { Theme::Dark } else { Theme::Light }),
        Op::Login => Action::SetUser(Some(User::authenticated("5551234567", "+1"))),
        Op::Logout => Action::Logout,
    }
}

fn check_invariants(state: &ChatState) -> Result<(), TestCaseError> {
    if let Some(active) = state.active_chatroom_id {
        prop_assert!(state.chatroom(&active).is_some(), "dangling active id");
    }
    let mut ids = std::collections::HashSet::new();
    for room in state.chatrooms.iter() {
        prop_assert!(ids.insert(room.id), "duplicate chatroom id");
        if let Some(last) = room.messages.last() {
            prop_assert_eq!(room.last_message, Some(last.timestamp));
        }
    }
    Ok(())
}

// --- Properties ---

proptest! {
    #[test]
    fn invariants_hold_for_any_sequence(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut state = ChatState::default();
        for op in ops {
            let action = to_action(&state, op);
            state = reduce(&state, action);
            check_invariants(&state)?;
        }
    }

    #[test]
    fn titles_are_fixed_once_set(ops in prop::collection::vec(arb_op(), 0..60)) {
        let mut state = ChatState::default();
        for op in ops {
            let action = to_action(&state, op);
            let next = reduce(&state, action);
            for before in state.chatrooms.iter().filter(|c| !c.messages.is_empty()) {
                if let Some(after) = next.chatroom(&before.id) {
                    prop_assert_eq!(&after.title, &before.title);
                }
            }
            state = next;
        }
    }

    #[test]
    fn unknown_ids_leave_collection_shared(
        ops in prop::collection::vec(arb_op(), 0..30),
        text in "[a-z]{1,10}",
    ) {
        let mut state = ChatState::default();
        for op in ops {
            let action = to_action(&state, op);
            state = reduce(&state, action);
        }
        let unknown = ChatroomId::new();
        for action in [
            Action::DeleteChatroom(unknown),
            Action::SetActiveChatroom(unknown),
            Action::AddMessage {
                chatroom_id: unknown,
                message: NewMessage::ai(text.clone()).into_message(MessageId::new()),
            },
        ] {
            let next = reduce(&state, action);
            prop_assert!(Arc::ptr_eq(&state.chatrooms, &next.chatrooms));
            prop_assert_eq!(next.active_chatroom_id, state.active_chatroom_id);
        }
    }

    #[test]
    fn delete_active_picks_newest_remaining(
        minutes in prop::collection::vec(0i64..1000, 2..8),
    ) {
        let mut state = ChatState::default();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for m in &minutes {
            state = reduce(
                &state,
                Action::CreateChatroom(Chatroom::new_at(None, base + Duration::minutes(*m))),
            );
        }
        let active = state.active_chatroom_id.unwrap();
        let next = reduce(&state, Action::DeleteChatroom(active));

        let newest = next.chatrooms.iter().map(|c| c.created_at).max();
        let selected = next.active_chatroom().map(|c| c.created_at);
        prop_assert_eq!(selected, newest);
    }

    #[test]
    fn store_writes_exactly_when_persisted_state_changes(
        ops in prop::collection::vec(arb_op(), 0..40),
    ) {
        let storage = MemoryStorage::new();
        let mut store = Store::load(storage.clone());
        for op in ops {
            let before = store.state();
            let blob_before = storage.contents();
            let action = to_action(&before, op);
            let after = store.dispatch(action);

            if after.same_persisted(&before) {
                prop_assert_eq!(storage.contents(), blob_before);
            } else {
                let reloaded = Store::load(storage.clone()).state();
                prop_assert_eq!(reloaded.to_snapshot(), after.to_snapshot());
            }
        }
    }
}
