//! Integration tests for store persistence.
//!
//! Tests write-through to file storage, reload across store instances,
//! exact timestamp round-trips, and fail-open loading of bad blobs.
//!
//! Verification command: `cargo test --test store_persistence`

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use aichat::store::{Action, FileStorage, MemoryStorage, SnapshotStorage, Store};
use aichat_proto::chatroom::{Chatroom, DEFAULT_TITLE};
use aichat_proto::message::{MessageId, NewMessage, Sender};
use aichat_proto::snapshot::{self, SNAPSHOT_VERSION, Snapshot};
use aichat_proto::theme::Theme;
use aichat_proto::user::User;

// =============================================================================
// Helpers
// =============================================================================

fn file_store(dir: &tempfile::TempDir) -> Store<FileStorage> {
    Store::load(FileStorage::new(dir.path().join("aichat-storage.json")))
}

// =============================================================================
// Reload
// =============================================================================

#[test]
fn chats_survive_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (room_id, hello_ts, world_ts) = {
        let mut store = file_store(&dir);
        store.set_user(Some(User::authenticated("5551234567", "+1")));
        let room = store.create_chatroom(None);
        let hello = store
            .add_message(&room.id, NewMessage::user("Hello"))
            .unwrap();
        let world = store.add_message(&room.id, NewMessage::ai("World")).unwrap();
        store.set_theme(Theme::Dark);
        (room.id, hello.timestamp, world.timestamp)
    };

    let store = file_store(&dir);
    let state = store.state();
    assert!(state.is_authenticated());
    assert_eq!(state.theme, Theme::Dark);
    assert_eq!(state.active_chatroom_id, Some(room_id));

    let room = state.chatroom(&room_id).unwrap();
    assert_eq!(room.title, "Hello");
    assert_eq!(room.messages.len(), 2);
    assert_eq!(room.messages[0].timestamp, hello_ts);
    assert_eq!(room.messages[1].timestamp, world_ts);
    assert_eq!(room.messages[1].sender, Sender::Ai);
    assert_eq!(room.last_message, Some(world_ts));
}

#[test]
fn transient_flags_are_not_restored() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = file_store(&dir);
        store.create_chatroom(None);
        store.set_typing(true);
        store.set_search_query("rust");
        store.set_sidebar_open(false);
    }

    let state = file_store(&dir).state();
    assert!(!state.is_typing);
    assert!(state.search_query.is_empty());
    assert!(state.sidebar_open);
    assert_eq!(state.chatrooms.len(), 1);
}

#[test]
fn explicit_timestamps_round_trip_exactly() {
    let storage = MemoryStorage::new();
    let created = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap()
        + chrono::Duration::nanoseconds(123_456_789);
    let room = Chatroom::new_at(Some("Year end"), created);
    let room_id = room.id;

    {
        let mut store = Store::load(storage.clone());
        store.dispatch(Action::CreateChatroom(room));
        store.dispatch(Action::AddMessage {
            chatroom_id: room_id,
            message: NewMessage::user("late night")
                .at(created)
                .into_message(MessageId::new()),
        });
    }

    let state = Store::load(storage).state();
    let restored = state.chatroom(&room_id).unwrap();
    assert_eq!(restored.created_at, created);
    assert_eq!(restored.last_message, Some(created));
    assert_eq!(restored.title, "Year end");
}

#[test]
fn logout_persists_and_keeps_chats() {
    let storage = MemoryStorage::new();
    {
        let mut store = Store::load(storage.clone());
        store.set_user(Some(User::authenticated("5551234567", "+1")));
        store.create_chatroom(Some("Kept"));
        store.logout();
    }
    let state = Store::load(storage).state();
    assert!(state.user.is_none());
    assert_eq!(state.chatrooms[0].title, "Kept");
}

#[test]
fn reset_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aichat-storage.json");
    let mut store = Store::load(FileStorage::new(&path));
    store.create_chatroom(None);
    assert!(path.exists());

    store.reset();
    assert!(!path.exists());
    assert!(file_store(&dir).state().chatrooms.is_empty());
}

// =============================================================================
// Fail-open loading
// =============================================================================

#[test]
fn corrupt_file_loads_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aichat-storage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let mut store = Store::load(FileStorage::new(&path));
    assert!(store.state().chatrooms.is_empty());

    // The next write replaces the corrupt blob.
    store.create_chatroom(None);
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(snapshot::decode(&text).is_ok());
}

#[test]
fn future_version_loads_default() {
    let blob = format!(
        r#"{{"version":{},"user":null,"chatrooms":[],"activeChatroomId":null}}"#,
        SNAPSHOT_VERSION + 1
    );
    let store = Store::load(MemoryStorage::with_blob(blob));
    assert!(store.state().chatrooms.is_empty());
}

#[test]
fn dangling_active_id_loads_default() {
    let room = Chatroom::new(None);
    let snap = Snapshot {
        chatrooms: vec![room],
        active_chatroom_id: Some(Chatroom::new(None).id),
        ..Snapshot::default()
    };
    let blob = serde_json::to_string(&snap).unwrap();
    let store = Store::load(MemoryStorage::with_blob(blob));
    assert!(store.state().chatrooms.is_empty());
    assert!(store.state().active_chatroom_id.is_none());
}

#[test]
fn valid_blob_written_elsewhere_is_loaded() {
    let mut room = Chatroom::new(None);
    room.push_message(NewMessage::user("from disk").into_message(MessageId::new()));
    let snap = Snapshot {
        active_chatroom_id: Some(room.id),
        chatrooms: vec![room],
        ..Snapshot::default()
    };
    let storage = MemoryStorage::with_blob(snapshot::encode(&snap).unwrap());
    let state = Store::load(storage).state();
    assert_eq!(state.chatrooms[0].title, "from disk");
}

// =============================================================================
// Write-through behavior
// =============================================================================

#[test]
fn noop_delete_keeps_state_and_blob() {
    let storage = MemoryStorage::new();
    let mut store = Store::load(storage.clone());
    store.create_chatroom(None);
    let before_state = store.state();
    let before_blob = storage.contents();

    store.delete_chatroom(&Chatroom::new(None).id);

    assert!(Arc::ptr_eq(&before_state.chatrooms, &store.state().chatrooms));
    assert_eq!(storage.contents(), before_blob);
}

#[test]
fn storage_blob_matches_state() {
    let storage = MemoryStorage::new();
    let mut store = Store::load(storage.clone());
    let room = store.create_chatroom(None);
    store.add_message(&room.id, NewMessage::user("sync me"));

    let decoded = snapshot::decode(&storage.read().unwrap().unwrap()).unwrap();
    assert_eq!(decoded, store.state().to_snapshot());
    assert_eq!(decoded.chatrooms[0].title, "sync me");
    assert_ne!(decoded.chatrooms[0].title, DEFAULT_TITLE);
}
