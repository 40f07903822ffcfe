//! Integration tests for the user-facing flows.
//!
//! Runs phone login and conversation turns end to end against the simulated
//! services on a paused clock, with the store writing through to a file.
//!
//! Verification command: `cargo test --test conversation_flow`

use std::time::Duration;

use aichat::conversation::{SendError, send_message};
use aichat::login::{LoginError, LoginFlow, LoginStep};
use aichat::notify::{Notice, NoticeLevel, Notifier};
use aichat::services::{SimulatedAuth, SimulatedResponder, StaticCountryDirectory};
use aichat::store::{FileStorage, SharedStore, Store};
use aichat_proto::chatroom::DEFAULT_TITLE;
use aichat_proto::message::Sender;
use aichat_proto::user::ValidationError;
use tokio::sync::mpsc;

// =============================================================================
// Helpers
// =============================================================================

struct Harness {
    _dir: tempfile::TempDir,
    path: std::path::PathBuf,
    store: SharedStore<FileStorage>,
    notifier: Notifier,
    notices: mpsc::Receiver<Notice>,
    responder: SimulatedResponder,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aichat-storage.json");
        let (notifier, notices) = Notifier::channel(32);
        let store = Store::load(FileStorage::new(&path))
            .with_notifier(notifier.clone())
            .into_shared();
        Self {
            _dir: dir,
            path,
            store,
            notifier,
            notices,
            responder: SimulatedResponder::default(),
        }
    }

    fn reload(&self) -> Store<FileStorage> {
        Store::load(FileStorage::new(&self.path))
    }

    fn drain(&mut self) -> Vec<Notice> {
        std::iter::from_fn(|| self.notices.try_recv().ok()).collect()
    }

    async fn say(&self, text: &str) -> aichat::conversation::Exchange {
        send_message(&self.store, &self.responder, &self.notifier, text, None)
            .await
            .unwrap()
    }
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test(start_paused = true)]
async fn login_persists_user() {
    let mut h = Harness::new();
    let mut flow = LoginFlow::new(SimulatedAuth::default(), h.notifier.clone());

    flow.start(&StaticCountryDirectory::builtin()).await;
    assert!(flow.countries().iter().any(|c| c.dial_code == "+44"));

    let start = tokio::time::Instant::now();
    flow.submit_phone("7700 900123", "+44").await.unwrap();
    flow.submit_otp(&h.store, "123456").await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(2500));

    assert!(matches!(flow.step(), LoginStep::Verified(_)));
    let user = h.reload().state().user.clone().unwrap();
    assert!(user.is_authenticated);
    assert_eq!(user.full_number(), "+447700900123");

    let levels: Vec<_> = h.drain().into_iter().map(|n| n.level).collect();
    assert_eq!(levels, [NoticeLevel::Success, NoticeLevel::Success]);
}

#[tokio::test(start_paused = true)]
async fn invalid_otp_keeps_user_signed_out() {
    let h = Harness::new();
    let mut flow = LoginFlow::new(SimulatedAuth::default(), h.notifier.clone());
    flow.submit_phone("5551234567", "+1").await.unwrap();

    assert_eq!(
        flow.submit_otp(&h.store, "1234").await,
        Err(LoginError::Invalid(ValidationError::OtpLength(4)))
    );
    assert!(h.store.lock().state().user.is_none());
    assert!(h.reload().state().user.is_none());
}

// =============================================================================
// Conversation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn hello_world_scenario() {
    let h = Harness::new();
    let room = h.store.lock().create_chatroom(None);
    assert_eq!(room.title, DEFAULT_TITLE);

    let first = h.say("Hello").await;
    assert_eq!(first.chatroom_id, room.id);

    let state = h.store.lock().state();
    let stored = state.chatroom(&room.id).unwrap();
    assert_eq!(stored.title, "Hello");
    assert_eq!(stored.messages.len(), 2);
    assert_eq!(stored.messages[0].sender, Sender::User);
    assert_eq!(stored.messages[1].sender, Sender::Ai);
    assert_eq!(
        stored.last_message,
        first.reply.as_ref().map(|r| r.timestamp)
    );

    h.say("World").await;
    let state = h.store.lock().state();
    assert_eq!(state.chatroom(&room.id).unwrap().title, "Hello");
}

#[tokio::test(start_paused = true)]
async fn long_first_message_truncates_title() {
    let h = Harness::new();
    let text = "a".repeat(80);
    let exchange = h.say(&text).await;

    let state = h.reload().state();
    let title = &state.chatroom(&exchange.chatroom_id).unwrap().title;
    assert_eq!(title, &format!("{}...", "a".repeat(50)));
}

#[tokio::test(start_paused = true)]
async fn conversation_survives_restart() {
    let h = Harness::new();
    h.say("first question").await;
    h.say("second question").await;

    let state = h.reload().state();
    assert_eq!(state.chatrooms.len(), 1);
    let room = &state.chatrooms[0];
    assert_eq!(room.messages.len(), 4);
    assert_eq!(room.title, "first question");
    assert_eq!(state.active_chatroom_id, Some(room.id));
    assert!(!state.is_typing);
}

#[tokio::test(start_paused = true)]
async fn typing_flag_is_not_persisted_mid_turn() {
    let h = Harness::new();
    let ((), on_disk) = tokio::join!(
        async {
            h.say("hi").await;
        },
        async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            (h.store.lock().state().is_typing, h.reload().state().is_typing)
        }
    );
    assert_eq!(on_disk, (true, false));
}

#[tokio::test(start_paused = true)]
async fn deleting_active_selects_most_recent() {
    let h = Harness::new();
    let a = h.store.lock().create_chatroom(Some("A"));
    let b = h.store.lock().create_chatroom(Some("B"));
    let c = h.store.lock().create_chatroom(Some("C"));

    h.store.lock().delete_chatroom(&c.id);
    let state = h.reload().state();
    assert_eq!(state.chatrooms.len(), 2);
    assert_eq!(state.active_chatroom_id, Some(b.id));

    h.store.lock().delete_chatroom(&b.id);
    h.store.lock().delete_chatroom(&a.id);
    let state = h.reload().state();
    assert!(state.chatrooms.is_empty());
    assert_eq!(state.active_chatroom_id, None);
}

#[tokio::test(start_paused = true)]
async fn search_filters_by_title() {
    let h = Harness::new();
    for title in ["Rust questions", "Dinner ideas", "rusty bike"] {
        h.store.lock().create_chatroom(Some(title));
    }

    let mut store = h.store.lock();
    store.set_search_query("RUST");
    let state = store.state();
    let titles: Vec<_> = state
        .filtered_chatrooms()
        .iter()
        .map(|c| c.title.as_str())
        .collect();
    assert_eq!(titles, ["rusty bike", "Rust questions"]);

    store.set_search_query("zzz");
    assert!(store.state().filtered_chatrooms().is_empty());

    store.set_search_query("");
    assert_eq!(store.state().filtered_chatrooms().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn empty_message_changes_nothing() {
    let h = Harness::new();
    let result = send_message(&h.store, &h.responder, &h.notifier, " \n\t", None).await;
    assert_eq!(result.unwrap_err(), SendError::Empty);
    assert!(!h.path.exists());
}
