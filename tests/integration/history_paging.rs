//! Integration tests for older-message pagination.
//!
//! Drives `HistoryPager` through `load_older` with the simulated source on a
//! paused clock: page limits, ordering against real messages, duplicate
//! filtering, and stale completions after switching chatrooms.
//!
//! Verification command: `cargo test --test history_paging`

use std::collections::HashSet;
use std::time::Duration;

use aichat::history::{
    HistoryPager, LoadOutcome, MAX_PAGES, PAGE_SIZE, PagerConfig, PagerState, SimulatedHistory,
    load_older,
};
use aichat::store::{MemoryStorage, Store};
use aichat_proto::message::{NewMessage, Sender};

// =============================================================================
// Helpers
// =============================================================================

/// A store with one chatroom holding `count` real messages.
fn store_with_messages(count: usize) -> Store<MemoryStorage> {
    let mut store = Store::load(MemoryStorage::new());
    let room = store.create_chatroom(None);
    for i in 0..count {
        store.add_message(&room.id, NewMessage::user(format!("real {i}")));
    }
    store
}

fn entered_pager(store: &Store<MemoryStorage>) -> parking_lot::Mutex<HistoryPager> {
    let mut pager = HistoryPager::default();
    pager.enter(store.state().active_chatroom().unwrap());
    parking_lot::Mutex::new(pager)
}

// =============================================================================
// Page limits
// =============================================================================

#[tokio::test(start_paused = true)]
async fn ten_pages_of_twenty_then_exhausted() {
    let store = store_with_messages(1);
    let pager = entered_pager(&store);
    let source = SimulatedHistory::default();

    let start = tokio::time::Instant::now();
    let mut loads = 0;
    while let Some(outcome) = load_older(&pager, &source).await {
        loads += 1;
        match outcome {
            LoadOutcome::Loaded { added } => assert_eq!(added, PAGE_SIZE),
            LoadOutcome::Exhausted { added } => {
                assert_eq!(added, PAGE_SIZE);
                assert_eq!(loads, MAX_PAGES);
            }
            LoadOutcome::Stale => panic!("unexpected stale page"),
        }
    }

    let pager = pager.lock();
    assert_eq!(loads, 10);
    assert_eq!(pager.older_messages().len(), 200);
    assert_eq!(pager.state(), PagerState::Exhausted);
    assert!(!pager.has_more());
    assert!(start.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn empty_chatroom_never_loads() {
    let store = store_with_messages(0);
    let pager = entered_pager(&store);
    let source = SimulatedHistory::default();

    let start = tokio::time::Instant::now();
    assert_eq!(load_older(&pager, &source).await, None);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(!pager.lock().has_more());
}

#[tokio::test(start_paused = true)]
async fn custom_config_limits_pages() {
    let store = store_with_messages(2);
    let mut pager = HistoryPager::new(PagerConfig {
        page_size: 5,
        max_pages: 2,
        load_delay: Duration::from_millis(10),
    });
    pager.enter(store.state().active_chatroom().unwrap());
    let pager = parking_lot::Mutex::new(pager);
    let source = SimulatedHistory::new(Duration::from_millis(10));

    assert_eq!(
        load_older(&pager, &source).await,
        Some(LoadOutcome::Loaded { added: 5 })
    );
    assert_eq!(
        load_older(&pager, &source).await,
        Some(LoadOutcome::Exhausted { added: 5 })
    );
    assert_eq!(load_older(&pager, &source).await, None);
}

// =============================================================================
// Ordering and identity
// =============================================================================

#[tokio::test(start_paused = true)]
async fn visible_list_is_chronological_and_unique() {
    let store = store_with_messages(3);
    let pager = entered_pager(&store);
    let source = SimulatedHistory::default();
    while load_older(&pager, &source).await.is_some() {}

    let state = store.state();
    let room = state.active_chatroom().unwrap();
    let pager = pager.lock();
    let visible: Vec<_> = pager.visible_messages(&room.messages).collect();

    assert_eq!(visible.len(), 203);
    assert!(
        visible
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    );
    let ids: HashSet<_> = visible.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), visible.len());
}

#[tokio::test(start_paused = true)]
async fn every_third_synthetic_message_is_from_user() {
    let store = store_with_messages(1);
    let pager = entered_pager(&store);
    let source = SimulatedHistory::default();
    load_older(&pager, &source).await;

    let pager = pager.lock();
    // Page 0 starts the global index, so position and index coincide.
    for (i, message) in pager.older_messages().iter().enumerate() {
        let expected = if i % 3 == 0 { Sender::User } else { Sender::Ai };
        assert_eq!(message.sender, expected, "position {i}");
    }
}

#[tokio::test(start_paused = true)]
async fn real_messages_are_untouched() {
    let store = store_with_messages(2);
    let before = store.state();
    let pager = entered_pager(&store);
    load_older(&pager, &SimulatedHistory::default()).await;
    assert_eq!(store.state(), before);
}

// =============================================================================
// Concurrency and staleness
// =============================================================================

#[tokio::test(start_paused = true)]
async fn second_request_while_loading_is_ignored() {
    let store = store_with_messages(1);
    let pager = entered_pager(&store);
    let source = SimulatedHistory::default();

    let (a, b) = tokio::join!(load_older(&pager, &source), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        load_older(&pager, &source).await
    });
    assert_eq!(a, Some(LoadOutcome::Loaded { added: PAGE_SIZE }));
    assert_eq!(b, None);
    assert_eq!(pager.lock().pages_loaded(), 1);
}

#[tokio::test(start_paused = true)]
async fn switching_chatroom_mid_load_discards_page() {
    let mut store = store_with_messages(1);
    let other = store.create_chatroom(Some("Other"));
    store.add_message(&other.id, NewMessage::ai("hi"));
    let first = store.state().chatrooms[1].clone();

    let mut pager = HistoryPager::default();
    pager.enter(&first);
    let pager = parking_lot::Mutex::new(pager);
    let source = SimulatedHistory::default();

    let (outcome, ()) = tokio::join!(load_older(&pager, &source), async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let state = store.state();
        pager.lock().enter(state.chatroom(&other.id).unwrap());
    });

    assert_eq!(outcome, Some(LoadOutcome::Stale));
    let pager = pager.lock();
    assert_eq!(pager.chatroom_id(), Some(other.id));
    assert!(pager.older_messages().is_empty());
    assert_eq!(pager.state(), PagerState::Idle);
    assert!(pager.has_more());
}
