//! Infinite-scroll simulation over a chatroom's message list.
//!
//! [`HistoryPager`] is the per-view state machine. It owns the synthetic
//! "older" messages loaded so far; the chatroom's real messages stay in the
//! store and are never modified.
//!
//! ```text
//!   enter(C) ──► Idle ──request_load──► Loading ──complete──► Idle
//!                 ▲                                  │
//!                 └──────────────────────────────────┤ page limit reached
//!                                                    ▼
//!                                                Exhausted
//! ```
//!
//! Loads are split into [`HistoryPager::request_load`], which hands out a
//! [`PageRequest`], and [`HistoryPager::complete`], which merges the page.
//! The request carries the chatroom id and view generation captured when it
//! was issued; a completion for a view that has since been re-entered is
//! dropped.

pub mod source;
pub mod synthetic;

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use aichat_proto::chatroom::{Chatroom, ChatroomId};
use aichat_proto::message::{Message, MessageId};

pub use source::{HistorySource, SimulatedHistory, load_older, load_on_scroll};
pub use synthetic::synthesize_page;

/// Number of synthetic messages per page.
pub const PAGE_SIZE: usize = 20;

/// Number of pages available before history is exhausted.
pub const MAX_PAGES: usize = 10;

/// Simulated latency of one page load.
pub const LOAD_DELAY: Duration = Duration::from_secs(1);

/// Paging parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerConfig {
    /// Messages per page.
    pub page_size: usize,
    /// Pages before the view is exhausted.
    pub max_pages: usize,
    /// Simulated latency per page.
    pub load_delay: Duration,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            max_pages: MAX_PAGES,
            load_delay: LOAD_DELAY,
        }
    }
}

/// Load state of the current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    /// No load in flight.
    Idle,
    /// A page has been requested and not yet completed.
    Loading,
    /// Every page has been loaded.
    Exhausted,
}

/// A page load handed out by [`HistoryPager::request_load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Chatroom the page belongs to.
    pub chatroom_id: ChatroomId,
    /// Zero-based page index; page 0 is the newest synthetic page.
    pub page: usize,
    /// Timestamp synthetic messages count back from.
    pub anchor: DateTime<Utc>,
    generation: u64,
}

/// Result of [`HistoryPager::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was merged; more pages remain.
    Loaded {
        /// Messages actually added after dropping duplicates.
        added: usize,
    },
    /// The page was merged and it was the last one.
    Exhausted {
        /// Messages actually added after dropping duplicates.
        added: usize,
    },
    /// The request no longer matches the view and was discarded.
    Stale,
}

/// Per-view pagination state machine.
#[derive(Debug, Clone)]
pub struct HistoryPager {
    config: PagerConfig,
    chatroom_id: Option<ChatroomId>,
    generation: u64,
    state: PagerState,
    has_more: bool,
    pages_loaded: usize,
    anchor: DateTime<Utc>,
    older: Vec<Message>,
    seen: HashSet<MessageId>,
}

impl Default for HistoryPager {
    fn default() -> Self {
        Self::new(PagerConfig::default())
    }
}

impl HistoryPager {
    /// Creates a pager not attached to any chatroom.
    #[must_use]
    pub fn new(config: PagerConfig) -> Self {
        Self {
            config,
            chatroom_id: None,
            generation: 0,
            state: PagerState::Idle,
            has_more: false,
            pages_loaded: 0,
            anchor: Utc::now(),
            older: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Paging parameters.
    #[must_use]
    pub const fn config(&self) -> &PagerConfig {
        &self.config
    }

    /// Attaches the pager to `chatroom`, discarding any loaded pages.
    ///
    /// History is offered only if the chatroom already has a real message;
    /// synthetic messages count back from the oldest one.
    pub fn enter(&mut self, chatroom: &Chatroom) {
        self.generation = self.generation.wrapping_add(1);
        self.chatroom_id = Some(chatroom.id);
        self.state = PagerState::Idle;
        self.pages_loaded = 0;
        self.older.clear();
        self.seen.clear();
        self.has_more = !chatroom.messages.is_empty() && self.config.max_pages > 0;
        self.anchor = chatroom
            .messages
            .first()
            .map_or_else(Utc::now, |m| m.timestamp);
        tracing::debug!(
            chatroom_id = %chatroom.id,
            has_more = self.has_more,
            "history view entered"
        );
    }

    /// Detaches from the current chatroom. In-flight requests become stale.
    pub fn leave(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.chatroom_id = None;
        self.state = PagerState::Idle;
        self.has_more = false;
        self.pages_loaded = 0;
        self.older.clear();
        self.seen.clear();
    }

    /// Starts a load if the view is idle and has more history.
    ///
    /// Returns `None` (and changes nothing) while loading, once exhausted,
    /// or when the chatroom offers no history.
    pub fn request_load(&mut self) -> Option<PageRequest> {
        let chatroom_id = self.chatroom_id?;
        if self.state != PagerState::Idle || !self.has_more {
            return None;
        }
        self.state = PagerState::Loading;
        tracing::debug!(chatroom_id = %chatroom_id, page = self.pages_loaded, "loading older messages");
        Some(PageRequest {
            chatroom_id,
            page: self.pages_loaded,
            anchor: self.anchor,
            generation: self.generation,
        })
    }

    /// Scroll hook: reaching the top (`offset_from_top == 0`) requests a load.
    pub fn on_scroll(&mut self, offset_from_top: usize) -> Option<PageRequest> {
        if offset_from_top == 0 {
            self.request_load()
        } else {
            None
        }
    }

    /// Merges a loaded page at the head of the older messages.
    ///
    /// Messages whose id is already present are dropped. A request from a
    /// previous view, or one that is not the load in flight, is discarded.
    pub fn complete(&mut self, request: &PageRequest, messages: Vec<Message>) -> LoadOutcome {
        if request.generation != self.generation
            || self.chatroom_id != Some(request.chatroom_id)
            || self.state != PagerState::Loading
            || request.page != self.pages_loaded
        {
            tracing::debug!(
                chatroom_id = %request.chatroom_id,
                page = request.page,
                "discarding stale history page"
            );
            return LoadOutcome::Stale;
        }

        let fresh: Vec<Message> = messages
            .into_iter()
            .filter(|m| self.seen.insert(m.id))
            .collect();
        let added = fresh.len();
        let mut merged = fresh;
        merged.append(&mut self.older);
        self.older = merged;

        self.pages_loaded += 1;
        if self.pages_loaded >= self.config.max_pages {
            self.state = PagerState::Exhausted;
            self.has_more = false;
            tracing::debug!(chatroom_id = %request.chatroom_id, "history exhausted");
            LoadOutcome::Exhausted { added }
        } else {
            self.state = PagerState::Idle;
            LoadOutcome::Loaded { added }
        }
    }

    /// Current load state.
    #[must_use]
    pub const fn state(&self) -> PagerState {
        self.state
    }

    /// Whether another page can be requested.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a page is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == PagerState::Loading
    }

    /// Number of pages merged so far.
    #[must_use]
    pub const fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// Chatroom the pager is attached to.
    #[must_use]
    pub const fn chatroom_id(&self) -> Option<ChatroomId> {
        self.chatroom_id
    }

    /// Synthetic messages loaded so far, oldest first.
    #[must_use]
    pub fn older_messages(&self) -> &[Message] {
        &self.older
    }

    /// Older synthetic messages followed by the chatroom's real messages.
    pub fn visible_messages<'a>(
        &'a self,
        real: &'a [Message],
    ) -> impl Iterator<Item = &'a Message> + 'a {
        self.older.iter().chain(real.iter())
    }
}
