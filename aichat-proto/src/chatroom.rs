//! Chatroom type and title derivation.
//!
//! # Title rules
//!
//! A chatroom created without a title starts as [`DEFAULT_TITLE`]. When the
//! first message is appended, the title is derived from that message's content
//! (see [`derive_title`]). Later messages never touch the title. A title given
//! explicitly at creation time is kept as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::{Message, MessageId};

/// Maximum number of characters kept when deriving a title from a message.
pub const TITLE_MAX_CHARS: usize = 50;

/// Title given to chatrooms created without one.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Unique identifier for a chatroom (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatroomId(Uuid);

impl ChatroomId {
    /// Creates a new time-ordered chatroom identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `ChatroomId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ChatroomId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatroomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named conversation holding messages in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chatroom {
    /// Unique identifier.
    pub id: ChatroomId,
    /// Display title.
    pub title: String,
    /// Messages in insertion (chronological) order.
    pub messages: Vec<Message>,
    /// When the chatroom was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the most recently appended message.
    pub last_message: Option<DateTime<Utc>>,
    /// Whether the title was given explicitly and must not be derived.
    #[serde(default)]
    pub title_locked: bool,
}

impl Chatroom {
    /// Creates an empty chatroom stamped with the current time.
    ///
    /// A `Some` title that is blank after trimming counts as no title.
    #[must_use]
    pub fn new(title: Option<&str>) -> Self {
        Self::new_at(title, Utc::now())
    }

    /// Creates an empty chatroom with an explicit creation time.
    #[must_use]
    pub fn new_at(title: Option<&str>, created_at: DateTime<Utc>) -> Self {
        let explicit = title.map(str::trim).filter(|t| !t.is_empty());
        Self {
            id: ChatroomId::new(),
            title: explicit.unwrap_or(DEFAULT_TITLE).to_string(),
            messages: Vec::new(),
            created_at,
            last_message: None,
            title_locked: explicit.is_some(),
        }
    }

    /// Returns `true` if the chatroom holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns `true` if a message with `id` is already present.
    #[must_use]
    pub fn contains_message(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| m.id == *id)
    }

    /// Appends a message, updating `last_message` and, for the first
    /// message, the title.
    ///
    /// Returns `false` without changing anything if a message with the same
    /// id is already present.
    pub fn push_message(&mut self, message: Message) -> bool {
        if self.contains_message(&message.id) {
            return false;
        }
        if self.messages.is_empty()
            && !self.title_locked
            && let Some(title) = derive_title(&message.content)
        {
            self.title = title;
        }
        self.last_message = Some(message.timestamp);
        self.messages.push(message);
        true
    }

    /// Short preview of the last message, for list views.
    #[must_use]
    pub fn preview(&self) -> Option<String> {
        self.messages.last().and_then(|m| derive_title(&m.content))
    }
}

/// Derives a chatroom title from message content.
///
/// Content longer than [`TITLE_MAX_CHARS`] characters is cut to that many
/// characters and suffixed with `"..."`. Returns `None` for blank content
/// (e.g. an image-only message).
#[must_use]
pub fn derive_title(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        return None;
    }
    if content.chars().count() > TITLE_MAX_CHARS {
        let cut: String = content.chars().take(TITLE_MAX_CHARS).collect();
        Some(format!("{cut}..."))
    } else {
        Some(content.to_string())
    }
}
