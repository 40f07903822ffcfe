//! Message types exchanged inside a chatroom.
//!
//! A [`Message`] is immutable once created: chatrooms only ever append them.
//! Callers build a [`NewMessage`] (everything except the identity) and the
//! store assigns the [`MessageId`] when the message is appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a message, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new time-ordered message identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `MessageId` from an existing UUID.
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

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a message. Serialized as `"user"` or `"ai"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The signed-in human.
    User,
    /// The simulated assistant.
    Ai,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Ai => write!(f, "ai"),
        }
    }
}

/// A message stored in a chatroom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier within the owning chatroom.
    pub id: MessageId,
    /// Text content. May be empty when an image is attached.
    pub content: String,
    /// Author of the message.
    pub sender: Sender,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Optional image reference (data URL or path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A message that has not been assigned an identity yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Text content.
    pub content: String,
    /// Author of the message.
    pub sender: Sender,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Optional image reference.
    pub image: Option<String>,
}

impl NewMessage {
    /// A message from `sender` stamped with the current time.
    pub fn new(sender: Sender, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            image: None,
        }
    }

    /// A user-authored message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content)
    }

    /// An AI-authored message stamped with the current time.
    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Sender::Ai, content)
    }

    /// Replaces the timestamp.
    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attaches an image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Assigns an identity, producing the stored [`Message`].
    #[must_use]
    pub fn into_message(self, id: MessageId) -> Message {
        Message {
            id,
            content: self.content,
            sender: self.sender,
            timestamp: self.timestamp,
            image: self.image,
        }
    }
}
