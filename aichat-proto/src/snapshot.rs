//! Versioned on-disk snapshot of the persisted store state.
//!
//! The snapshot is a single JSON document holding the user session, the
//! chatroom collection, the active chatroom id and the theme. Timestamps are
//! RFC 3339 strings on disk and [`chrono::DateTime<Utc>`] values in memory.
//!
//! [`decode`] fails closed: anything that does not parse, carries an unknown
//! version, or breaks a collection invariant is an error, never a partially
//! valid snapshot.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::chatroom::{Chatroom, ChatroomId};
use crate::message::MessageId;
use crate::theme::Theme;
use crate::user::User;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Name of the durable blob holding the snapshot.
pub const STORAGE_KEY: &str = "aichat-storage";

/// Error type for snapshot encode/decode operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// The document is not valid JSON or does not match the schema.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The document was written by an unknown format version.
    #[error("unsupported snapshot version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Version this build understands.
        supported: u32,
    },
    /// Two chatrooms share an identity.
    #[error("duplicate chatroom id {0}")]
    DuplicateChatroom(ChatroomId),
    /// Two messages in one chatroom share an identity.
    #[error("duplicate message id {message} in chatroom {chatroom}")]
    DuplicateMessage {
        /// Chatroom holding the duplicate.
        chatroom: ChatroomId,
        /// The repeated message id.
        message: MessageId,
    },
    /// The active chatroom id does not reference a chatroom.
    #[error("active chatroom {0} does not exist")]
    DanglingActive(ChatroomId),
}

/// The persisted subset of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version, always [`SNAPSHOT_VERSION`] when written by this build.
    pub version: u32,
    /// Signed-in user, if any.
    pub user: Option<User>,
    /// Chatrooms, most recently created first.
    pub chatrooms: Vec<Chatroom>,
    /// Currently selected chatroom.
    pub active_chatroom_id: Option<ChatroomId>,
    /// Color theme.
    #[serde(default)]
    pub theme: Theme,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            user: None,
            chatrooms: Vec::new(),
            active_chatroom_id: None,
            theme: Theme::default(),
        }
    }
}

impl Snapshot {
    /// Checks the collection invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] for an unknown version, duplicate chatroom
    /// or message ids, or an active id that references no chatroom.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }

        let mut rooms = HashSet::with_capacity(self.chatrooms.len());
        for room in &self.chatrooms {
            if !rooms.insert(room.id) {
                return Err(SnapshotError::DuplicateChatroom(room.id));
            }
            let mut messages = HashSet::with_capacity(room.messages.len());
            for msg in &room.messages {
                if !messages.insert(msg.id) {
                    return Err(SnapshotError::DuplicateMessage {
                        chatroom: room.id,
                        message: msg.id,
                    });
                }
            }
        }

        if let Some(active) = self.active_chatroom_id
            && !rooms.contains(&active)
        {
            return Err(SnapshotError::DanglingActive(active));
        }
        Ok(())
    }
}

/// Only the version field, read before the full document so that a future
/// format with a different shape reports a version error, not a schema one.
#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

/// Encodes a snapshot as JSON text.
///
/// # Errors
///
/// Returns `SnapshotError::Serialization` if serialization fails.
pub fn encode(snapshot: &Snapshot) -> Result<String, SnapshotError> {
    serde_json::to_string(snapshot).map_err(|e| SnapshotError::Serialization(e.to_string()))
}

/// Decodes and validates a snapshot from JSON text.
///
/// # Errors
///
/// Returns [`SnapshotError`] if the text does not parse, the version is not
/// [`SNAPSHOT_VERSION`], or [`Snapshot::validate`] fails.
pub fn decode(text: &str) -> Result<Snapshot, SnapshotError> {
    let header: VersionHeader =
        serde_json::from_str(text).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
    if header.version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: header.version,
            supported: SNAPSHOT_VERSION,
        });
    }

    let snapshot: Snapshot =
        serde_json::from_str(text).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
    snapshot.validate()?;
    Ok(snapshot)
}
