//! Data model and persisted snapshot format for `aichat`.

pub mod chatroom;
pub mod message;
pub mod snapshot;
pub mod theme;
pub mod user;
