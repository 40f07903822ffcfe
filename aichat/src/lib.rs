//! `aichat`: chat client core with a simulated AI assistant.
//!
//! The [`store`] holds all session and chat state and mirrors it to durable
//! storage. [`history`] simulates infinite scroll over older messages.
//! [`login`] and [`conversation`] drive the user-facing flows against the
//! collaborators in [`services`].

pub mod command;
pub mod config;
pub mod conversation;
pub mod history;
pub mod login;
pub mod notify;
pub mod services;
pub mod store;
