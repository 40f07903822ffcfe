//! Deterministic generator for synthetic history pages.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use aichat_proto::message::{Message, MessageId, NewMessage, Sender};

use super::PageRequest;

/// Builds page `request.page` of synthetic history, oldest message first.
///
/// Message `i` of page `p` sits `p * page_size + (page_size - i)` minutes
/// before the request's anchor. The sender alternates so that every message
/// whose global index is divisible by three comes from the user. Ids are
/// derived from the chatroom id, page and index, so the same request always
/// yields the same page.
#[must_use]
pub fn synthesize_page(request: &PageRequest, page_size: usize) -> Vec<Message> {
    let namespace = request.chatroom_id.as_uuid();
    (0..page_size)
        .map(|i| {
            let global = request.page * page_size + i;
            let minutes_back = request.page * page_size + (page_size - i);
            let sender = if global % 3 == 0 {
                Sender::User
            } else {
                Sender::Ai
            };
            let content = match sender {
                Sender::User => format!("Earlier question #{}", global + 1),
                Sender::Ai => format!("Earlier answer #{}", global + 1),
            };
            let timestamp = i64::try_from(minutes_back)
                .ok()
                .and_then(Duration::try_minutes)
                .and_then(|back| request.anchor.checked_sub_signed(back))
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let id = Uuid::new_v5(
                namespace,
                format!("history/{}/{i}", request.page).as_bytes(),
            );
            NewMessage::new(sender, content)
                .at(timestamp)
                .into_message(MessageId::from_uuid(id))
        })
        .collect()
}
