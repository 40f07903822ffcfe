//! One user turn: append the prompt, wait for the assistant, append the reply.

use aichat_proto::chatroom::ChatroomId;
use aichat_proto::message::{Message, MessageId, NewMessage};

use crate::notify::Notifier;
use crate::services::responder::Responder;
use crate::store::{Action, SharedStore, SnapshotStorage};

/// Errors returned by [`send_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// Nothing to send: blank text and no image.
    #[error("message is empty")]
    Empty,
}

/// What a completed turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Chatroom the turn was sent to.
    pub chatroom_id: ChatroomId,
    /// The stored user message.
    pub prompt: Message,
    /// The stored reply, or `None` if the chatroom was deleted while the
    /// assistant was answering.
    pub reply: Option<Message>,
}

/// Sends `text` (and optionally an image) to the active chatroom and waits
/// for the assistant's reply.
///
/// A chatroom is created if none is active. The reply goes to the chatroom
/// the prompt was sent to, even if the user switched away in the meantime.
///
/// # Errors
///
/// Returns [`SendError::Empty`] if `text` is blank and there is no image.
pub async fn send_message<S, R>(
    store: &SharedStore<S>,
    responder: &R,
    notifier: &Notifier,
    text: &str,
    image: Option<&str>,
) -> Result<Exchange, SendError>
where
    S: SnapshotStorage,
    R: Responder,
{
    let text = text.trim();
    let image = image.map(str::trim).filter(|i| !i.is_empty());
    if text.is_empty() && image.is_none() {
        return Err(SendError::Empty);
    }

    let (chatroom_id, prompt) = {
        let mut store = store.lock();
        let active = store.state().active_chatroom().map(|c| c.id);
        let chatroom_id = match active {
            Some(id) => id,
            None => {
                notifier.info("Started a new chat");
                store.create_chatroom(None).id
            }
        };
        let mut message = NewMessage::user(text);
        if let Some(image) = image {
            message = message.with_image(image);
        }
        let prompt = message.into_message(MessageId::new());
        store.dispatch(Action::AddMessage {
            chatroom_id,
            message: prompt.clone(),
        });
        store.set_typing(true);
        (chatroom_id, prompt)
    };

    let answer = responder.respond(text, image).await;

    let reply = {
        let mut store = store.lock();
        let reply = store.add_message(&chatroom_id, NewMessage::ai(answer));
        store.set_typing(false);
        reply
    };
    if reply.is_none() {
        tracing::debug!(chatroom_id = %chatroom_id, "reply dropped: chatroom deleted");
    }

    Ok(Exchange {
        chatroom_id,
        prompt,
        reply,
    })
}
