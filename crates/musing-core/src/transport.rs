//! Transport boundary
//!
//! The chat transport delivers [`Inbound`] events and accepts rendered
//! [`Reply`] values. Button payloads are decoded into [`Callback`] before an
//! event is built, so malformed payloads never reach the conversation flow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::callback::Callback;
use crate::error::Result;
use crate::model::{ChatId, UserId};
use crate::render::{InlineKeyboard, Markup, Reply, TextFormat};

/// Identifies a message already delivered to a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// One inbound event from a user.
///
/// Conversation state is keyed by `user`; replies go to `chat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub user: UserId,
    pub chat: ChatId,
    pub kind: EventKind,
}

/// What the user did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A typed message. `attachment` carries a transport file reference for photos.
    Text {
        text: String,
        attachment: Option<String>,
    },
    /// An inline button press on `message`
    ButtonPress {
        callback: Callback,
        message: MessageRef,
    },
}

impl Inbound {
    /// Typed text in the user's private chat
    pub fn text(user: UserId, text: impl Into<String>) -> Self {
        Self {
            user,
            chat: ChatId(user.0),
            kind: EventKind::Text {
                text: text.into(),
                attachment: None,
            },
        }
    }

    /// A photo in the user's private chat, captioned with `text`
    pub fn photo(user: UserId, text: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            user,
            chat: ChatId(user.0),
            kind: EventKind::Text {
                text: text.into(),
                attachment: Some(file.into()),
            },
        }
    }

    /// A button press; replies go to the chat holding `message`
    pub fn button(user: UserId, callback: Callback, message: MessageRef) -> Self {
        Self {
            user,
            chat: ChatId(message.chat_id),
            kind: EventKind::ButtonPress { callback, message },
        }
    }

    pub fn in_chat(mut self, chat: ChatId) -> Self {
        self.chat = chat;
        self
    }
}

/// Outbound side of a chat transport
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message to `chat`
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        markup: Option<&Markup>,
        format: TextFormat,
    ) -> Result<MessageRef>;

    /// Replace the text (and inline keyboard) of an existing message
    async fn edit_in_place(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        format: TextFormat,
    ) -> Result<()>;
}

/// Deliver replies in order. Stops at the first failure.
pub async fn deliver(transport: &dyn Transport, chat: ChatId, replies: &[Reply]) -> Result<()> {
    for reply in replies {
        match reply {
            Reply::Send {
                text,
                markup,
                format,
            } => {
                transport.send(chat, text, markup.as_ref(), *format).await?;
            }
            Reply::Edit {
                message,
                text,
                keyboard,
                format,
            } => {
                transport
                    .edit_in_place(*message, text, keyboard.as_ref(), *format)
                    .await?;
            }
        }
    }
    Ok(())
}
