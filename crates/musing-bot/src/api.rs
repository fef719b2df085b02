//! Bot API wire types
//!
//! Only the fields the bot reads are modelled; serde ignores the rest.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use musing_core::render::{InlineKeyboard, Markup, TextFormat};
use musing_core::{Callback, ChatId, Inbound, MessageRef, UserId};

/// Callback data longer than this is rejected by the API
pub const MAX_CALLBACK_DATA: usize = 64;

/// Envelope around every API result
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub error_code: Option<i64>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub photo: Vec<PhotoSize>,
}

impl Message {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.id,
            message_id: self.message_id,
        }
    }

    fn sender(&self) -> UserId {
        UserId(self.from.as_ref().map_or(self.chat.id, |user| user.id))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

/// An update as the bot sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A typed message or photo
    Message(Inbound),
    /// A decoded button press; `query_id` must be answered
    Button { event: Inbound, query_id: String },
    /// A button press that cannot be acted on
    Rejected { query_id: String, reason: String },
    /// Anything else (stickers, edits, joins, ...)
    Unsupported,
}

impl From<Update> for Incoming {
    fn from(update: Update) -> Self {
        if let Some(query) = update.callback_query {
            return decode_callback_query(query);
        }
        match update.message {
            Some(message) => decode_message(message),
            None => Incoming::Unsupported,
        }
    }
}

fn decode_message(message: Message) -> Incoming {
    let user = message.sender();
    let chat = ChatId(message.chat.id);

    if let Some(largest) = message
        .photo
        .iter()
        .max_by_key(|size| u64::from(size.width) * u64::from(size.height))
    {
        let caption = message.caption.clone().unwrap_or_default();
        return Incoming::Message(
            Inbound::photo(user, caption, largest.file_id.clone()).in_chat(chat),
        );
    }

    match message.text {
        Some(text) => Incoming::Message(Inbound::text(user, text).in_chat(chat)),
        None => Incoming::Unsupported,
    }
}

fn decode_callback_query(query: CallbackQuery) -> Incoming {
    let (Some(data), Some(message)) = (query.data.as_deref(), query.message.as_ref()) else {
        return Incoming::Rejected {
            query_id: query.id,
            reason: "button press without data or message".to_string(),
        };
    };

    match data.parse::<Callback>() {
        Ok(callback) => Incoming::Button {
            event: Inbound::button(UserId(query.from.id), callback, message.message_ref()),
            query_id: query.id,
        },
        Err(err) => Incoming::Rejected {
            query_id: query.id,
            reason: err.to_string(),
        },
    }
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct EditMessageText<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct AnswerCallbackQuery<'a> {
    pub callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

pub fn parse_mode(format: TextFormat) -> Option<&'static str> {
    match format {
        TextFormat::Plain => None,
        TextFormat::Markdown => Some("Markdown"),
    }
}

/// `reply_markup` JSON for a menu or inline keyboard
pub fn markup_json(markup: &Markup) -> Value {
    match markup {
        Markup::Menu(menu) => {
            let keyboard: Vec<Vec<Value>> = menu
                .rows()
                .into_iter()
                .map(|row| row.into_iter().map(|label| json!({ "text": label })).collect())
                .collect();
            json!({
                "keyboard": keyboard,
                "resize_keyboard": true,
                "one_time_keyboard": menu.one_time(),
            })
        }
        Markup::Inline(keyboard) => inline_json(keyboard),
    }
}

pub fn inline_json(keyboard: &InlineKeyboard) -> Value {
    let rows: Vec<Vec<Value>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|button| {
                    let data = button.callback.encode();
                    if data.len() > MAX_CALLBACK_DATA {
                        tracing::warn!(len = data.len(), "Callback data exceeds API limit");
                    }
                    json!({ "text": button.label, "callback_data": data })
                })
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use musing_core::render::{tag_picker, Menu};
    use musing_core::{Tag, TagId, TagUsage, ThoughtId};

    #[test]
    fn test_main_menu_json() {
        let value = markup_json(&Markup::Menu(Menu::Main));
        assert_eq!(value["resize_keyboard"], true);
        assert_eq!(value["keyboard"][0][0]["text"], "Посмотреть мысли");
        assert_eq!(value["keyboard"][0][1]["text"], "Добавить мысль");
    }

    #[test]
    fn test_inline_json() {
        let usage = [TagUsage {
            tag: Tag {
                id: TagId(3),
                name: "work".into(),
            },
            count: 2,
        }];
        let value = inline_json(&tag_picker(ThoughtId(9), &usage));
        assert_eq!(value["inline_keyboard"][0][0]["text"], "work (2)");
        assert_eq!(value["inline_keyboard"][0][0]["callback_data"], "tag:9:3");
        assert_eq!(value["inline_keyboard"][1][0]["callback_data"], "custom_tag:9");
    }

    #[test]
    fn test_send_message_omits_empty_fields() {
        let body = serde_json::to_value(SendMessage {
            chat_id: 1,
            text: "hi",
            parse_mode: parse_mode(TextFormat::Plain),
            reply_markup: None,
        })
        .unwrap();
        assert_eq!(body, json!({ "chat_id": 1, "text": "hi" }));
    }

    #[test]
    fn test_error_envelope() {
        let response: ApiResponse<Message> = serde_json::from_str(
            r#"{"ok":false,"error_code":400,"description":"Bad Request: message is not modified"}"#,
        )
        .unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.error_code, Some(400));
    }
}
