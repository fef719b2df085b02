//! Bot API client over reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use musing_core::error::TransportError;
use musing_core::render::{InlineKeyboard, Markup, TextFormat};
use musing_core::{ChatId, MessageRef, Result, TelegramConfig, Transport};

use crate::api::{
    self, AnswerCallbackQuery, ApiResponse, EditMessageText, GetUpdates, Message, SendMessage,
    Update,
};

/// Editing a message to its current content is reported as an error
const NOT_MODIFIED: &str = "message is not modified";

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    poll_timeout: u64,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, token: &str) -> std::result::Result<Self, TransportError> {
        // Long polls hold the request open for poll_timeout seconds
        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()
            .map_err(|e| TransportError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_url.trim_end_matches('/'), token),
            poll_timeout: config.poll_timeout_secs,
        })
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> std::result::Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(body)
            .send()
            .await
            // without_url keeps the token out of logs
            .map_err(|e| TransportError::RequestFailed(e.without_url().to_string()))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.without_url().to_string()))?;

        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| TransportError::Decode(format!("{method}: missing result")))
        } else {
            Err(TransportError::Api {
                code: envelope.error_code.unwrap_or_default(),
                description: envelope.description.unwrap_or_default(),
            })
        }
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64) -> std::result::Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.poll_timeout,
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    /// Dismiss the loading indicator on a pressed button
    pub async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<&str>,
    ) -> std::result::Result<(), TransportError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQuery {
                    callback_query_id: query_id,
                    text,
                },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        markup: Option<&Markup>,
        format: TextFormat,
    ) -> Result<MessageRef> {
        let message: Message = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id: chat.0,
                    text,
                    parse_mode: api::parse_mode(format),
                    reply_markup: markup.map(api::markup_json),
                },
            )
            .await?;
        Ok(message.message_ref())
    }

    async fn edit_in_place(
        &self,
        message: MessageRef,
        text: &str,
        keyboard: Option<&InlineKeyboard>,
        format: TextFormat,
    ) -> Result<()> {
        let result: std::result::Result<serde_json::Value, TransportError> = self
            .call(
                "editMessageText",
                &EditMessageText {
                    chat_id: message.chat_id,
                    message_id: message.message_id,
                    text,
                    parse_mode: api::parse_mode(format),
                    reply_markup: keyboard.map(api::inline_json),
                },
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(TransportError::Api { description, .. }) if description.contains(NOT_MODIFIED) => {
                tracing::debug!(message_id = message.message_id, "Edit left message unchanged");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
