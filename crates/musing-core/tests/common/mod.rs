//! Shared harness for conversation flow tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use musing_core::render::{InlineKeyboard, Markup, Reply, TextFormat};
use musing_core::{
    deliver, Callback, ChatId, FlowConfig, FlowOrchestrator, Inbound, MessageRef, Result,
    SessionStore, SqliteStore, Transport, UserId,
};

/// A message as the chat would show it
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Delivered {
    pub message: MessageRef,
    pub text: String,
    pub edited: bool,
}

/// Transport that records everything it is asked to deliver
#[derive(Default)]
pub struct RecordingTransport {
    log: Mutex<Vec<Delivered>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn delivered(&self) -> Vec<Delivered> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        _markup: Option<&Markup>,
        _format: TextFormat,
    ) -> Result<MessageRef> {
        let mut log = self.log.lock().unwrap();
        let message = MessageRef {
            chat_id: chat.0,
            message_id: log.len() as i64 + 1,
        };
        log.push(Delivered {
            message,
            text: text.to_string(),
            edited: false,
        });
        Ok(message)
    }

    async fn edit_in_place(
        &self,
        message: MessageRef,
        text: &str,
        _keyboard: Option<&InlineKeyboard>,
        _format: TextFormat,
    ) -> Result<()> {
        self.log.lock().unwrap().push(Delivered {
            message,
            text: text.to_string(),
            edited: true,
        });
        Ok(())
    }
}

/// Orchestrator over an in-memory store
pub struct Harness {
    pub flow: FlowOrchestrator,
    pub store: SqliteStore,
    pub transport: RecordingTransport,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_config(FlowConfig::default())
    }

    pub fn with_config(config: FlowConfig) -> Self {
        let store = SqliteStore::in_memory().unwrap();
        let sessions = Arc::new(SessionStore::new(config.idle_timeout()));
        let flow = FlowOrchestrator::new(Arc::new(store.clone()), sessions, config);
        Self {
            flow,
            store,
            transport: RecordingTransport::default(),
        }
    }

    /// Handle one event and deliver its replies
    pub async fn send(&self, event: Inbound) -> Vec<Reply> {
        let chat = event.chat;
        let replies = self.flow.handle(event).await;
        deliver(&self.transport, chat, &replies).await.unwrap();
        replies
    }

    pub async fn say(&self, user: UserId, text: &str) -> Vec<Reply> {
        self.send(Inbound::text(user, text)).await
    }

    pub async fn press(&self, user: UserId, callback: Callback) -> Vec<Reply> {
        self.send(Inbound::button(user, callback, message_ref(user)))
            .await
    }
}

/// The message a button press arrives on
pub fn message_ref(user: UserId) -> MessageRef {
    MessageRef {
        chat_id: user.0,
        message_id: 1000,
    }
}

/// First button whose payload matches
#[allow(dead_code)]
pub fn find_callback(reply: &Reply, predicate: impl Fn(&Callback) -> bool) -> Option<Callback> {
    reply
        .inline_keyboard()
        .and_then(|keyboard| keyboard.find(predicate))
        .map(|button| button.callback.clone())
}
