//! Musing Bot - Telegram front end for the musing thought journal
//!
//! Long-polls the Bot API, decodes updates into conversation events, and
//! hands them to per-user workers running the flow orchestrator.

pub mod api;
pub mod dispatch;
pub mod telegram;

use std::time::Duration;

use crate::api::Incoming;
use crate::dispatch::Dispatcher;
use crate::telegram::TelegramClient;

/// Toast shown for buttons the bot can no longer act on
pub const STALE_BUTTON: &str = "Эта кнопка больше не работает.";

/// Poll for updates until the task is cancelled
pub async fn poll(client: &TelegramClient, dispatcher: &Dispatcher, retry_delay: Duration) {
    let mut offset = 0;
    loop {
        let updates = match client.get_updates(offset).await {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "getUpdates failed, retrying in {:?}", retry_delay);
                tokio::time::sleep(retry_delay).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            route(client, dispatcher, Incoming::from(update)).await;
        }
    }
}

async fn route(client: &TelegramClient, dispatcher: &Dispatcher, incoming: Incoming) {
    match incoming {
        Incoming::Message(event) => dispatcher.dispatch(event).await,
        Incoming::Button { event, query_id } => {
            acknowledge(client, query_id, None);
            dispatcher.dispatch(event).await;
        }
        Incoming::Rejected { query_id, reason } => {
            tracing::warn!(%reason, "Ignoring button press");
            acknowledge(client, query_id, Some(STALE_BUTTON));
        }
        Incoming::Unsupported => tracing::debug!("Skipping unsupported update"),
    }
}

/// Answer a callback query without holding up the poll loop
fn acknowledge(client: &TelegramClient, query_id: String, text: Option<&'static str>) {
    let client = client.clone();
    tokio::spawn(async move {
        if let Err(err) = client.answer_callback(&query_id, text).await {
            tracing::debug!(error = %err, "answerCallbackQuery failed");
        }
    });
}
