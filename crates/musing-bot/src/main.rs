//! Musing Bot Binary
//!
//! Runs the thought journal bot against the Telegram Bot API.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use musing_core::{FlowOrchestrator, MusingConfig, SessionStore, SqliteStore, Transport};
use musing_bot::dispatch::Dispatcher;
use musing_bot::telegram::TelegramClient;

/// How often idle sessions are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("musing_bot=info,musing_core=info")),
        )
        .init();

    let config = MusingConfig::load()?;
    let token = config.token()?;

    let store = SqliteStore::open(&config.storage.database_path)?;
    tracing::info!("Using database {:?}", config.storage.database_path);

    let sessions = Arc::new(SessionStore::new(config.flow.idle_timeout()));
    let flow = Arc::new(FlowOrchestrator::new(
        Arc::new(store),
        sessions,
        config.flow.clone(),
    ));

    let client = TelegramClient::new(&config.telegram, token)?;
    let transport: Arc<dyn Transport> = Arc::new(client.clone());
    let dispatcher = Dispatcher::new(Arc::clone(&flow), transport);

    let sweeper = {
        let flow = Arc::clone(&flow);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                let evicted = flow.sweep_sessions().await;
                if evicted > 0 {
                    tracing::info!(evicted, "Swept idle sessions");
                }
            }
        })
    };

    tracing::info!("Bot started, polling for updates");
    let retry_delay = Duration::from_secs(config.telegram.retry_delay_secs);
    tokio::select! {
        _ = musing_bot::poll(&client, &dispatcher, retry_delay) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    sweeper.abort();
    Ok(())
}
