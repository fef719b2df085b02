//! Per-user event dispatch
//!
//! Each active user gets a worker task fed by a bounded queue. Events from
//! one user are handled strictly in arrival order while different users
//! proceed concurrently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use musing_core::render::labels;
use musing_core::{deliver, FlowOrchestrator, Inbound, Markup, Menu, TextFormat, Transport, UserId};

/// Events a user may have queued before the poll loop waits
const QUEUE_DEPTH: usize = 32;

/// A worker with nothing to do for this long shuts down
const WORKER_IDLE: Duration = Duration::from_secs(300);

type Workers = Arc<Mutex<HashMap<UserId, mpsc::Sender<Inbound>>>>;

pub struct Dispatcher {
    flow: Arc<FlowOrchestrator>,
    transport: Arc<dyn Transport>,
    workers: Workers,
    idle: Duration,
}

impl Dispatcher {
    pub fn new(flow: Arc<FlowOrchestrator>, transport: Arc<dyn Transport>) -> Self {
        Self::with_idle(flow, transport, WORKER_IDLE)
    }

    /// Dispatcher whose workers exit after `idle` without events
    pub fn with_idle(
        flow: Arc<FlowOrchestrator>,
        transport: Arc<dyn Transport>,
        idle: Duration,
    ) -> Self {
        Self {
            flow,
            transport,
            workers: Arc::new(Mutex::new(HashMap::new())),
            idle,
        }
    }

    /// Queue an event on its user's worker
    pub async fn dispatch(&self, event: Inbound) {
        let user = event.user;
        let mut event = event;

        // A worker may retire between lookup and send; the event comes back
        // and goes to a fresh worker.
        for _ in 0..2 {
            let sender = self.sender(user);
            match sender.send(event).await {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    tracing::debug!(user = %user, "Worker retired, respawning");
                    self.forget(user, &sender);
                    event = returned;
                }
            }
        }
        tracing::warn!(user = %user, "Dropped event, no worker accepted it");
    }

    /// Users with a live worker
    pub fn active_workers(&self) -> usize {
        self.workers.lock().map(|w| w.len()).unwrap_or_default()
    }

    fn sender(&self, user: UserId) -> mpsc::Sender<Inbound> {
        let mut workers = match self.workers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        workers
            .entry(user)
            .or_insert_with(|| self.spawn_worker(user))
            .clone()
    }

    fn forget(&self, user: UserId, sender: &mpsc::Sender<Inbound>) {
        if let Ok(mut workers) = self.workers.lock() {
            if workers.get(&user).is_some_and(|s| s.same_channel(sender)) {
                workers.remove(&user);
            }
        }
    }

    fn spawn_worker(&self, user: UserId) -> mpsc::Sender<Inbound> {
        let (tx, mut rx) = mpsc::channel::<Inbound>(QUEUE_DEPTH);
        let flow = Arc::clone(&self.flow);
        let transport = Arc::clone(&self.transport);
        let workers = Arc::clone(&self.workers);
        let idle = self.idle;
        let own = tx.clone();

        tokio::spawn(async move {
            tracing::debug!(user = %user, "Worker started");
            loop {
                let event = match tokio::time::timeout(idle, rx.recv()).await {
                    Ok(Some(event)) => event,
                    Ok(None) => break,
                    Err(_) => {
                        // Retire under the map lock so no sender is handed out
                        // for a queue nobody drains.
                        let Ok(mut map) = workers.lock() else { break };
                        match rx.try_recv() {
                            Ok(event) => event,
                            Err(_) => {
                                if map.get(&user).is_some_and(|s| s.same_channel(&own)) {
                                    map.remove(&user);
                                }
                                break;
                            }
                        }
                    }
                };

                let chat = event.chat;
                let replies = flow.handle(event).await;
                if let Err(err) = deliver(transport.as_ref(), chat, &replies).await {
                    tracing::warn!(user = %user, chat = %chat, error = %err, "Failed to deliver replies");
                    // Plain text never fails to parse
                    let notice = transport
                        .send(chat, labels::FAILED, Some(&Markup::Menu(Menu::Main)), TextFormat::Plain)
                        .await;
                    if let Err(err) = notice {
                        tracing::warn!(user = %user, chat = %chat, error = %err, "Failed to send failure notice");
                    }
                }
            }
            tracing::debug!(user = %user, "Worker stopped");
        });

        tx
    }
}
