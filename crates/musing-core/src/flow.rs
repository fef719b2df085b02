//! Flow orchestrator
//!
//! Routes each inbound event through the dispatch table, runs the store
//! calls the transition needs, and renders the replies.

use std::sync::Arc;

use chrono::Utc;

use crate::config::FlowConfig;
use crate::conversation::{Input, Phase, SessionStore, Transition};
use crate::error::{ErrorKind, MusingError, Result, StoreError};
use crate::model::{ThoughtId, UserId};
use crate::ranker::TagRanker;
use crate::render::{self, labels, ListScope, Menu, Reply};
use crate::store::RecordStore;
use crate::transport::Inbound;

/// Wires inbound events to state transitions and store calls
pub struct FlowOrchestrator {
    store: Arc<dyn RecordStore>,
    sessions: Arc<SessionStore>,
    config: FlowConfig,
}

impl FlowOrchestrator {
    pub fn new(store: Arc<dyn RecordStore>, sessions: Arc<SessionStore>, config: FlowConfig) -> Self {
        Self {
            store,
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Handle one event to completion and return the replies to deliver.
    ///
    /// The user's session stays locked for the whole call.
    pub async fn handle(&self, event: Inbound) -> Vec<Reply> {
        let user = event.user;
        let mut session = self.sessions.lock(user).await;

        if session.touch(Utc::now(), self.sessions.idle_timeout()) {
            tracing::info!(user = %user, "Reset abandoned flow after inactivity");
        }

        let current = session.phase;
        let transition = Transition::resolve(&current, Input::decode(event.kind));
        let next = transition.next_phase(&current);
        let name = transition.name();
        tracing::debug!(user = %user, phase = %current, transition = name, "Dispatching event");

        match self.execute(user, transition).await {
            Ok(replies) => {
                if next != current {
                    tracing::debug!(user = %user, from = %current, to = %next, "Phase changed");
                }
                session.phase = next;
                replies
            }
            Err(err) => {
                let (phase, replies) = recover(&current, &err);
                tracing::warn!(user = %user, transition = name, error = %err, "Transition failed");
                session.phase = phase;
                replies
            }
        }
    }

    /// Drop idle sessions; returns how many were removed
    pub async fn sweep_sessions(&self) -> usize {
        self.sessions.evict_idle(Utc::now()).await
    }

    async fn execute(&self, user: UserId, transition: Transition) -> Result<Vec<Reply>> {
        match transition {
            Transition::Greet => Ok(vec![Reply::with_menu(labels::GREETING, Menu::Main)]),

            Transition::BeginThought => {
                Ok(vec![Reply::with_menu(labels::ASK_THOUGHT, Menu::Cancel)])
            }

            Transition::ShowList {
                scope,
                page,
                message,
            } => {
                let view = self.list_page(&scope, page).await?;
                Ok(vec![match message {
                    Some(message) => view.into_edit(message),
                    None => view.into_send(),
                }])
            }

            Transition::Cancel => Ok(vec![Reply::with_menu(labels::CANCELLED, Menu::Main)]),

            Transition::SaveThought { text, attachment } => {
                let thought_id = self
                    .store
                    .create_thought(user, &text, attachment.as_deref())
                    .await?;
                tracing::info!(user = %user, thought = %thought_id, "Saved thought");

                let top = TagRanker::new(self.store.as_ref(), self.config.top_tags)
                    .top()
                    .await?;
                Ok(vec![Reply::with_keyboard(
                    labels::SAVED_PICK_TAG,
                    render::tag_picker(thought_id, &top),
                )])
            }

            Transition::AssignTag {
                thought_id,
                tag_id,
                message,
            } => {
                self.store.set_thought_tag(thought_id, tag_id).await?;
                tracing::info!(thought = %thought_id, tag = %tag_id, "Tagged thought");
                Ok(vec![
                    Reply::edit(message, labels::TAG_ASSIGNED),
                    Reply::with_menu(labels::WHAT_NEXT, Menu::Main),
                ])
            }

            Transition::RequestCustomTag { thought_id } => {
                self.require_thought(thought_id).await?;
                Ok(vec![Reply::with_menu(labels::ASK_CUSTOM_TAG, Menu::Cancel)])
            }

            Transition::SaveCustomTag { thought_id, name } => {
                let name = name.trim().trim_start_matches('#');
                let tag_id = self.store.create_tag(name).await?;
                self.store.set_thought_tag(thought_id, tag_id).await?;
                tracing::info!(thought = %thought_id, tag = %tag_id, "Tagged thought with custom tag");
                Ok(vec![
                    Reply::text(labels::TAG_ASSIGNED),
                    Reply::with_menu(labels::WHAT_NEXT, Menu::Main),
                ])
            }

            Transition::RequestEdit { thought_id } => {
                self.require_thought(thought_id).await?;
                Ok(vec![Reply::with_menu(labels::ASK_EDIT_TEXT, Menu::Cancel)])
            }

            Transition::SaveEdit { thought_id, text } => {
                self.store.update_thought_text(thought_id, &text).await?;
                tracing::info!(thought = %thought_id, "Updated thought");
                let view = self.list_page(&ListScope::All, 0).await?;
                Ok(vec![
                    Reply::with_menu(labels::THOUGHT_UPDATED, Menu::Main),
                    view.into_send(),
                ])
            }

            Transition::RequestDelete {
                thought_id,
                message,
            } => {
                self.require_thought(thought_id).await?;
                Ok(vec![Reply::Edit {
                    message,
                    text: labels::ASK_DELETE.to_string(),
                    keyboard: Some(render::delete_prompt()),
                    format: render::TextFormat::Plain,
                }])
            }

            Transition::ConfirmDelete {
                thought_id,
                message,
            } => {
                self.store.delete_thought(thought_id).await?;
                tracing::info!(thought = %thought_id, "Deleted thought");
                let view = self.list_page(&ListScope::All, 0).await?;
                Ok(vec![
                    Reply::edit(message, labels::THOUGHT_DELETED),
                    view.into_send(),
                ])
            }

            Transition::CancelDelete { message } => {
                Ok(vec![Reply::edit(message, labels::DELETE_CANCELLED)])
            }

            Transition::StaleConfirmation { message } => {
                Ok(vec![Reply::edit(message, labels::CONFIRMATION_EXPIRED)])
            }

            Transition::Noop | Transition::Ignore => Ok(Vec::new()),
        }
    }

    async fn list_page(&self, scope: &ListScope, page: usize) -> Result<render::ListView> {
        let thoughts = match scope {
            ListScope::All => self.store.list_thoughts().await?,
            ListScope::Tag(tag) => self.store.list_thoughts_by_tag(tag).await?,
        };
        Ok(render::list_view(scope, &thoughts, page, self.config.page_size))
    }

    async fn require_thought(&self, thought_id: ThoughtId) -> Result<()> {
        match self.store.get_thought(thought_id).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("thought {thought_id}")).into()),
        }
    }
}

/// Phase and replies after a failed transition.
///
/// Validation errors keep the flow so the user can retry; anything else
/// resets to idle so no session is left stuck.
fn recover(current: &Phase, err: &MusingError) -> (Phase, Vec<Reply>) {
    match err.kind() {
        ErrorKind::Validation if current.expects_text() => {
            let prompt = match (current, err) {
                (Phase::AwaitingCustomTag { .. }, MusingError::Store(StoreError::TagTooLong { .. })) => {
                    labels::TAG_TOO_LONG
                }
                (Phase::AwaitingCustomTag { .. }, _) => labels::EMPTY_TAG,
                _ => labels::EMPTY_TEXT,
            };
            (*current, vec![Reply::with_menu(prompt, Menu::Cancel)])
        }
        ErrorKind::NotFound => (
            Phase::Idle,
            vec![Reply::with_menu(labels::NOT_FOUND, Menu::Main)],
        ),
        ErrorKind::StorageUnavailable => (
            Phase::Idle,
            vec![Reply::with_menu(labels::STORAGE_UNAVAILABLE, Menu::Main)],
        ),
        _ => (
            Phase::Idle,
            vec![Reply::with_menu(labels::FAILED, Menu::Main)],
        ),
    }
}
