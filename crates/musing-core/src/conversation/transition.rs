//! Dispatch table: (phase, input) → transition

use super::Phase;
use crate::callback::Callback;
use crate::model::{normalize_tag_name, TagId, ThoughtId};
use crate::render::{labels, ListScope};
use crate::transport::{EventKind, MessageRef};

/// An inbound event, decoded independently of the current phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `/start`
    Start,
    /// main menu "view thoughts"
    ViewThoughts,
    /// main menu "add thought"
    AddThought,
    /// cancel menu button
    Cancel,
    /// any other typed message
    Text {
        text: String,
        attachment: Option<String>,
    },
    Button {
        callback: Callback,
        message: MessageRef,
    },
}

impl Input {
    pub fn decode(kind: EventKind) -> Self {
        match kind {
            EventKind::Text { text, attachment } => {
                let trimmed = text.trim();
                if attachment.is_none() {
                    if trimmed == "/start" || trimmed.starts_with("/start ") {
                        return Input::Start;
                    }
                    match trimmed {
                        labels::MENU_VIEW_THOUGHTS => return Input::ViewThoughts,
                        labels::MENU_ADD_THOUGHT => return Input::AddThought,
                        labels::CANCEL => return Input::Cancel,
                        _ => {}
                    }
                }
                Input::Text { text, attachment }
            }
            EventKind::ButtonPress { callback, message } => Input::Button { callback, message },
        }
    }
}

/// One edge of the conversation state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Greeting with the main menu
    Greet,
    /// Prompt for a new thought
    BeginThought,
    /// Render a list page; `message` set means edit that message in place
    ShowList {
        scope: ListScope,
        page: usize,
        message: Option<MessageRef>,
    },
    /// Abandon the current flow
    Cancel,
    SaveThought {
        text: String,
        attachment: Option<String>,
    },
    AssignTag {
        thought_id: ThoughtId,
        tag_id: TagId,
        message: MessageRef,
    },
    RequestCustomTag {
        thought_id: ThoughtId,
    },
    SaveCustomTag {
        thought_id: ThoughtId,
        name: String,
    },
    RequestEdit {
        thought_id: ThoughtId,
    },
    SaveEdit {
        thought_id: ThoughtId,
        text: String,
    },
    RequestDelete {
        thought_id: ThoughtId,
        message: MessageRef,
    },
    ConfirmDelete {
        thought_id: ThoughtId,
        message: MessageRef,
    },
    CancelDelete {
        message: MessageRef,
    },
    /// Yes/no pressed with no delete pending
    StaleConfirmation {
        message: MessageRef,
    },
    /// Display-only button
    Noop,
    /// Nothing to do
    Ignore,
}

impl Transition {
    /// Pick the transition for `input` in `phase`
    pub fn resolve(phase: &Phase, input: Input) -> Transition {
        match (phase, input) {
            // Top-level commands work from anywhere and abort the current flow
            (_, Input::Start) => Transition::Greet,
            (_, Input::ViewThoughts) => Transition::ShowList {
                scope: ListScope::All,
                page: 0,
                message: None,
            },
            (_, Input::AddThought) => Transition::BeginThought,
            (_, Input::Cancel) => Transition::Cancel,

            // Free text
            (Phase::Idle, Input::Text { text, .. }) => match text.trim().strip_prefix('#') {
                Some(tag) => match normalize_tag_name(tag) {
                    Some(tag) => Transition::ShowList {
                        scope: ListScope::Tag(tag),
                        page: 0,
                        message: None,
                    },
                    None => Transition::Ignore,
                },
                None => Transition::Ignore,
            },
            (Phase::AwaitingThoughtText, Input::Text { text, attachment }) => {
                Transition::SaveThought { text, attachment }
            }
            (Phase::AwaitingCustomTag { thought_id }, Input::Text { text, .. }) => {
                Transition::SaveCustomTag {
                    thought_id: *thought_id,
                    name: text,
                }
            }
            (Phase::AwaitingEditText { thought_id }, Input::Text { text, .. }) => {
                Transition::SaveEdit {
                    thought_id: *thought_id,
                    text,
                }
            }
            (Phase::AwaitingDeleteConfirm { .. }, Input::Text { .. }) => Transition::Ignore,

            // Buttons
            (_, Input::Button { callback, message }) => match (phase, callback) {
                (_, Callback::ThoughtsPage { page }) => Transition::ShowList {
                    scope: ListScope::All,
                    page,
                    message: Some(message),
                },
                (_, Callback::TagPage { tag, page }) => Transition::ShowList {
                    scope: ListScope::Tag(tag),
                    page,
                    message: Some(message),
                },
                (_, Callback::EditThought { thought_id }) => Transition::RequestEdit { thought_id },
                (_, Callback::DeleteThought { thought_id }) => {
                    Transition::RequestDelete { thought_id, message }
                }
                (_, Callback::AssignTag { thought_id, tag_id }) => Transition::AssignTag {
                    thought_id,
                    tag_id,
                    message,
                },
                (_, Callback::CustomTag { thought_id }) => {
                    Transition::RequestCustomTag { thought_id }
                }
                (Phase::AwaitingDeleteConfirm { thought_id }, Callback::ConfirmDelete) => {
                    Transition::ConfirmDelete {
                        thought_id: *thought_id,
                        message,
                    }
                }
                (Phase::AwaitingDeleteConfirm { .. }, Callback::CancelDelete) => {
                    Transition::CancelDelete { message }
                }
                (_, Callback::ConfirmDelete | Callback::CancelDelete) => {
                    Transition::StaleConfirmation { message }
                }
                (_, Callback::Noop) => Transition::Noop,
            },
        }
    }

    /// Phase after this transition succeeds
    pub fn next_phase(&self, current: &Phase) -> Phase {
        match self {
            Transition::BeginThought => Phase::AwaitingThoughtText,
            Transition::RequestCustomTag { thought_id } => Phase::AwaitingCustomTag {
                thought_id: *thought_id,
            },
            Transition::RequestEdit { thought_id } => Phase::AwaitingEditText {
                thought_id: *thought_id,
            },
            Transition::RequestDelete { thought_id, .. } => Phase::AwaitingDeleteConfirm {
                thought_id: *thought_id,
            },

            // Paging an existing message does not disturb the flow
            Transition::ShowList {
                message: Some(_), ..
            } => *current,
            Transition::StaleConfirmation { .. } | Transition::Noop | Transition::Ignore => {
                *current
            }

            Transition::Greet
            | Transition::ShowList { message: None, .. }
            | Transition::Cancel
            | Transition::SaveThought { .. }
            | Transition::AssignTag { .. }
            | Transition::SaveCustomTag { .. }
            | Transition::SaveEdit { .. }
            | Transition::ConfirmDelete { .. }
            | Transition::CancelDelete { .. } => Phase::Idle,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Greet => "greet",
            Transition::BeginThought => "begin_thought",
            Transition::ShowList { .. } => "show_list",
            Transition::Cancel => "cancel",
            Transition::SaveThought { .. } => "save_thought",
            Transition::AssignTag { .. } => "assign_tag",
            Transition::RequestCustomTag { .. } => "request_custom_tag",
            Transition::SaveCustomTag { .. } => "save_custom_tag",
            Transition::RequestEdit { .. } => "request_edit",
            Transition::SaveEdit { .. } => "save_edit",
            Transition::RequestDelete { .. } => "request_delete",
            Transition::ConfirmDelete { .. } => "confirm_delete",
            Transition::CancelDelete { .. } => "cancel_delete",
            Transition::StaleConfirmation { .. } => "stale_confirmation",
            Transition::Noop => "noop",
            Transition::Ignore => "ignore",
        }
    }
}
