//! Conversation phases
//!
//! ```text
//!          add thought            text
//! Idle ─────────────────▶ AwaitingThoughtText ───▶ Idle (tag picker shown)
//!   │  custom tag button          text
//!   ├───────────────────▶ AwaitingCustomTag ─────▶ Idle
//!   │  edit button                text
//!   ├───────────────────▶ AwaitingEditText ──────▶ Idle
//!   │  delete button              confirm / cancel
//!   └───────────────────▶ AwaitingDeleteConfirm ─▶ Idle
//! ```
//!
//! Every awaiting phase returns to `Idle` on the cancel token or a
//! top-level command.

use crate::model::ThoughtId;

/// Where a user is in a multi-message flow.
///
/// The working thought id travels with the phase that needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingThoughtText,
    AwaitingCustomTag { thought_id: ThoughtId },
    AwaitingEditText { thought_id: ThoughtId },
    AwaitingDeleteConfirm { thought_id: ThoughtId },
}

impl Phase {
    pub fn is_idle(&self) -> bool {
        matches!(self, Phase::Idle)
    }

    /// Whether the next free-text message belongs to this flow
    pub fn expects_text(&self) -> bool {
        matches!(
            self,
            Phase::AwaitingThoughtText
                | Phase::AwaitingCustomTag { .. }
                | Phase::AwaitingEditText { .. }
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "IDLE"),
            Phase::AwaitingThoughtText => write!(f, "AWAITING_THOUGHT_TEXT"),
            Phase::AwaitingCustomTag { thought_id } => {
                write!(f, "AWAITING_CUSTOM_TAG({thought_id})")
            }
            Phase::AwaitingEditText { thought_id } => write!(f, "AWAITING_EDIT_TEXT({thought_id})"),
            Phase::AwaitingDeleteConfirm { thought_id } => {
                write!(f, "AWAITING_DELETE_CONFIRM({thought_id})")
            }
        }
    }
}
