//! Musing Core - a conversational thought journal
//!
//! This crate holds everything behind the chat transport:
//!
//! - **Model**: Thoughts, tags, and tag usage counts
//! - **Store**: SQLite-backed record store for thoughts and tags
//! - **Ranker**: Most-used tags for the tag picker
//! - **Pager**: Page slicing with prev/next flags
//! - **Callback**: Compact button payload codec
//! - **Render**: List views, keyboards, and user-facing strings
//! - **Conversation**: Per-user phase state machine and session registry
//! - **Flow**: Orchestrator that turns inbound events into replies
//! - **Transport**: The boundary a chat front end implements
//! - **Config**: TOML + environment configuration
//!
//! # Conversation phases
//!
//! ```text
//! IDLE ─ add ─→ AWAITING_THOUGHT_TEXT ─ text ─→ IDLE (tag picker shown)
//! IDLE ─ ✏️  ─→ AWAITING_EDIT_TEXT    ─ text ─→ IDLE
//! IDLE ─ 🗑  ─→ AWAITING_DELETE_CONFIRM ─ yes/no ─→ IDLE
//! IDLE ─ ➕  ─→ AWAITING_CUSTOM_TAG   ─ text ─→ IDLE
//! ```

pub mod callback;
pub mod config;
pub mod conversation;
pub mod error;
pub mod flow;
pub mod model;
pub mod pager;
pub mod ranker;
pub mod render;
pub mod store;
pub mod transport;

pub use callback::Callback;
pub use config::{FlowConfig, MusingConfig, StorageConfig, TelegramConfig};
pub use conversation::{Input, Phase, Session, SessionStore, Transition};
pub use error::{ErrorKind, MusingError, Result};
pub use flow::FlowOrchestrator;
pub use model::{ChatId, Tag, TagId, TagUsage, Thought, ThoughtId, UserId};
pub use pager::{paginate, Page};
pub use ranker::TagRanker;
pub use render::{InlineKeyboard, Markup, Menu, Reply, TextFormat};
pub use store::{RecordStore, Repository, SqliteStore};
pub use transport::{deliver, EventKind, Inbound, MessageRef, Transport};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_thought_round_trip_through_phases() {
        let phase = Phase::Idle;

        let t = Transition::resolve(&phase, Input::AddThought);
        let phase = t.next_phase(&phase);
        assert_eq!(phase, Phase::AwaitingThoughtText);

        let t = Transition::resolve(
            &phase,
            Input::Text {
                text: "buy milk".into(),
                attachment: None,
            },
        );
        assert!(matches!(t, Transition::SaveThought { .. }));
        assert!(t.next_phase(&phase).is_idle());
    }

    #[test]
    fn test_callback_wire_format() {
        let cb = Callback::AssignTag {
            thought_id: ThoughtId(42),
            tag_id: TagId(3),
        };
        assert_eq!(cb.encode(), "tag:42:3");
        assert_eq!("tag:42:3".parse::<Callback>().unwrap(), cb);
    }
}
