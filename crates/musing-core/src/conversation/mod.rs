//! Conversation state machine
//!
//! The transport is stateless between messages, so each user's [`Phase`] is
//! the only memory of what their next free-text message means.

mod phase;
mod session;
mod transition;

pub use phase::Phase;
pub use session::{Session, SessionStore};
pub use transition::{Input, Transition};
