//! Session-scoped conversation history for Seedbot.

pub mod store;
pub mod types;

pub use store::{HistoryStore, RetentionPolicy, SessionLog};
pub use types::{ConversationLog, SessionSummary};
