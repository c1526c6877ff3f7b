//! Shared types, traits and error hierarchy for Seedbot.

pub mod error;
pub mod knowledge;
pub mod message;
pub mod model;
pub mod retrieval;
pub mod tool;
pub mod util;

pub use error::{ApiError, ConfigError, RetrievalError, SeedbotError, ToolError};
pub use knowledge::KnowledgeBase;
pub use message::*;
pub use model::LanguageModel;
pub use retrieval::{Passage, Retriever};
pub use tool::*;
pub use util::{ellipsize, truncate_str};
