//! Conversation log data types.

use chrono::{DateTime, Utc};
use seedbot_types::{Role, Turn};

/// The ordered, append-only turns of one session.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    session_id: String,
    turns: Vec<Turn>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversationLog {
    /// Create a new empty log.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Append a turn. Earlier turns are never touched.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Generate a preview string from the first user turn.
    pub fn preview(&self) -> String {
        self.turns
            .iter()
            .find(|t| t.role == Role::User && !t.content.trim().is_empty())
            .map(|t| {
                let trimmed = t.content.trim();
                if trimmed.len() > 80 {
                    seedbot_types::ellipsize(trimmed, 77)
                } else {
                    trimmed.to_string()
                }
            })
            .unwrap_or_default()
    }

    /// Build a summary for listing.
    pub fn to_summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.session_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            turn_count: self.turns.len(),
            preview: self.preview(),
        }
    }
}

/// Lightweight summary for session listing.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub turn_count: usize,
    pub preview: String,
}

impl SessionSummary {
    /// Short prefix of the session ID for display.
    pub fn short_id(&self) -> &str {
        seedbot_types::truncate_str(&self.id, 8)
    }

    /// Human-readable age string (e.g. "2h ago", "3d ago").
    pub fn age(&self) -> String {
        let minutes = (Utc::now() - self.updated_at).num_minutes();
        match minutes {
            m if m < 1 => "just now".to_string(),
            m if m < 60 => format!("{m}m ago"),
            m if m < 1440 => format!("{}h ago", m / 60),
            m => format!("{}d ago", m / 1440),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_preserves_order() {
        let mut log = ConversationLog::new("s1");
        log.push(Turn::user("Hello"));
        log.push(Turn::assistant("Hi there"));
        assert_eq!(log.len(), 2);
        assert_eq!(log.turns()[0].content, "Hello");
        assert_eq!(log.last().map(|t| t.role), Some(Role::Assistant));
    }

    #[test]
    fn preview_uses_first_user_turn() {
        let mut log = ConversationLog::new("s1");
        log.push(Turn::assistant("Welcome"));
        log.push(Turn::user("  What is a Seedworld node?  "));
        assert_eq!(log.preview(), "What is a Seedworld node?");
    }

    #[test]
    fn preview_truncates_with_unicode_safety() {
        let mut log = ConversationLog::new("s1");
        log.push(Turn::user("\u{1F331}".repeat(82)));
        let preview = log.preview();
        assert!(preview.ends_with("..."));
        assert!(preview.len() <= 80);
    }

    #[test]
    fn summary_reflects_log() {
        let mut log = ConversationLog::new("0123456789abcdef");
        log.push(Turn::user("Tokens?"));
        let summary = log.to_summary();
        assert_eq!(summary.turn_count, 1);
        assert_eq!(summary.short_id(), "01234567");
        assert_eq!(summary.preview, "Tokens?");
        assert_eq!(summary.age(), "just now");
    }

    #[test]
    fn short_id_of_short_session() {
        let summary = ConversationLog::new("s1").to_summary();
        assert_eq!(summary.short_id(), "s1");
    }
}
