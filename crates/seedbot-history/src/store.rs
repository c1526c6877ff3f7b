//! Process-wide registry of conversation logs keyed by session identifier.

use crate::types::{ConversationLog, SessionSummary};
use seedbot_types::Turn;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Shared handle to one session's log.
///
/// The async mutex is what serializes turns within a session: whoever holds
/// the guard is the only writer until it is dropped.
pub type SessionLog = Arc<tokio::sync::Mutex<ConversationLog>>;

/// How long sessions are kept in memory.
///
/// The default keeps every session for the life of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Evict the least recently used idle session once this many are registered.
    pub max_sessions: Option<usize>,
    /// Drop sessions not accessed for this long.
    pub idle_ttl: Option<Duration>,
}

impl RetentionPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_sessions.is_none() && self.idle_ttl.is_none()
    }
}

struct Entry {
    log: SessionLog,
    last_access: Instant,
}

impl Entry {
    /// A log is in use while anyone besides the registry holds its handle.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.log) > 1
    }
}

/// In-memory history store.
///
/// Reads of an unknown session yield an empty history; writes create the
/// log on first reference. Nothing here can fail.
pub struct HistoryStore {
    sessions: Mutex<HashMap<String, Entry>>,
    policy: RetentionPolicy,
}

impl HistoryStore {
    /// Create a store that never evicts.
    pub fn new() -> Self {
        Self::with_policy(RetentionPolicy::unbounded())
    }

    pub fn with_policy(policy: RetentionPolicy) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            policy,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Return the log for `session_id`, registering an empty one if needed.
    pub fn get_or_create(&self, session_id: &str) -> SessionLog {
        let now = Instant::now();
        let mut sessions = self.lock_sessions();
        self.purge_expired(&mut sessions, now);

        if let Some(entry) = sessions.get_mut(session_id) {
            entry.last_access = now;
            return Arc::clone(&entry.log);
        }

        if let Some(max) = self.policy.max_sessions {
            while sessions.len() >= max {
                if !evict_least_recent(&mut sessions) {
                    tracing::warn!(
                        max_sessions = max,
                        "every session is busy; registry temporarily exceeds its cap"
                    );
                    break;
                }
            }
        }

        let log = Arc::new(tokio::sync::Mutex::new(ConversationLog::new(session_id)));
        sessions.insert(
            session_id.to_string(),
            Entry {
                log: Arc::clone(&log),
                last_access: now,
            },
        );
        tracing::debug!(session_id, sessions = sessions.len(), "created conversation log");
        log
    }

    /// Append `turn` to the session's log, creating the log if absent.
    pub async fn append(&self, session_id: &str, turn: Turn) {
        let log = self.get_or_create(session_id);
        log.lock().await.push(turn);
        self.touch(session_id);
    }

    /// Mark `session_id` as just used, for both the idle TTL and LRU order.
    ///
    /// Call after writing through a [`SessionLog`] handle obtained earlier;
    /// the registry only sees accesses that go through it.
    pub fn touch(&self, session_id: &str) {
        if let Some(entry) = self.lock_sessions().get_mut(session_id) {
            entry.last_access = Instant::now();
        }
    }

    /// Ordered copy of the session's turns. Unknown sessions yield an empty
    /// vector and are not registered.
    pub async fn snapshot(&self, session_id: &str) -> Vec<Turn> {
        match self.lookup(session_id) {
            Some(log) => log.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }

    /// Whether a log is currently registered for `session_id`.
    pub fn contains(&self, session_id: &str) -> bool {
        let mut sessions = self.lock_sessions();
        self.purge_expired(&mut sessions, Instant::now());
        sessions.contains_key(session_id)
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        let mut sessions = self.lock_sessions();
        self.purge_expired(&mut sessions, Instant::now());
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Summaries of all sessions, most recently updated first.
    ///
    /// Waits for in-flight turns to finish on each session it inspects.
    pub async fn summaries(&self) -> Vec<SessionSummary> {
        let logs: Vec<SessionLog> = {
            let mut sessions = self.lock_sessions();
            self.purge_expired(&mut sessions, Instant::now());
            sessions.values().map(|e| Arc::clone(&e.log)).collect()
        };

        let mut summaries = Vec::with_capacity(logs.len());
        for log in logs {
            summaries.push(log.lock().await.to_summary());
        }
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        summaries
    }

    fn lookup(&self, session_id: &str) -> Option<SessionLog> {
        let now = Instant::now();
        let mut sessions = self.lock_sessions();
        self.purge_expired(&mut sessions, now);
        sessions.get_mut(session_id).map(|entry| {
            entry.last_access = now;
            Arc::clone(&entry.log)
        })
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // The map stays consistent even if a holder panicked mid-access.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn purge_expired(&self, sessions: &mut HashMap<String, Entry>, now: Instant) {
        let Some(ttl) = self.policy.idle_ttl else {
            return;
        };
        let before = sessions.len();
        sessions.retain(|_, entry| entry.in_use() || now.duration_since(entry.last_access) <= ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            tracing::info!(purged, ttl_secs = ttl.as_secs(), "expired idle sessions");
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove the least recently used session that is not in use.
/// Returns `false` when every session is busy.
fn evict_least_recent(sessions: &mut HashMap<String, Entry>) -> bool {
    let victim = sessions
        .iter()
        .filter(|(_, entry)| !entry.in_use())
        .min_by_key(|(_, entry)| entry.last_access)
        .map(|(id, _)| id.clone());

    match victim {
        Some(id) => {
            sessions.remove(&id);
            tracing::info!(session_id = %id, "evicted least recently used session");
            true
        }
        None => false,
    }
}
