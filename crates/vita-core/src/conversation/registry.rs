use super::history::HistoryLog;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Session identifier used by the interactive binary.
pub const DEFAULT_SESSION_ID: &str = "1";

/// Maps session identifiers to their history logs.
///
/// `SessionRegistry` is responsible for:
/// - Creating a session's log lazily on first use
/// - Handing out the per-session lock that serialises appends
/// - Keeping every log alive for the lifetime of the process
///
/// Nothing is persisted; dropping the registry drops every conversation.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Mutex<HistoryLog>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the log for `session_id`, creating an empty one if needed.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<HistoryLog>> {
        if let Some(log) = self.sessions.read().await.get(session_id) {
            return Arc::clone(log);
        }

        let mut sessions = self.sessions.write().await;
        // Another task may have created it between the two locks.
        let log = sessions.entry(session_id.to_string()).or_insert_with(|| {
            tracing::debug!(session_id, "creating session history");
            Arc::new(Mutex::new(HistoryLog::new()))
        });
        Arc::clone(log)
    }

    /// Returns the log for `session_id` without creating it.
    pub async fn get(&self, session_id: &str) -> Option<Arc<Mutex<HistoryLog>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Clones the turns currently stored for `session_id` (empty if unknown).
    pub async fn snapshot(&self, session_id: &str) -> HistoryLog {
        match self.get(session_id).await {
            Some(log) => log.lock().await.clone(),
            None => HistoryLog::new(),
        }
    }

    /// Identifiers of every session created so far.
    pub async fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_created_lazily() {
        let registry = SessionRegistry::new();
        assert!(registry.get("a").await.is_none());

        registry.get_or_create("a").await;
        assert!(registry.get("a").await.is_some());
        assert_eq!(registry.session_ids().await, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_same_id_returns_same_log() {
        let registry = SessionRegistry::new();
        let first = registry.get_or_create(DEFAULT_SESSION_ID).await;
        first.lock().await.record_exchange("hi", "hello");

        let second = registry.get_or_create(DEFAULT_SESSION_ID).await;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let registry = SessionRegistry::new();
        registry
            .get_or_create("a")
            .await
            .lock()
            .await
            .record_exchange("q", "r");

        assert_eq!(registry.snapshot("a").await.len(), 2);
        assert!(registry.snapshot("b").await.is_empty());
        // snapshot must not create the session
        assert!(registry.get("b").await.is_none());
    }
}
