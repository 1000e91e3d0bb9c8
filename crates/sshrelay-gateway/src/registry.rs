//! Process-wide session registry — bookkeeping only, never used for
//! cross-session interaction.

use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub struct SessionMeta {
    /// Unix timestamp (seconds) when the channel was accepted.
    pub created_at: u64,
    /// True once the session holds a live remote shell.
    pub connected: bool,
}

/// Concurrency-safe map from session id to metadata. Insert on channel
/// accept (before the first message), remove exactly once after teardown.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionMeta>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return its freshly generated id.
    pub fn insert(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.sessions.insert(
            id.clone(),
            SessionMeta {
                created_at,
                connected: false,
            },
        );
        id
    }

    pub fn mark_connected(&self, id: &str) {
        if let Some(mut meta) = self.sessions.get_mut(id) {
            meta.connected = true;
        }
    }

    /// Returns true if the id was present (first removal).
    pub fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let registry = SessionRegistry::new();
        let a = registry.insert();
        let b = registry.insert();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn remove_reports_first_removal_only() {
        let registry = SessionRegistry::new();
        let id = registry.insert();
        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.is_empty());
    }

    #[test]
    fn mark_connected_updates_meta() {
        let registry = SessionRegistry::new();
        let id = registry.insert();
        registry.mark_connected(&id);
        let meta = registry.sessions.get(&id).unwrap();
        assert!(meta.connected);
    }
}
