use crate::detection::event::ViolationEvent;
use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Append-only collection of committed violations, mirrored to a local JSON
/// cache file so the collection survives restarts. The cache is a convenience
/// copy; the durable record lives in the database. The store only serializes
/// the cache payload — the owner performs the actual file write so no disk
/// I/O happens while the collection is locked.
pub struct ViolationStore {
    events: Vec<ViolationEvent>,
    seen: HashSet<String>,
    cache_path: Option<PathBuf>,
}

impl ViolationStore {
    /// Create a store, hydrating from the cache file when one exists.
    /// A missing or unreadable cache starts the store empty.
    pub fn new(cache_path: Option<PathBuf>) -> Self {
        let events = cache_path
            .as_ref()
            .map(|path| Self::hydrate(path))
            .unwrap_or_default();
        let seen = events
            .iter()
            .map(|event| event.violation_id.clone())
            .collect();

        Self {
            events,
            seen,
            cache_path,
        }
    }

    fn hydrate(path: &Path) -> Vec<ViolationEvent> {
        if !path.exists() {
            return Vec::new();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Vec<ViolationEvent>>(&contents) {
                Ok(events) => {
                    debug!("Hydrated {} violations from {}", events.len(), path.display());
                    events
                }
                Err(e) => {
                    warn!("Ignoring malformed violation cache {}: {}", path.display(), e);
                    Vec::new()
                }
            },
            Err(e) => {
                warn!("Failed to read violation cache {}: {}", path.display(), e);
                Vec::new()
            }
        }
    }

    /// Whether an event with this id has already been committed
    pub fn contains(&self, violation_id: &str) -> bool {
        self.seen.contains(violation_id)
    }

    /// Append a new event, preserving arrival order. Returns false without
    /// side effects when the id is already present.
    pub fn commit(&mut self, event: ViolationEvent) -> bool {
        if self.seen.contains(&event.violation_id) {
            return false;
        }

        self.seen.insert(event.violation_id.clone());
        self.events.push(event);
        true
    }

    /// Committed events in arrival order
    pub fn events(&self) -> &[ViolationEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Serialized cache payload and its destination, for the owner to write
    /// after releasing the store. None when no cache path is configured or
    /// serialization fails (logged, non-fatal).
    pub fn cache_snapshot(&self) -> Option<(PathBuf, String)> {
        let path = self.cache_path.as_ref()?;

        match serde_json::to_string(&self.events) {
            Ok(json) => Some((path.clone(), json)),
            Err(e) => {
                warn!("Failed to serialize violation cache: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str) -> ViolationEvent {
        ViolationEvent {
            violation_id: id.to_string(),
            camera_number: "1".to_string(),
            date: "2024-01-01".to_string(),
            time: "10:00:00".to_string(),
            violation: "cap".to_string(),
            url: None,
            confidence: Some(0.8),
            status: "Pending".to_string(),
        }
    }

    #[test]
    fn duplicate_commit_is_a_no_op() {
        let mut store = ViolationStore::new(None);
        assert!(store.commit(event("V1")));
        assert!(!store.commit(event("V1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn preserves_arrival_order() {
        let mut store = ViolationStore::new(None);
        store.commit(event("A"));
        store.commit(event("B"));
        store.commit(event("C"));

        let ids: Vec<&str> = store
            .events()
            .iter()
            .map(|e| e.violation_id.as_str())
            .collect();
        assert_eq!(ids, ["A", "B", "C"]);
    }

    #[test]
    fn cache_snapshot_round_trips_across_instances() {
        let path = std::env::temp_dir().join(format!("violation-cache-{}.json", uuid::Uuid::new_v4()));

        let mut store = ViolationStore::new(Some(path.clone()));
        store.commit(event("V1"));
        store.commit(event("V2"));
        let (out, json) = store.cache_snapshot().unwrap();
        assert_eq!(out, path);
        std::fs::write(&out, json).unwrap();
        drop(store);

        let rehydrated = ViolationStore::new(Some(path.clone()));
        assert_eq!(rehydrated.len(), 2);
        assert!(rehydrated.contains("V1"));
        assert!(rehydrated.contains("V2"));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn no_cache_path_means_no_snapshot() {
        let mut store = ViolationStore::new(None);
        store.commit(event("V1"));
        assert!(store.cache_snapshot().is_none());
    }

    #[test]
    fn malformed_cache_starts_empty() {
        let path = std::env::temp_dir().join(format!("violation-cache-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "{ not json").unwrap();

        let store = ViolationStore::new(Some(path.clone()));
        assert!(store.is_empty());

        let _ = std::fs::remove_file(path);
    }
}
