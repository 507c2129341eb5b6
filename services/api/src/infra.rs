use metrics_exporter_prometheus::PrometheusHandle;
use persona_quiz::quiz::{RepositoryError, SessionId, SessionRecord, SessionRepository};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Session store that evicts records left idle for longer than `ttl`. Stale
/// records are swept on every insert and are invisible to reads.
#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
    ttl: Option<Duration>,
}

impl InMemorySessionRepository {
    pub(crate) fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            records: Arc::default(),
            ttl,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }

    fn is_stale(&self, record: &SessionRecord) -> bool {
        self.ttl.is_some_and(|ttl| record.is_expired(ttl))
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let before = guard.len();
        guard.retain(|_, stored| !self.is_stale(stored));
        if guard.len() < before {
            debug!(evicted = before - guard.len(), "idle sessions evicted");
        }

        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        debug!(sessions = guard.len(), "session stored");
        Ok(record)
    }

    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard
            .get_mut(&record.id)
            .filter(|stored| !self.is_stale(stored))
            .ok_or(RepositoryError::NotFound)?;
        *stored = record;
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .get(id)
            .filter(|stored| !self.is_stale(stored))
            .cloned())
    }

    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn update_with<F, E>(&self, id: &SessionId, change: F) -> Result<SessionRecord, E>
    where
        F: FnOnce(&mut SessionRecord) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard
            .get_mut(id)
            .filter(|stored| !self.is_stale(stored))
            .ok_or(RepositoryError::NotFound)?;
        let mut record = stored.clone();
        change(&mut record)?;
        *stored = record.clone();
        Ok(record)
    }
}
