use std::sync::{Arc, Mutex};

/// Browser-style history the session reads share links from and clears them in.
pub trait Navigator: Send + Sync {
    fn current_url(&self) -> String;
    /// Adds a new history entry.
    fn push(&self, url: &str);
    /// Rewrites the current entry without adding one.
    fn replace(&self, url: &str);
}

/// History kept in memory; used per session by the service and in tests.
#[derive(Debug, Clone)]
pub struct MemoryNavigator {
    entries: Arc<Mutex<Vec<String>>>,
}

impl MemoryNavigator {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(vec![initial.into()])),
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().expect("navigator mutex poisoned").clone()
    }

    pub fn history_len(&self) -> usize {
        self.entries.lock().expect("navigator mutex poisoned").len()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_url(&self) -> String {
        self.entries
            .lock()
            .expect("navigator mutex poisoned")
            .last()
            .cloned()
            .unwrap_or_default()
    }

    fn push(&self, url: &str) {
        self.entries
            .lock()
            .expect("navigator mutex poisoned")
            .push(url.to_string());
    }

    fn replace(&self, url: &str) {
        let mut entries = self.entries.lock().expect("navigator mutex poisoned");
        match entries.last_mut() {
            Some(current) => *current = url.to_string(),
            None => entries.push(url.to_string()),
        }
    }
}
