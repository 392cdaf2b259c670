use crate::error::SessionError;
use crate::SessionStore;
use async_trait::async_trait;
use orderline_types::Turn;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

struct Entry {
    expires_at: Instant,
    turns: Vec<Turn>,
}

/// In-memory session store with the same sliding-expiry semantics as
/// the redis backend. Used in tests and store-less development runs.
///
/// Uses `std::sync::RwLock` intentionally: all lock acquisitions are
/// brief HashMap operations that never span `.await` points, making a
/// synchronous lock safe and more efficient than `tokio::sync::RwLock`.
#[derive(Clone)]
pub struct MemorySessionStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(crate::DEFAULT_SESSION_TTL_SECS))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, call_id: &str) -> Result<Vec<Turn>, SessionError> {
        let entries = self.entries.read().expect("session lock poisoned");
        Ok(entries
            .get(call_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.turns.clone())
            .unwrap_or_default())
    }

    async fn set(&self, call_id: &str, history: &[Turn]) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.write().expect("session lock poisoned");
        // Opportunistic sweep so abandoned calls do not accumulate.
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            call_id.to_string(),
            Entry {
                expires_at: now + self.ttl,
                turns: history.to_vec(),
            },
        );
        Ok(())
    }

    async fn delete(&self, call_id: &str) -> Result<(), SessionError> {
        let mut entries = self.entries.write().expect("session lock poisoned");
        entries.remove(call_id);
        Ok(())
    }
}
