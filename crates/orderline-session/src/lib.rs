//! Call session persistence for the Orderline platform.
//!
//! Each phone call carries its conversation history here between webhook
//! round trips: the telephony provider's requests are stateless, so this
//! store is the only cross-request continuity. Entries expire on a
//! sliding window (refreshed on every write) to bound storage growth
//! from abandoned calls; no background reaper is needed.
//!
//! Two backends: [`RedisSessionStore`] for production (one process-wide
//! connection manager, cloned per call) and [`MemorySessionStore`] for
//! tests and store-less development runs.

pub mod error;
mod memory;
mod redis_store;

pub use error::SessionError;
pub use memory::MemorySessionStore;
pub use redis_store::RedisSessionStore;

use async_trait::async_trait;
use orderline_types::Turn;

/// Default sliding expiry for call sessions: one hour.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;

/// Key/value store mapping a call identifier to its conversation history.
///
/// Different call identifiers never contend. Overlapping writes to the
/// same identifier (pathological double-submission from the telephony
/// provider) are last-writer-wins; nothing here serializes them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored history for this call, or an empty sequence if
    /// none exists or the stored payload cannot be decoded.
    async fn get(&self, call_id: &str) -> Result<Vec<Turn>, SessionError>;

    /// Persists the history for this call, refreshing the expiry window.
    async fn set(&self, call_id: &str, history: &[Turn]) -> Result<(), SessionError>;

    /// Removes any stored history for this call.
    async fn delete(&self, call_id: &str) -> Result<(), SessionError>;
}
