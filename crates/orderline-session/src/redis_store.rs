use crate::error::SessionError;
use crate::SessionStore;
use async_trait::async_trait;
use orderline_types::Turn;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Key namespace for call sessions.
const SESSION_NS: &str = "call_session:";

/// Redis-backed session store.
///
/// Holds a single [`ConnectionManager`] built once at startup; the
/// manager multiplexes a reconnecting connection and is cheap to clone
/// per call, so no per-request reconnection ever happens.
#[derive(Clone)]
pub struct RedisSessionStore {
    manager: ConnectionManager,
    ttl_secs: u64,
}

impl RedisSessionStore {
    /// Connects to redis at `url` and returns a store whose entries
    /// expire `ttl_secs` after their last write.
    pub async fn connect(url: &str, ttl_secs: u64) -> Result<Self, SessionError> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager, ttl_secs })
    }

    fn key(call_id: &str) -> String {
        format!("{SESSION_NS}{call_id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, call_id: &str) -> Result<Vec<Turn>, SessionError> {
        let mut conn = self.manager.clone();
        let raw: Option<String> = conn.get(Self::key(call_id)).await?;
        let Some(raw) = raw else {
            return Ok(Vec::new());
        };
        // A payload that no longer decodes (schema drift across deploys)
        // degrades to a fresh session rather than failing the call.
        match serde_json::from_str(&raw) {
            Ok(turns) => Ok(turns),
            Err(e) => {
                tracing::warn!(call_id, "undecodable session payload, starting fresh: {e}");
                Ok(Vec::new())
            }
        }
    }

    async fn set(&self, call_id: &str, history: &[Turn]) -> Result<(), SessionError> {
        let payload = serde_json::to_string(history)?;
        let mut conn = self.manager.clone();
        let _: () = conn
            .set_ex(Self::key(call_id), payload, self.ttl_secs)
            .await?;
        Ok(())
    }

    async fn delete(&self, call_id: &str) -> Result<(), SessionError> {
        let mut conn = self.manager.clone();
        let _: () = conn.del(Self::key(call_id)).await?;
        Ok(())
    }
}
