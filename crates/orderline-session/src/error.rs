use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("history encode error: {0}")]
    Encode(#[from] serde_json::Error),
}
