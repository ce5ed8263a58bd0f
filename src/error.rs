use thiserror::Error;

/// The error taxonomy for sharq. Benign, expected conditions (no ready work,
/// an already-finished job, an unknown interval binding) are never an
/// `Error` -- they are `{status: "failure"}` values returned from the
/// relevant operation. Only validation failures and store/transport
/// failures end up here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Redis connection pool error: {0}")]
    Pool(#[from] deadpool::managed::PoolError<redis::RedisError>),

    #[error("Redis connection pool creation error: {0}")]
    PoolCreation(#[from] deadpool_redis::CreatePoolError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
