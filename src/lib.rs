//! `sharq`: a multi-tenant, rate-limited job queue built on Redis. See
//! `queue::SharQ` for the orchestrator clients call into.

pub mod clock;
pub mod config;
pub mod error;
pub mod graceful_shutdown;
pub mod job;
pub mod keys;
pub mod metrics;
pub mod queue;
pub mod redis_pool;
pub mod scripts;
pub mod validate;

pub use config::Settings;
pub use error::{Error, Result};
pub use job::JobId;
pub use queue::{SharQ, DEFAULT_QUEUE_TYPE};
pub use redis_pool::RedisPool;
pub use scripts::DequeuedJob;
