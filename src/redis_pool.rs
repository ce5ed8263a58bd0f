use std::{env, ops::Deref, sync::Arc};

use crate::error::{Error, Result};

/// A thin wrapper around `deadpool_redis::Pool`, grounded in
/// `ergo_database::redis::RedisPool`. Connection management itself (pool
/// sizing policy, retry/backoff on connect) is deliberately out of scope --
/// this type exists only so the orchestrator has something concrete to
/// hold and clone cheaply.
#[derive(Clone)]
pub struct RedisPool(Arc<deadpool_redis::Pool>);

impl Deref for RedisPool {
    type Target = deadpool_redis::Pool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl RedisPool {
    /// Build a pool from an explicit connection URL, or fall back to the
    /// `REDIS_URL` environment variable, matching
    /// `ergo_database::RedisPool::new`'s convention exactly.
    pub fn new(connection_url: Option<String>) -> Result<RedisPool> {
        let url = connection_url
            .or_else(|| env::var("REDIS_URL").ok())
            .ok_or_else(|| Error::Config("REDIS_URL is required".to_string()))?;

        let pool = deadpool_redis::Config {
            url: Some(url),
            connection: None,
            pool: None,
        }
        .create_pool()?;

        Ok(RedisPool(Arc::new(pool)))
    }

    pub async fn get(&self) -> Result<deadpool_redis::Connection> {
        self.0.get().await.map_err(Error::from)
    }
}
