use std::time::Duration;

use crate::{error::Error, validate::DEFAULT_INTERVAL_FLOOR_MS};

/// Configuration consumed by the orchestrator,
/// loaded the way `ergo`'s `service_config::Config` loads its own fields:
/// environment variables, with an optional config file overlay via the
/// `config` crate, and `.env` support via `dotenv`, rather than ad hoc
/// `std::env` reads scattered through the orchestrator.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Non-empty key prefix `P` under which all state lives.
    pub key_prefix: String,
    /// Visibility timeout for in-flight jobs, in milliseconds.
    pub job_expire_interval_ms: i64,
    /// The floor `is_valid_interval` enforces; defaults to 1000ms.
    pub interval_floor_ms: i64,
    /// Redis connection string. `Settings::load()` resolves this from the
    /// `redis_url` config key or the `REDIS_URL` environment variable; it
    /// is always populated by the time `load()` returns successfully.
    pub redis_url: String,
    /// How long rate-counter keys live before expiring, in seconds. Should
    /// be at least 600 (10 minutes), so a `metrics` caller can always read
    /// the last ten one-minute buckets.
    pub counter_ttl_seconds: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            key_prefix: "sharq".to_string(),
            job_expire_interval_ms: Duration::from_secs(300).as_millis() as i64,
            interval_floor_ms: DEFAULT_INTERVAL_FLOOR_MS,
            redis_url: String::new(),
            counter_ttl_seconds: 600,
        }
    }
}

impl Settings {
    /// Load settings from environment variables (optionally overlaid by a
    /// config file named by `SHARQ_CONFIG`), falling back to defaults for
    /// anything unset. Mirrors `ergo::service_config::Config::new`'s
    /// `env::var(...).unwrap_or_else(...)` shape, but routed through the
    /// `config` crate so a deployment can also supply a TOML/YAML file.
    pub fn load() -> Result<Settings, Error> {
        dotenv::dotenv().ok();

        let mut builder = config::Config::default();
        if let Ok(path) = std::env::var("SHARQ_CONFIG") {
            builder
                .merge(config::File::with_name(&path))
                .map_err(|e| Error::Config(e.to_string()))?;
        }
        builder
            .merge(config::Environment::with_prefix("SHARQ"))
            .map_err(|e| Error::Config(e.to_string()))?;

        let defaults = Settings::default();

        let key_prefix = builder
            .get_string("key_prefix")
            .unwrap_or(defaults.key_prefix);
        let job_expire_interval_ms = builder
            .get_int("job_expire_interval_ms")
            .unwrap_or(defaults.job_expire_interval_ms);
        let interval_floor_ms = builder
            .get_int("interval_floor_ms")
            .unwrap_or(defaults.interval_floor_ms);
        let redis_url = builder
            .get_string("redis_url")
            .ok()
            .or_else(|| std::env::var("REDIS_URL").ok())
            .ok_or_else(|| Error::Config("REDIS_URL is required".to_string()))?;
        let counter_ttl_seconds = builder
            .get_int("counter_ttl_seconds")
            .unwrap_or(defaults.counter_ttl_seconds);

        if key_prefix.is_empty() {
            return Err(Error::Config("key_prefix must not be empty".to_string()));
        }

        Ok(Settings {
            key_prefix,
            job_expire_interval_ms,
            interval_floor_ms,
            redis_url,
            counter_ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.key_prefix, "sharq");
        assert_eq!(settings.job_expire_interval_ms, 300_000);
        assert_eq!(settings.interval_floor_ms, DEFAULT_INTERVAL_FLOOR_MS);
        assert!(settings.counter_ttl_seconds >= 600);
    }
}
