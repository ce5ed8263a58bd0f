//! Orchestrator: the object callers use. Every public method
//! validates, stamps the clock, builds keys, invokes the one script that
//! owns the mutation, and shapes the reply -- mirroring `ergo_queues::Queue`
//! end to end, including its `Arc`-backed `Clone` handle and its
//! `start_*_loop`/`stop_*_loop` convention for optional background tasks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::graceful_shutdown::GracefulShutdownConsumer;
use crate::job::JobId;
use crate::keys::KeySchema;
use crate::metrics::{self, GlobalMetrics, TenantMetrics, TypeMetrics};
use crate::redis_pool::RedisPool;
use crate::scripts::{
    DequeueScript, DequeuedJob, EnqueueScript, FinishScript, IntervalScript, MetricsScript,
    RequeueScript,
};
use crate::validate::{is_valid_identifier, is_valid_interval};

/// `queue_type` defaults to this when a caller omits it.
pub const DEFAULT_QUEUE_TYPE: &str = "default";

struct Inner {
    pool: RedisPool,
    settings: Settings,
    clock: Box<dyn Clock>,
    enqueue: EnqueueScript,
    dequeue: DequeueScript,
    finish: FinishScript,
    interval: IntervalScript,
    requeue: RequeueScript,
    metrics: MetricsScript,
    requeue_loop: Mutex<Option<(oneshot::Sender<()>, JoinHandle<()>)>>,
}

/// The multi-tenant, rate-limited job queue. Cheap to `Clone` -- the
/// `Arc`-backed inner state is shared, exactly like `ergo_queues::Queue`.
#[derive(Clone)]
pub struct SharQ {
    inner: Arc<Inner>,
}

impl SharQ {
    pub fn new(pool: RedisPool, settings: Settings) -> Self {
        Self::with_clock(pool, settings, Box::new(SystemClock))
    }

    pub fn with_clock(pool: RedisPool, settings: Settings, clock: Box<dyn Clock>) -> Self {
        SharQ {
            inner: Arc::new(Inner {
                pool,
                settings,
                clock,
                enqueue: EnqueueScript::new(),
                dequeue: DequeueScript::new(),
                finish: FinishScript::new(),
                interval: IntervalScript::new(),
                requeue: RequeueScript::new(),
                metrics: MetricsScript::new(),
                requeue_loop: Mutex::new(None),
            }),
        }
    }

    fn keys(&self) -> KeySchema<'_> {
        KeySchema::new(&self.inner.settings.key_prefix)
    }

    fn interval_floor_ms(&self) -> i64 {
        self.inner.settings.interval_floor_ms
    }

    fn validate_triple(&self, queue_type: &str, queue_id: &str, job_id: &str) -> Result<()> {
        if !is_valid_identifier(queue_type) {
            return Err(Error::BadArgument(format!(
                "invalid queue_type: {:?}",
                queue_type
            )));
        }
        if !is_valid_identifier(queue_id) {
            return Err(Error::BadArgument(format!(
                "invalid queue_id: {:?}",
                queue_id
            )));
        }
        if !is_valid_identifier(job_id) {
            return Err(Error::BadArgument(format!("invalid job_id: {:?}", job_id)));
        }
        Ok(())
    }

    /// Appends a job to `(queue_type, queue_id)`'s job list, binding its
    /// rate-limit interval on first use. Always succeeds for valid input
    /// unless the store itself fails.
    pub async fn enqueue(
        &self,
        queue_type: &str,
        queue_id: &str,
        job_id: JobId<'_>,
        payload: &[u8],
        interval_ms: i64,
    ) -> Result<String> {
        let job_id = job_id.make_id();
        self.validate_triple(queue_type, queue_id, &job_id)?;
        if !is_valid_interval(interval_ms, self.interval_floor_ms()) {
            return Err(Error::BadArgument(format!(
                "invalid interval: {}ms",
                interval_ms
            )));
        }

        let now = self.inner.clock.now_millis();
        let mut conn = self.inner.pool.get().await?;
        self.inner
            .enqueue
            .run(
                &mut conn,
                &self.inner.settings.key_prefix,
                queue_type,
                now,
                queue_id,
                &job_id,
                payload,
                interval_ms,
                self.inner.settings.counter_ttl_seconds,
            )
            .await?;

        debug!(queue_type, queue_id, job_id = %job_id, "enqueued job");
        Ok(job_id)
    }

    /// Pops the next ready job for `queue_type`, rate-limited round-robin
    /// across tenants. `None` means no ready work, never an error.
    pub async fn dequeue(&self, queue_type: &str) -> Result<Option<DequeuedJob>> {
        if !is_valid_identifier(queue_type) {
            return Err(Error::BadArgument(format!(
                "invalid queue_type: {:?}",
                queue_type
            )));
        }

        let now = self.inner.clock.now_millis();
        let mut conn = self.inner.pool.get().await?;
        self.inner
            .dequeue
            .run(
                &mut conn,
                &self.inner.settings.key_prefix,
                queue_type,
                now,
                self.inner.settings.job_expire_interval_ms,
                self.inner.settings.counter_ttl_seconds,
            )
            .await
    }

    /// Marks a dequeued job finished, removing it from the active set and
    /// deleting its payload. `false` means the job was already finished or
    /// had expired, never an error.
    pub async fn finish(&self, queue_type: &str, queue_id: &str, job_id: &str) -> Result<bool> {
        self.validate_triple(queue_type, queue_id, job_id)?;

        let mut conn = self.inner.pool.get().await?;
        self.inner
            .finish
            .run(
                &mut conn,
                &self.inner.settings.key_prefix,
                queue_type,
                queue_id,
                job_id,
            )
            .await
    }

    /// Updates a tenant's rate-limit interval. Takes effect on the next
    /// dequeue of this tenant, never the current ready score (see
    /// DESIGN.md). `false` means the tenant is unknown (no job list, no
    /// existing binding).
    pub async fn interval(
        &self,
        queue_type: &str,
        queue_id: &str,
        interval_ms: i64,
    ) -> Result<bool> {
        if !is_valid_identifier(queue_type) {
            return Err(Error::BadArgument(format!(
                "invalid queue_type: {:?}",
                queue_type
            )));
        }
        if !is_valid_identifier(queue_id) {
            return Err(Error::BadArgument(format!(
                "invalid queue_id: {:?}",
                queue_id
            )));
        }
        if !is_valid_interval(interval_ms, self.interval_floor_ms()) {
            return Err(Error::BadArgument(format!(
                "invalid interval: {}ms",
                interval_ms
            )));
        }

        let keys = self.keys();
        let interval_hash_key = keys.interval_hash();
        let job_list_key = keys.job_list(queue_type, queue_id);
        let field = KeySchema::interval_field(queue_type, queue_id);

        let mut conn = self.inner.pool.get().await?;
        self.inner
            .interval
            .run(&mut conn, &interval_hash_key, &job_list_key, &field, interval_ms)
            .await
    }

    /// Requeues every expired in-flight job across every type with active
    /// work, split one atomic script invocation per type so no single
    /// atomic section spans all types. Returns the total number of jobs
    /// requeued.
    pub async fn requeue(&self) -> Result<usize> {
        let keys = self.keys();
        let now = self.inner.clock.now_millis();
        let mut conn = self.inner.pool.get().await?;

        let types: Vec<String> = redis::cmd("SMEMBERS")
            .arg(keys.active_type_registry())
            .query_async(&mut *conn)
            .await?;

        let mut total = 0;
        for queue_type in types {
            let requeued = self
                .inner
                .requeue
                .run(&mut conn, &self.inner.settings.key_prefix, &queue_type, now)
                .await?;
            total += requeued;
        }
        Ok(total)
    }

    /// Global metrics: every live queue type plus the last 10 minutes of
    /// aggregate throughput.
    pub async fn metrics_global(&self) -> Result<GlobalMetrics> {
        let keys = self.keys();
        let now = self.inner.clock.now_millis();
        let mut conn = self.inner.pool.get().await?;
        metrics::global(&mut conn, &keys, &self.inner.metrics, now).await
    }

    /// `metrics(queue_type)` — per-type mode: tenants with ready or
    /// in-flight work under this type.
    pub async fn metrics_by_type(&self, queue_type: &str) -> Result<TypeMetrics> {
        if !is_valid_identifier(queue_type) {
            return Err(Error::BadArgument(format!(
                "invalid queue_type: {:?}",
                queue_type
            )));
        }
        let keys = self.keys();
        let mut conn = self.inner.pool.get().await?;
        metrics::by_type(&mut conn, &keys, queue_type).await
    }

    /// `metrics(queue_type, queue_id)` — per-tenant mode.
    pub async fn metrics_by_tenant(
        &self,
        queue_type: &str,
        queue_id: &str,
    ) -> Result<TenantMetrics> {
        if !is_valid_identifier(queue_type) {
            return Err(Error::BadArgument(format!(
                "invalid queue_type: {:?}",
                queue_type
            )));
        }
        if !is_valid_identifier(queue_id) {
            return Err(Error::BadArgument(format!(
                "invalid queue_id: {:?}",
                queue_id
            )));
        }
        let keys = self.keys();
        let now = self.inner.clock.now_millis();
        let mut conn = self.inner.pool.get().await?;
        metrics::by_tenant(&mut conn, &keys, &self.inner.metrics, queue_type, queue_id, now).await
    }

    /// Validates the `queue_id`-without-`queue_type` rule without touching
    /// the store, so a transport layer can reject the request early.
    pub fn validate_metrics_selector(
        queue_type: Option<&str>,
        queue_id: Option<&str>,
    ) -> Result<()> {
        metrics::validate_selector(queue_type, queue_id)
    }

    /// Starts a background task that calls `requeue()` on a fixed
    /// interval, stopping cleanly on either an explicit `stop_requeue_loop`
    /// call or process shutdown. This is the periodic scheduler that
    /// triggers requeue -- a deployment's responsibility, not the core
    /// protocol's, but supplied here as a convenience; grounded directly in
    /// `ergo_queues::Queue::start_scheduled_jobs_enqueuer`.
    pub fn start_requeue_loop(&self, period: Duration, mut shutdown: GracefulShutdownConsumer) {
        let mut guard = self.inner.requeue_loop.lock().unwrap();
        if guard.is_some() {
            return;
        }

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let queue = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = queue.requeue().await {
                            warn!(error = %e, "requeue pass failed");
                        }
                    }
                    _ = shutdown.wait_for_shutdown() => break,
                    _ = &mut stop_rx => break,
                }
            }
        });

        *guard = Some((stop_tx, handle));
    }

    /// Stops a running requeue loop started with `start_requeue_loop`, if
    /// any, and waits for it to finish.
    pub async fn stop_requeue_loop(&self) {
        let handle = {
            let mut guard = self.inner.requeue_loop.lock().unwrap();
            guard.take()
        };
        if let Some((stop_tx, handle)) = handle {
            stop_tx.send(()).ok();
            handle.await.ok();
        }
    }
}
