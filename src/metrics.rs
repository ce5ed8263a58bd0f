//! The metrics reader. Wraps [`crate::scripts::MetricsScript`] with three
//! presentation modes -- global, per-type, and per-tenant -- mirroring the
//! three branches of `queue.py`'s own `metrics()` method (`if queue_type is
//! None`, `elif queue_id is None`, `else`).

use std::collections::HashSet;

use deadpool_redis::Connection;

use crate::error::{Error, Result};
use crate::keys::KeySchema;
use crate::scripts::MetricsScript;

/// One minute's worth of enqueue/dequeue activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteCounts {
    pub minute: i64,
    pub enqueued: u64,
    pub dequeued: u64,
}

fn zip_counts(enqueued: Vec<(i64, u64)>, dequeued: Vec<(i64, u64)>) -> Vec<MinuteCounts> {
    enqueued
        .into_iter()
        .zip(dequeued)
        .map(|((minute, enq), (_, deq))| MinuteCounts {
            minute,
            enqueued: enq,
            dequeued: deq,
        })
        .collect()
}

/// Global metrics: every known queue type plus the last 10 minutes of
/// aggregate throughput.
#[derive(Debug, Clone)]
pub struct GlobalMetrics {
    pub queue_types: Vec<String>,
    pub counts: Vec<MinuteCounts>,
}

/// Per-type metrics: every tenant with ready or in-flight work under this
/// type, as a single deduplicated set -- the union of the ready set and
/// the active set's `Q` components, matching `queue.py`'s
/// `list(set(ready_queues) | set(active_queues))`.
#[derive(Debug, Clone)]
pub struct TypeMetrics {
    pub queue_ids: Vec<String>,
}

/// Per-tenant metrics: queue depth plus the last 10 minutes of throughput
/// for this one `(queue_type, queue_id)` pair.
#[derive(Debug, Clone)]
pub struct TenantMetrics {
    pub pending_jobs: u64,
    pub counts: Vec<MinuteCounts>,
}

pub(crate) async fn global(
    conn: &mut Connection,
    keys: &KeySchema<'_>,
    script: &MetricsScript,
    now_millis: i64,
) -> Result<GlobalMetrics> {
    let ready: Vec<String> = redis::cmd("SMEMBERS")
        .arg(keys.ready_type_registry())
        .query_async(&mut **conn)
        .await?;
    let active: Vec<String> = redis::cmd("SMEMBERS")
        .arg(keys.active_type_registry())
        .query_async(&mut **conn)
        .await?;

    let mut queue_types = ready;
    for t in active {
        if !queue_types.contains(&t) {
            queue_types.push(t);
        }
    }

    let (enqueued, dequeued) = script.run(conn, keys.prefix, now_millis).await?;
    Ok(GlobalMetrics {
        queue_types,
        counts: zip_counts(enqueued, dequeued),
    })
}

pub(crate) async fn by_type(
    conn: &mut Connection,
    keys: &KeySchema<'_>,
    queue_type: &str,
) -> Result<TypeMetrics> {
    let ready_queue_ids: Vec<String> = redis::cmd("ZRANGE")
        .arg(keys.ready_set(queue_type))
        .arg(0)
        .arg(-1)
        .query_async(&mut **conn)
        .await?;

    let active_members: Vec<String> = redis::cmd("ZRANGE")
        .arg(keys.active_set(queue_type))
        .arg(0)
        .arg(-1)
        .query_async(&mut **conn)
        .await?;

    let mut queue_ids: HashSet<String> = ready_queue_ids.into_iter().collect();
    queue_ids.extend(
        active_members
            .iter()
            .filter_map(|member| member.split_once(':').map(|(qid, _jid)| qid.to_string())),
    );

    Ok(TypeMetrics {
        queue_ids: queue_ids.into_iter().collect(),
    })
}

pub(crate) async fn by_tenant(
    conn: &mut Connection,
    keys: &KeySchema<'_>,
    script: &MetricsScript,
    queue_type: &str,
    queue_id: &str,
    now_millis: i64,
) -> Result<TenantMetrics> {
    let pending_jobs: u64 = redis::cmd("LLEN")
        .arg(keys.job_list(queue_type, queue_id))
        .query_async(&mut **conn)
        .await?;

    let base = keys.tenant_counter_base(queue_type, queue_id);
    let (enqueued, dequeued) = script.run(conn, &base, now_millis).await?;

    Ok(TenantMetrics {
        pending_jobs,
        counts: zip_counts(enqueued, dequeued),
    })
}

/// `queue_id` without `queue_type` is meaningless -- reject it before
/// touching Redis.
pub(crate) fn validate_selector(queue_type: Option<&str>, queue_id: Option<&str>) -> Result<()> {
    if queue_type.is_none() && queue_id.is_some() {
        return Err(Error::BadArgument(
            "queue_id requires queue_type".to_string(),
        ));
    }
    Ok(())
}
