//! Integration tests against a real Redis instance. Gated behind the
//! `test-redis` feature and `REDIS_URL`, following `ergo_queues`'s own
//! `run_queue_test` harness: a fresh key prefix per test
//! (`uuid::Uuid::new_v4()`), SCAN+DEL cleanup wrapped around
//! `catch_unwind` so a panicking assertion never leaks keys into the next
//! test.
#![cfg(feature = "test-redis")]

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use assert_matches::assert_matches;
use futures::FutureExt;

use sharq::job::JobId;
use sharq::{RedisPool, Settings, SharQ};

async fn run_queue_test<T, Fut>(test: T)
where
    T: FnOnce(SharQ) -> Fut,
    Fut: Future<Output = ()>,
{
    dotenv::dotenv().ok();
    let prefix = format!("sharq-test-{}", uuid::Uuid::new_v4());

    let mut settings = Settings::load().expect("loading settings");
    settings.key_prefix = prefix.clone();
    settings.job_expire_interval_ms = 2_000;

    let pool = RedisPool::new(Some(settings.redis_url.clone())).expect("creating redis pool");
    let queue = SharQ::new(pool.clone(), settings);

    let result = AssertUnwindSafe(test(queue)).catch_unwind().await;

    let mut conn = pool.get().await.expect("cleanup: acquiring connection");
    let key_pattern = format!("{}*", prefix);
    let mut cmd = redis::cmd("SCAN");
    let mut iter: redis::AsyncIter<String> = cmd
        .cursor_arg(0)
        .arg("MATCH")
        .arg(&key_pattern)
        .arg("COUNT")
        .arg(100)
        .clone()
        .iter_async(&mut *conn)
        .await
        .expect("cleanup: scanning keyspace");

    let mut del_cmd = redis::cmd("DEL");
    let mut any = false;
    while let Some(key) = iter.next_item().await {
        del_cmd.arg(&key);
        any = true;
    }
    if any {
        del_cmd
            .query_async::<_, ()>(&mut conn)
            .await
            .expect("cleanup: deleting keys");
    }

    result.expect("test panicked");
}

#[tokio::test]
async fn single_tenant_rate_limit() {
    run_queue_test(|queue| async move {
        queue
            .enqueue("sms", "q1", JobId::Value("j1"), b"hello", 5000)
            .await
            .expect("enqueue j1");
        queue
            .enqueue("sms", "q1", JobId::Value("j2"), b"world", 5000)
            .await
            .expect("enqueue j2");

        let first = queue.dequeue("sms").await.expect("dequeue").expect("a job");
        assert_eq!(first.queue_id, "q1");
        assert_eq!(first.job_id, "j1");
        assert_eq!(first.payload, b"hello");

        let rate_limited = queue.dequeue("sms").await.expect("dequeue");
        assert!(
            rate_limited.is_none(),
            "second tenant dequeue should still be rate-limited"
        );

        let finished = queue
            .finish("sms", "q1", "j1")
            .await
            .expect("finish j1");
        assert!(finished);

        tokio::time::sleep(Duration::from_millis(5100)).await;

        let second = queue.dequeue("sms").await.expect("dequeue").expect("a job");
        assert_eq!(second.job_id, "j2");
        assert_eq!(second.payload, b"world");
    })
    .await;
}

#[tokio::test]
async fn round_robin_across_tenants() {
    run_queue_test(|queue| async move {
        queue
            .enqueue("sms", "q1", JobId::Value("j1"), b"a", 60_000)
            .await
            .expect("enqueue q1");
        queue
            .enqueue("sms", "q2", JobId::Value("j2"), b"b", 60_000)
            .await
            .expect("enqueue q2");

        let mut seen = vec![
            queue.dequeue("sms").await.expect("dequeue").expect("a job").queue_id,
            queue.dequeue("sms").await.expect("dequeue").expect("a job").queue_id,
        ];
        seen.sort();
        assert_eq!(seen, vec!["q1".to_string(), "q2".to_string()]);

        let third = queue.dequeue("sms").await.expect("dequeue");
        assert!(third.is_none());
    })
    .await;
}

#[tokio::test]
async fn metrics_by_type_unions_ready_and_active_tenants() {
    run_queue_test(|queue| async move {
        queue
            .enqueue("sms", "q1", JobId::Value("j1"), b"a", 60_000)
            .await
            .expect("enqueue q1 j1");
        queue
            .enqueue("sms", "q1", JobId::Value("j2"), b"b", 60_000)
            .await
            .expect("enqueue q1 j2");
        queue
            .enqueue("sms", "q2", JobId::Value("j3"), b"c", 60_000)
            .await
            .expect("enqueue q2 j3");

        // q1's first job goes active (in-flight); its second job keeps q1 in
        // the ready set too, so q1 should appear exactly once in the union.
        let dequeued = queue.dequeue("sms").await.expect("dequeue").expect("a job");
        assert_eq!(dequeued.queue_id, "q1");

        let metrics = queue.metrics_by_type("sms").await.expect("metrics");
        let mut queue_ids = metrics.queue_ids;
        queue_ids.sort();
        assert_eq!(queue_ids, vec!["q1".to_string(), "q2".to_string()]);
    })
    .await;
}

#[tokio::test]
async fn expiry_and_requeue() {
    run_queue_test(|queue| async move {
        queue
            .enqueue("sms", "q1", JobId::Value("j1"), b"payload", 1000)
            .await
            .expect("enqueue");

        let dequeued = queue.dequeue("sms").await.expect("dequeue").expect("a job");
        assert_eq!(dequeued.job_id, "j1");

        tokio::time::sleep(Duration::from_millis(2100)).await;
        let requeued = queue.requeue().await.expect("requeue");
        assert_eq!(requeued, 1);

        let redone = queue.dequeue("sms").await.expect("dequeue").expect("a job");
        assert_eq!(redone.job_id, "j1");
        assert_eq!(redone.payload, b"payload");
    })
    .await;
}

#[tokio::test]
async fn unknown_interval_update_fails() {
    run_queue_test(|queue| async move {
        let updated = queue
            .interval("sms", "qX", 10_000)
            .await
            .expect("interval call");
        assert!(!updated);
    })
    .await;
}

#[tokio::test]
async fn metrics_global_counts_enqueue_and_dequeue() {
    run_queue_test(|queue| async move {
        queue
            .enqueue("sms", "q1", JobId::Value("j1"), b"a", 1000)
            .await
            .expect("enqueue 1");
        queue
            .enqueue("sms", "q1", JobId::Value("j2"), b"b", 1000)
            .await
            .expect("enqueue 2");
        queue
            .enqueue("sms", "q1", JobId::Value("j3"), b"c", 1000)
            .await
            .expect("enqueue 3");
        queue.dequeue("sms").await.expect("dequeue").expect("a job");

        let metrics = queue.metrics_global().await.expect("metrics");
        assert!(metrics.queue_types.iter().any(|t| t == "sms"));

        let current = &metrics.counts[0];
        assert_eq!(current.enqueued, 3);
        assert_eq!(current.dequeued, 1);
    })
    .await;
}

#[tokio::test]
async fn validation_rejects_bad_interval_and_dangling_queue_id() {
    run_queue_test(|queue| async move {
        let err = queue
            .enqueue("sms", "q1", JobId::Value("j1"), b"x", 50)
            .await
            .expect_err("interval below floor must be rejected");
        assert_matches!(err, sharq::Error::BadArgument(_));

        let err = SharQ::validate_metrics_selector(None, Some("q1"))
            .expect_err("queue_id without queue_type must be rejected");
        assert_matches!(err, sharq::Error::BadArgument(_));
    })
    .await;
}
