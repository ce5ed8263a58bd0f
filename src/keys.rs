//! Key schema: a pure, deterministic mapping from
//! `(prefix, queue_type, queue_id, job_id, minute)` to the Redis key names
//! named below. These are used by Rust-side code that reads outside of a
//! script (metrics, status listings); the scripts themselves rebuild the
//! same names by string concatenation in Lua (`prefix .. ':' .. queue_type
//! ..`), matching the convention `queue.py` uses when it passes
//! `[key_prefix, queue_type]` as `KEYS` and lets the Lua side do the rest.
//!
//! Keys are ASCII, colon-delimited, and case-sensitive.

pub struct KeySchema<'a> {
    pub prefix: &'a str,
}

impl<'a> KeySchema<'a> {
    pub fn new(prefix: &'a str) -> Self {
        KeySchema { prefix }
    }

    /// `P:T:Q` -- the ordered job list for one tenant.
    pub fn job_list(&self, queue_type: &str, queue_id: &str) -> String {
        format!("{}:{}:{}", self.prefix, queue_type, queue_id)
    }

    /// `P:payload` -- hash of `"T:Q:J" -> payload`.
    pub fn payload_hash(&self) -> String {
        format!("{}:payload", self.prefix)
    }

    pub fn payload_field(queue_type: &str, queue_id: &str, job_id: &str) -> String {
        format!("{}:{}:{}", queue_type, queue_id, job_id)
    }

    /// `P:interval` -- hash of `"T:Q" -> interval_ms`.
    pub fn interval_hash(&self) -> String {
        format!("{}:interval", self.prefix)
    }

    pub fn interval_field(queue_type: &str, queue_id: &str) -> String {
        format!("{}:{}", queue_type, queue_id)
    }

    /// `P:T` -- the ready set for a queue type.
    pub fn ready_set(&self, queue_type: &str) -> String {
        format!("{}:{}", self.prefix, queue_type)
    }

    /// `P:T:active` -- the active set for a queue type.
    pub fn active_set(&self, queue_type: &str) -> String {
        format!("{}:{}:active", self.prefix, queue_type)
    }

    pub fn active_member(queue_id: &str, job_id: &str) -> String {
        format!("{}:{}", queue_id, job_id)
    }

    /// `P:ready:queue_type` -- types with at least one ready tenant.
    pub fn ready_type_registry(&self) -> String {
        format!("{}:ready:queue_type", self.prefix)
    }

    /// `P:active:queue_type` -- types with at least one in-flight job.
    pub fn active_type_registry(&self) -> String {
        format!("{}:active:queue_type", self.prefix)
    }

    /// `P:enqueue:<minute>` / `P:dequeue:<minute>` -- global rate counters.
    pub fn global_counter(&self, op: CounterOp, minute: i64) -> String {
        format!("{}:{}:{}", self.prefix, op.as_str(), minute)
    }

    /// `P:T:Q:enqueue:<minute>` / `P:T:Q:dequeue:<minute>` -- per-tenant
    /// rate counters.
    pub fn tenant_counter(
        &self,
        queue_type: &str,
        queue_id: &str,
        op: CounterOp,
        minute: i64,
    ) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.prefix,
            queue_type,
            queue_id,
            op.as_str(),
            minute
        )
    }

    /// `P:T:Q` as a counter base (used by the metrics script, which derives
    /// both `enqueue` and `dequeue` counter families from one base key).
    pub fn tenant_counter_base(&self, queue_type: &str, queue_id: &str) -> String {
        format!("{}:{}:{}", self.prefix, queue_type, queue_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOp {
    Enqueue,
    Dequeue,
}

impl CounterOp {
    fn as_str(&self) -> &'static str {
        match self {
            CounterOp::Enqueue => "enqueue",
            CounterOp::Dequeue => "dequeue",
        }
    }
}

/// Floor an epoch-millisecond timestamp to its UTC minute bucket.
pub fn minute_bucket(now_millis: i64) -> i64 {
    now_millis.div_euclid(60_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_job_list_key() {
        let schema = KeySchema::new("sharq");
        assert_eq!(schema.job_list("sms", "q1"), "sharq:sms:q1");
    }

    #[test]
    fn builds_ready_and_active_set_keys() {
        let schema = KeySchema::new("sharq");
        assert_eq!(schema.ready_set("sms"), "sharq:sms");
        assert_eq!(schema.active_set("sms"), "sharq:sms:active");
    }

    #[test]
    fn builds_registries() {
        let schema = KeySchema::new("sharq");
        assert_eq!(schema.ready_type_registry(), "sharq:ready:queue_type");
        assert_eq!(schema.active_type_registry(), "sharq:active:queue_type");
    }

    #[test]
    fn builds_counter_keys() {
        let schema = KeySchema::new("sharq");
        assert_eq!(
            schema.global_counter(CounterOp::Enqueue, 123),
            "sharq:enqueue:123"
        );
        assert_eq!(
            schema.tenant_counter("sms", "q1", CounterOp::Dequeue, 123),
            "sharq:sms:q1:dequeue:123"
        );
    }

    #[test]
    fn minute_bucket_floors_towards_zero_minute() {
        assert_eq!(minute_bucket(0), 0);
        assert_eq!(minute_bucket(59_999), 0);
        assert_eq!(minute_bucket(60_000), 1);
        assert_eq!(minute_bucket(719_999), 11);
    }

    #[test]
    fn payload_and_interval_fields_are_colon_joined() {
        assert_eq!(
            KeySchema::payload_field("sms", "q1", "j1"),
            "sms:q1:j1"
        );
        assert_eq!(KeySchema::interval_field("sms", "q1"), "sms:q1");
        assert_eq!(KeySchema::active_member("q1", "j1"), "q1:j1");
    }
}
