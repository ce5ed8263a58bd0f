use lazy_static::lazy_static;

use crate::error::Result;

// KEYS:
//  1. key prefix (P)
//  2. queue type (T)
// ARGV:
//  1. now (epoch ms)
//  2. queue id (Q)
//  3. job id (J)
//  4. payload (opaque bytes, no delimiter wrapping)
//  5. interval (ms)
//  6. counter TTL (seconds)
//
// Appends a job to a tenant's queue, step by step: bind the interval only
// if unset (HSETNX makes this idempotent in one round trip instead of an
// EXISTS + HSET pair), append to the tail of the job list, store the
// payload, ensure ready-set + type-registry membership, then bump both
// counter families with their TTL.
const ENQUEUE_SCRIPT: &str = r##"
local prefix = KEYS[1]
local qtype = KEYS[2]
local now = tonumber(ARGV[1])
local qid = ARGV[2]
local jid = ARGV[3]
local payload = ARGV[4]
local interval = ARGV[5]
local ttl = tonumber(ARGV[6])

local interval_key = prefix .. ':interval'
local interval_field = qtype .. ':' .. qid
redis.call('HSETNX', interval_key, interval_field, interval)

local job_list_key = prefix .. ':' .. qtype .. ':' .. qid
redis.call('RPUSH', job_list_key, jid)

local payload_key = prefix .. ':payload'
local payload_field = qtype .. ':' .. qid .. ':' .. jid
redis.call('HSET', payload_key, payload_field, payload)

local ready_key = prefix .. ':' .. qtype
if redis.call('ZSCORE', ready_key, qid) == false then
    redis.call('ZADD', ready_key, now, qid)
end
redis.call('SADD', prefix .. ':ready:queue_type', qtype)

local minute = math.floor(now / 60000)
local global_counter = prefix .. ':enqueue:' .. minute
local tenant_counter = prefix .. ':' .. qtype .. ':' .. qid .. ':enqueue:' .. minute
redis.call('INCR', global_counter)
redis.call('EXPIRE', global_counter, ttl)
redis.call('INCR', tenant_counter)
redis.call('EXPIRE', tenant_counter, ttl)

return 1
"##;

lazy_static! {
    static ref SCRIPT: redis::Script = redis::Script::new(ENQUEUE_SCRIPT);
}

pub struct EnqueueScript(&'static redis::Script);

impl EnqueueScript {
    pub fn new() -> Self {
        EnqueueScript(&SCRIPT)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        conn: &mut deadpool_redis::Connection,
        prefix: &str,
        queue_type: &str,
        now_millis: i64,
        queue_id: &str,
        job_id: &str,
        payload: &[u8],
        interval_ms: i64,
        counter_ttl_seconds: i64,
    ) -> Result<()> {
        let _: i64 = self
            .0
            .key(prefix)
            .key(queue_type)
            .arg(now_millis)
            .arg(queue_id)
            .arg(job_id)
            .arg(payload)
            .arg(interval_ms)
            .arg(counter_ttl_seconds)
            .invoke_async(&mut **conn)
            .await?;
        Ok(())
    }
}

impl Default for EnqueueScript {
    fn default() -> Self {
        Self::new()
    }
}
