use lazy_static::lazy_static;

use crate::error::Result;

// KEYS:
//  1. key prefix (P)
//  2. queue type (T)
// ARGV:
//  1. now (epoch ms)
//  2. visibility timeout (expire_ms)
//  3. counter TTL (seconds)
//
// Pops the next ready job. The invariant that `Q` is in the ready set iff
// its job list is non-empty is maintained by every other script, so the
// `LPOP` here is never against an empty list -- there is no defensive
// branch for that. Order matters: remove `Q` from the ready set (or
// rescore it) before checking whether the type registry entry should go
// away, and move the job into the active set only after the payload has
// been read.
const DEQUEUE_SCRIPT: &str = r##"
local prefix = KEYS[1]
local qtype = KEYS[2]
local now = tonumber(ARGV[1])
local expire_ms = tonumber(ARGV[2])
local ttl = tonumber(ARGV[3])

local ready_key = prefix .. ':' .. qtype
local candidates = redis.call('ZRANGEBYSCORE', ready_key, '-inf', now, 'LIMIT', 0, 1)
if #candidates == 0 then
    return false
end
local qid = candidates[1]

local job_list_key = prefix .. ':' .. qtype .. ':' .. qid
local jid = redis.call('LPOP', job_list_key)

local payload_key = prefix .. ':payload'
local payload_field = qtype .. ':' .. qid .. ':' .. jid
local payload = redis.call('HGET', payload_key, payload_field)

if redis.call('LLEN', job_list_key) == 0 then
    redis.call('ZREM', ready_key, qid)
else
    local interval_key = prefix .. ':interval'
    local interval_field = qtype .. ':' .. qid
    local interval = tonumber(redis.call('HGET', interval_key, interval_field)) or 0
    redis.call('ZADD', ready_key, now + interval, qid)
end

if redis.call('ZCARD', ready_key) == 0 then
    redis.call('SREM', prefix .. ':ready:queue_type', qtype)
end

local active_key = prefix .. ':' .. qtype .. ':active'
redis.call('ZADD', active_key, now + expire_ms, qid .. ':' .. jid)
redis.call('SADD', prefix .. ':active:queue_type', qtype)

local minute = math.floor(now / 60000)
local global_counter = prefix .. ':dequeue:' .. minute
local tenant_counter = prefix .. ':' .. qtype .. ':' .. qid .. ':dequeue:' .. minute
redis.call('INCR', global_counter)
redis.call('EXPIRE', global_counter, ttl)
redis.call('INCR', tenant_counter)
redis.call('EXPIRE', tenant_counter, ttl)

return {qid, jid, payload}
"##;

lazy_static! {
    static ref SCRIPT: redis::Script = redis::Script::new(DEQUEUE_SCRIPT);
}

/// A successfully dequeued job.
pub struct DequeuedJob {
    pub queue_id: String,
    pub job_id: String,
    pub payload: Vec<u8>,
}

pub struct DequeueScript(&'static redis::Script);

impl DequeueScript {
    pub fn new() -> Self {
        DequeueScript(&SCRIPT)
    }

    pub async fn run(
        &self,
        conn: &mut deadpool_redis::Connection,
        prefix: &str,
        queue_type: &str,
        now_millis: i64,
        expire_ms: i64,
        counter_ttl_seconds: i64,
    ) -> Result<Option<DequeuedJob>> {
        let reply: Option<(String, String, Vec<u8>)> = self
            .0
            .key(prefix)
            .key(queue_type)
            .arg(now_millis)
            .arg(expire_ms)
            .arg(counter_ttl_seconds)
            .invoke_async(&mut **conn)
            .await?;

        Ok(reply.map(|(queue_id, job_id, payload)| DequeuedJob {
            queue_id,
            job_id,
            payload,
        }))
    }
}

impl Default for DequeueScript {
    fn default() -> Self {
        Self::new()
    }
}
