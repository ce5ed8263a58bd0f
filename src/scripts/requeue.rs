use lazy_static::lazy_static;

use crate::error::Result;

// KEYS:
//  1. key prefix (P)
//  2. queue type (T)
// ARGV:
//  1. now (epoch ms)
//
// Requeues expired in-flight jobs for a single queue type. The client-side
// driver (`queue::SharQ::requeue`) enumerates `P:active:queue_type` and
// invokes this once per type, so that no single atomic section spans all
// types, mirroring `queue.py`'s own `requeue()`, which loops over
// `smembers('%s:active:queue_type')` in Python and calls the Lua script
// once per member.
const REQUEUE_SCRIPT: &str = r##"
local prefix = KEYS[1]
local qtype = KEYS[2]
local now = tonumber(ARGV[1])

local active_key = prefix .. ':' .. qtype .. ':active'
local ready_key = prefix .. ':' .. qtype

local expired = redis.call('ZRANGEBYSCORE', active_key, '-inf', now)
local count = 0
for _, member in ipairs(expired) do
    local sep = string.find(member, ':')
    local qid = string.sub(member, 1, sep - 1)
    local jid = string.sub(member, sep + 1)

    redis.call('ZREM', active_key, member)
    redis.call('LPUSH', prefix .. ':' .. qtype .. ':' .. qid, jid)

    if redis.call('ZSCORE', ready_key, qid) == false then
        redis.call('ZADD', ready_key, now, qid)
    end
    redis.call('SADD', prefix .. ':ready:queue_type', qtype)

    count = count + 1
end

if redis.call('ZCARD', active_key) == 0 then
    redis.call('SREM', prefix .. ':active:queue_type', qtype)
end

return count
"##;

lazy_static! {
    static ref SCRIPT: redis::Script = redis::Script::new(REQUEUE_SCRIPT);
}

pub struct RequeueScript(&'static redis::Script);

impl RequeueScript {
    pub fn new() -> Self {
        RequeueScript(&SCRIPT)
    }

    pub async fn run(
        &self,
        conn: &mut deadpool_redis::Connection,
        prefix: &str,
        queue_type: &str,
        now_millis: i64,
    ) -> Result<usize> {
        let count: usize = self
            .0
            .key(prefix)
            .key(queue_type)
            .arg(now_millis)
            .invoke_async(&mut **conn)
            .await?;
        Ok(count)
    }
}

impl Default for RequeueScript {
    fn default() -> Self {
        Self::new()
    }
}
