use lazy_static::lazy_static;

use crate::error::Result;

// KEYS:
//  1. key prefix (P)
//  2. queue type (T)
// ARGV:
//  1. queue id (Q)
//  2. job id (J)
//
// Marks a job finished. Idempotent-by-failure: a `ZREM` that removes
// nothing means the job already finished or expired, and nothing else in
// the script runs.
const FINISH_SCRIPT: &str = r##"
local prefix = KEYS[1]
local qtype = KEYS[2]
local qid = ARGV[1]
local jid = ARGV[2]

local active_key = prefix .. ':' .. qtype .. ':active'
local removed = redis.call('ZREM', active_key, qid .. ':' .. jid)
if removed == 0 then
    return 0
end

local payload_key = prefix .. ':payload'
redis.call('HDEL', payload_key, qtype .. ':' .. qid .. ':' .. jid)

if redis.call('ZCARD', active_key) == 0 then
    redis.call('SREM', prefix .. ':active:queue_type', qtype)
end

return 1
"##;

lazy_static! {
    static ref SCRIPT: redis::Script = redis::Script::new(FINISH_SCRIPT);
}

pub struct FinishScript(&'static redis::Script);

impl FinishScript {
    pub fn new() -> Self {
        FinishScript(&SCRIPT)
    }

    pub async fn run(
        &self,
        conn: &mut deadpool_redis::Connection,
        prefix: &str,
        queue_type: &str,
        queue_id: &str,
        job_id: &str,
    ) -> Result<bool> {
        let succeeded: bool = self
            .0
            .key(prefix)
            .key(queue_type)
            .arg(queue_id)
            .arg(job_id)
            .invoke_async(&mut **conn)
            .await?;
        Ok(succeeded)
    }
}

impl Default for FinishScript {
    fn default() -> Self {
        Self::new()
    }
}
