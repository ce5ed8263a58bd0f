use lazy_static::lazy_static;

use crate::error::Result;

// KEYS:
//  1. P:interval
//  2. P:T:Q (job list, used only for its existence)
// ARGV:
//  1. "T:Q" field
//  2. new interval (ms)
//
// Updates a tenant's rate-limit interval. This only changes the binding
// that a *future* dequeue reads when rescoring `Q`; it never touches `Q`'s
// current score in the ready set (see DESIGN.md for why the change is
// deferred rather than applied retroactively).
const INTERVAL_SCRIPT: &str = r##"
local interval_key = KEYS[1]
local job_list_key = KEYS[2]
local field = ARGV[1]
local interval = ARGV[2]

local list_exists = redis.call('EXISTS', job_list_key) == 1
local field_exists = redis.call('HEXISTS', interval_key, field) == 1

if (not list_exists) and (not field_exists) then
    return 0
end

redis.call('HSET', interval_key, field, interval)
return 1
"##;

lazy_static! {
    static ref SCRIPT: redis::Script = redis::Script::new(INTERVAL_SCRIPT);
}

pub struct IntervalScript(&'static redis::Script);

impl IntervalScript {
    pub fn new() -> Self {
        IntervalScript(&SCRIPT)
    }

    pub async fn run(
        &self,
        conn: &mut deadpool_redis::Connection,
        interval_hash_key: &str,
        job_list_key: &str,
        field: &str,
        interval_ms: i64,
    ) -> Result<bool> {
        let updated: bool = self
            .0
            .key(interval_hash_key)
            .key(job_list_key)
            .arg(field)
            .arg(interval_ms)
            .invoke_async(&mut **conn)
            .await?;
        Ok(updated)
    }
}

impl Default for IntervalScript {
    fn default() -> Self {
        Self::new()
    }
}
