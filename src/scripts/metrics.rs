use itertools::Itertools;
use lazy_static::lazy_static;

use crate::error::Result;

// KEYS:
//  1. counter base key (either P, for global metrics, or P:T:Q, for
//     per-tenant metrics)
// ARGV:
//  1. now (epoch ms)
//
// Reads the last 10 one-minute buckets for both the `enqueue` and
// `dequeue` counter families rooted at the given base key. The Lua reply
// is two flat, interleaved `{minute, count, minute, count, ...}` arrays --
// the same shape `queue.py`'s `_lua_metrics` returns -- and `decode_counts`
// below is the one place that un-interleaves them into a typed
// `Vec<(minute, count)>` rather than leaving callers to index pairs by
// hand.
const METRICS_SCRIPT: &str = r##"
local base = KEYS[1]
local now = tonumber(ARGV[1])
local minute = math.floor(now / 60000)

local enqueue = {}
local dequeue = {}
for i = 0, 9 do
    local m = minute - i
    local ecount = redis.call('GET', base .. ':enqueue:' .. m)
    local dcount = redis.call('GET', base .. ':dequeue:' .. m)
    table.insert(enqueue, tostring(m))
    table.insert(enqueue, ecount or '0')
    table.insert(dequeue, tostring(m))
    table.insert(dequeue, dcount or '0')
end

return {enqueue, dequeue}
"##;

lazy_static! {
    static ref SCRIPT: redis::Script = redis::Script::new(METRICS_SCRIPT);
}

pub struct MetricsScript(&'static redis::Script);

impl MetricsScript {
    pub fn new() -> Self {
        MetricsScript(&SCRIPT)
    }

    /// Returns `(enqueue_counts, dequeue_counts)`, each a `(minute,
    /// count)` list for the last 10 minutes, most recent first.
    pub async fn run(
        &self,
        conn: &mut deadpool_redis::Connection,
        counter_base_key: &str,
        now_millis: i64,
    ) -> Result<(Vec<(i64, u64)>, Vec<(i64, u64)>)> {
        let (enqueue, dequeue): (Vec<String>, Vec<String>) = self
            .0
            .key(counter_base_key)
            .arg(now_millis)
            .invoke_async(&mut **conn)
            .await?;

        Ok((decode_counts(&enqueue), decode_counts(&dequeue)))
    }
}

impl Default for MetricsScript {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_counts(flat: &[String]) -> Vec<(i64, u64)> {
    flat.iter()
        .tuples::<(_, _)>()
        .map(|(minute, count)| {
            let minute: i64 = minute.parse().unwrap_or_default();
            let count: u64 = count.parse().unwrap_or(0);
            (minute, count)
        })
        .collect()
}
