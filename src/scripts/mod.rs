//! The five atomic ops, each a `redis::Script` compiled once
//! at process start and wrapped in a small struct with a typed `run()`,
//! mirroring `ergo_queues`'s one-struct-per-script pattern
//! (`StartWorkScript`, `JobDoneScript`, `JobCancelScript`, `UpdateJobScript`,
//! `GetJobScript`). `KEYS[1]` is always the configured key prefix `P` and
//! `KEYS[2]` (where relevant) is the queue type `T`; every other key name
//! used inside a script is built by Lua string concatenation from those
//! two, exactly as the upstream Python `sharq.queue.SharQ` passes
//! `keys=[self._key_prefix, queue_type]` to `self._lua_*`.

pub mod dequeue;
pub mod enqueue;
pub mod finish;
pub mod interval;
pub mod metrics;
pub mod requeue;

pub use dequeue::{DequeueScript, DequeuedJob};
pub use enqueue::EnqueueScript;
pub use finish::FinishScript;
pub use interval::IntervalScript;
pub use metrics::MetricsScript;
pub use requeue::RequeueScript;
