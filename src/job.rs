//! The payload `enqueue` takes is an opaque byte string: the core neither
//! parses nor validates it, and it is passed to the Lua scripts as a
//! single binary `ARGV` entry with no delimiter wrapping -- unlike the
//! Python orchestrator this crate's enqueue script descends from, which
//! wraps the serialized payload in literal quotes before handing it to
//! Lua and strips them again on dequeue. That wrap/strip step was a
//! legacy of the Python scripting glue with no equivalent need here.
//! `serialize_payload`/`deserialize_payload` below are a convenience codec
//! for producing that byte string; `SharQ::enqueue` itself takes the
//! scalar arguments (`queue_type`, `queue_id`, `job_id`, `payload`,
//! `interval_ms`) directly rather than a bundled `Job` struct, since
//! `JobId::Auto`/`Prefix` mean the caller may not know the resolved job id
//! before the call returns (see DESIGN.md).

use serde::Serialize;

use crate::error::{Error, Result};

/// Determines how to generate a job id for callers that don't want to
/// manage their own id scheme. Purely a convenience on top of enqueue's
/// client-supplied `job_id` -- the validator still runs against whatever
/// this produces.
pub enum JobId<'a> {
    /// Autogenerate a v4 UUID.
    Auto,
    /// Concatenate the given prefix with a v4 UUID, `-` joined so the
    /// result still matches `is_valid_identifier`.
    Prefix(&'a str),
    /// Use this value as-is.
    Value(&'a str),
}

impl<'a> JobId<'a> {
    pub fn make_id(&self) -> String {
        match self {
            JobId::Auto => uuid::Uuid::new_v4().to_string(),
            JobId::Prefix(prefix) => format!("{}-{}", prefix, uuid::Uuid::new_v4()),
            JobId::Value(s) => s.to_string(),
        }
    }
}

/// Serializes a value to an opaque payload token. The core treats the
/// result as a single binary string; this default codec is JSON,
/// matching `ergo_queues`'s own `SimplePayload` test fixture
/// (`serde_json::to_vec`/`from_slice`).
pub fn serialize_payload<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(Error::from)
}

pub fn deserialize_payload<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(Error::from)
}
