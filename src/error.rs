//! Crate error taxonomy.
//!
//! Only structurally invalid input escapes the engine as an error. Write-path
//! failures (store outage, retry budget exhausted under contention) degrade to
//! a boolean `false` in `record_unique_event`; read-path per-shard failures
//! degrade that shard to an empty sketch. Malformed stored records are not an
//! error value at all: the codec classifies them and the reader resets them
//! to empty.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CounterError>;

#[derive(Debug, Error)]
pub enum CounterError {
    /// The backing store failed an I/O operation.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A guarded write lost every attempt of its retry budget.
    #[error("write contention: {attempts} attempts exhausted")]
    WriteContention { attempts: u32 },

    /// Caller-supplied metric or range rejected before any store access.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Persisted record failed to serialize.
    #[error("codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}
