//! Engine configuration.

use crate::error::{CounterError, Result};

/// Tuning knobs for the unique-visitor counter.
///
/// Precision and shard count are fixed per deployment: stored records carry
/// the precision they were written with, and readers reset any record whose
/// shape does not match the running configuration.
#[derive(Debug, Clone)]
pub struct CounterConfig {
    /// HLL precision `p`; every sketch holds `2^p` registers.
    pub precision: u8,
    /// Independently keyed shards per (metric, bucket) counter.
    pub shards: u32,
    /// Write attempts before giving up on a contended shard key.
    pub max_retries: u32,
    /// Fixed component of the backoff between write attempts.
    pub base_backoff_ms: u64,
    /// Upper bound of the random jitter added to each backoff.
    pub max_jitter_ms: u64,
    /// Concurrent shard reads in flight during aggregation.
    pub read_concurrency: usize,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            precision: 10, // 1024 registers, ~3.25% relative error
            shards: 8,
            max_retries: 3,
            base_backoff_ms: 20,
            max_jitter_ms: 40,
            read_concurrency: 16,
        }
    }
}

impl CounterConfig {
    /// Register count `m = 2^p`.
    pub fn registers(&self) -> usize {
        1usize << self.precision
    }

    pub fn validate(&self) -> Result<()> {
        if !(4..=18).contains(&self.precision) {
            return Err(CounterError::InvalidInput(format!(
                "precision must be in [4, 18], got {}",
                self.precision
            )));
        }
        if self.shards == 0 {
            return Err(CounterError::InvalidInput(
                "shard count must be at least 1".into(),
            ));
        }
        if self.max_retries == 0 {
            return Err(CounterError::InvalidInput(
                "max_retries must be at least 1".into(),
            ));
        }
        if self.read_concurrency == 0 {
            return Err(CounterError::InvalidInput(
                "read_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
