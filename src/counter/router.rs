//! Shard selection for the write path.
//!
//! Sharding exists purely to spread write contention across S independently
//! keyed sketches: merge is commutative and location-independent, so any
//! placement policy yields identical estimates once shards are merged at
//! read time.

use rand::Rng;

/// How a writer picks a shard in `[0, shards)`.
#[derive(Debug, Clone, Copy)]
pub enum ShardPolicy {
    /// Uniform random placement; bounds worst-case single-key contention to
    /// roughly `1/S` of the write traffic for a metric/bucket.
    Random,
    /// Pin every write to one shard. Tests use this to force contention.
    Fixed(u32),
}

#[derive(Debug, Clone)]
pub struct ShardRouter {
    shards: u32,
    policy: ShardPolicy,
}

impl ShardRouter {
    pub fn new(shards: u32, policy: ShardPolicy) -> Self {
        Self {
            shards: shards.max(1),
            policy,
        }
    }

    /// Shard index for one write attempt. The random policy re-rolls on
    /// every call, so a retried write may land on a less contended shard.
    pub fn pick(&self) -> u32 {
        match self.policy {
            ShardPolicy::Random => rand::thread_rng().gen_range(0..self.shards),
            ShardPolicy::Fixed(shard) => shard % self.shards,
        }
    }

    pub fn shards(&self) -> u32 {
        self.shards
    }
}
