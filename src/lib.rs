//! Approximate unique-visitor counting engine.
//!
//! HyperLogLog cardinality sketches sharded across a versioned key-value
//! blob store:
//! - Fixed-precision HLL registers with update/merge/estimate
//! - Optimistic-concurrency writes with bounded, jittered retries
//! - Per-(metric, UTC day) buckets plus a lifetime `all` bucket
//! - Read-side fan-out with commutative merge folds
//!
//! The persistence backend is consumed through the [`store::SketchStore`]
//! contract; [`store::MemoryStore`] is the bundled reference backend for
//! tests and embedded setups.

pub mod bucket;
pub mod config;
pub mod counter;
pub mod error;
pub mod retry;
pub mod sketch;
pub mod store;

pub use bucket::Bucket;
pub use config::CounterConfig;
pub use counter::{ShardPolicy, UniqueCounter};
pub use error::{CounterError, Result};
pub use sketch::Sketch;
pub use store::{
    ExpectedVersion, MemoryStore, PutOutcome, SketchStore, VersionToken, VersionedValue,
};
