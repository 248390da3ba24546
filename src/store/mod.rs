//! Versioned sketch storage.
//!
//! The engine consumes an abstract KV blob contract: strongly consistent
//! `get` returning a version token, and `put` guarded by an expected version
//! (or create-only for first writes). Production deployments adapt their
//! blob backend to [`SketchStore`]; [`memory::MemoryStore`] is the bundled
//! reference implementation used by tests and embedded setups.

pub mod codec;
pub mod memory;

pub use codec::{decode_record, encode_record, DecodedSketch};
pub use memory::MemoryStore;

use async_trait::async_trait;
use bytes::Bytes;

use crate::bucket::Bucket;
use crate::error::Result;

/// Opaque per-key version observed at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionToken(pub u64);

/// Version guard for [`SketchStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Succeed only if the key does not exist yet.
    CreateOnly,
    /// Succeed only if the stored version still matches.
    Exists(VersionToken),
}

/// A stored blob plus the version it was read at.
#[derive(Debug, Clone)]
pub struct VersionedValue {
    pub value: Bytes,
    pub version: VersionToken,
}

/// Result of a guarded write. A lost version race is not an error: the store
/// reports `modified == false` and the caller re-reads and retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutOutcome {
    pub modified: bool,
}

/// Abstract versioned KV contract over sketch blobs.
#[async_trait]
pub trait SketchStore: Send + Sync {
    /// Strongly consistent read of `key`. Stale reads break CAS correctness.
    async fn get(&self, key: &str) -> Result<Option<VersionedValue>>;

    /// Guarded write of `key` under `expected`.
    async fn put(&self, key: &str, value: Bytes, expected: ExpectedVersion) -> Result<PutOutcome>;
}

/// Storage key for one shard of one (metric, bucket) counter:
/// `"<metric>/<dayBucketOrAll>/<shardIndex>"`.
///
/// Reproduced bit-for-bit against previously stored data, so existing
/// counters survive redeployments.
pub fn sketch_key(metric: &str, bucket: Bucket, shard: u32) -> String {
    format!("{}/{}/{}", metric, bucket, shard)
}
