//! Deterministic 64-bit identifier hashing.

use xxhash_rust::xxh3::xxh3_64;

/// Hash an identifier to a uniform 64-bit value.
///
/// Unsalted and stable across processes: estimator correctness depends on an
/// element always landing in the same register with the same rank, regardless
/// of which shard or process records it.
#[inline]
pub fn hash64(element: &str) -> u64 {
    xxh3_64(element.as_bytes())
}
