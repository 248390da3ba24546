//! In-memory reference store.
//!
//! Implements the same versioned-CAS contract production backends adapt to,
//! with per-key generation counters as version tokens. The map's entry API
//! gives each guarded write per-key atomicity.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::{ExpectedVersion, PutOutcome, SketchStore, VersionToken, VersionedValue};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, (VersionToken, Bytes)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All stored keys, unordered.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

#[async_trait]
impl SketchStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<VersionedValue>> {
        Ok(self.entries.get(key).map(|entry| VersionedValue {
            value: entry.1.clone(),
            version: entry.0,
        }))
    }

    async fn put(&self, key: &str, value: Bytes, expected: ExpectedVersion) -> Result<PutOutcome> {
        let modified = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => match expected {
                ExpectedVersion::Exists(version) if occupied.get().0 == version => {
                    occupied.insert((VersionToken(version.0 + 1), value));
                    true
                }
                _ => false,
            },
            Entry::Vacant(vacant) => match expected {
                ExpectedVersion::CreateOnly => {
                    vacant.insert((VersionToken(1), value));
                    true
                }
                ExpectedVersion::Exists(_) => false,
            },
        };
        Ok(PutOutcome { modified })
    }
}
