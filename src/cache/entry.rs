//! Cache Entry Module
//!
//! Defines the metadata record and the full entry (metadata plus payload)
//! for cached media assets.

use std::cmp::Ordering;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// == Entry Metadata ==
/// Metadata for one cached asset, without its payload.
///
/// This is the record persisted in the store index and returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    /// Canonical key derived from the source locator
    pub key: String,
    /// Byte length of the payload
    pub size_bytes: u64,
    /// Set on creation and bumped on every hit
    pub last_accessed_at: DateTime<Utc>,
    /// Order of the last insert or touch, breaks ties between equal timestamps
    pub sequence: u64,
}

impl EntryMeta {
    // == Constructor ==
    /// Creates metadata for a freshly stored payload.
    pub fn new(key: impl Into<String>, size_bytes: u64, at: DateTime<Utc>, sequence: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes,
            last_accessed_at: at,
            sequence,
        }
    }

    // == Touch ==
    /// Bumps the access timestamp. Never moves it backwards.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_accessed_at {
            self.last_accessed_at = at;
        }
    }

    // == Recency Ordering ==
    /// Orders entries least recently used first.
    pub fn lru_cmp(&self, other: &Self) -> Ordering {
        self.last_accessed_at
            .cmp(&other.last_accessed_at)
            .then(self.sequence.cmp(&other.sequence))
    }
}

// == Cache Entry ==
/// A cached asset: metadata plus the opaque payload bytes.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Entry metadata
    pub meta: EntryMeta,
    /// The downloaded bytes
    pub payload: Bytes,
}

impl CacheEntry {
    /// Pairs metadata with its payload.
    pub fn new(meta: EntryMeta, payload: Bytes) -> Self {
        Self { meta, payload }
    }

    /// Canonical key of this entry.
    pub fn key(&self) -> &str {
        &self.meta.key
    }

    /// Payload length in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.meta.size_bytes
    }

    /// Checks the `size_bytes == payload.len()` invariant.
    pub fn is_consistent(&self) -> bool {
        self.meta.size_bytes == self.payload.len() as u64
    }
}
