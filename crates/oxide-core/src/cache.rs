//! Cache types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum number of cache keys accepted per restore.
pub const MAX_KEY_COUNT: usize = 8;

/// Maximum key length in characters; longer keys are truncated.
pub const MAX_KEY_LENGTH: usize = 512;

/// Extension of archives written by the cache save step.
pub const ARCHIVE_SUFFIX: &str = "tzst";

/// Part size used for ranged downloads (50 MiB).
pub const DEFAULT_PART_SIZE: u64 = 50 * 1024 * 1024;

/// Delay between failed download attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Timeout applied to each prefix listing.
pub const PREFIX_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// A validated cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already validated key. Use `oxide_cache::validate_keys` for
    /// untrusted input.
    pub fn new_unchecked(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Object name probed for an exact match.
    pub fn archive_name(&self) -> String {
        format!("{}.{}", self.0, ARCHIVE_SUFFIX)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A resolved object in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectReference {
    /// Full object name.
    pub name: String,
    /// Whether the name came from an exact probe rather than a prefix scan.
    pub exact_match: bool,
}

impl ObjectReference {
    pub fn exact(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exact_match: true,
        }
    }

    pub fn prefixed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exact_match: false,
        }
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Request to restore a cache archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Candidate keys, most preferred first.
    pub cache_keys: Vec<String>,
    /// Where the archive is written.
    pub destination: PathBuf,
    /// Extra attempts after the first failed transfer.
    #[serde(default)]
    pub max_retries: u32,
}

/// Existence of an object in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Exists,
    Missing,
}

/// Chunked transfer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Size of each ranged part in bytes.
    pub part_size: u64,
    /// Maximum parts in flight.
    pub concurrency: usize,
}

impl TransferOptions {
    pub fn new(part_size: u64, concurrency: usize) -> Self {
        Self {
            part_size: part_size.max(1),
            concurrency: concurrency.max(1),
        }
    }
}

/// Fixed-delay retry budget for whole transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total attempts including the first.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Result of a successful restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreOutcome {
    /// The object that was downloaded.
    pub matched_key: String,
    /// Whether it was an exact match.
    pub exact_match: bool,
    /// Bytes written to the destination.
    pub bytes_written: u64,
    /// Transfer attempts used.
    pub attempts: u32,
    /// Time taken to restore in milliseconds.
    pub duration_ms: u64,
}
