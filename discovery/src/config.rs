//! Runtime configuration for a completion request.
//!
//! The binary fills this in from command-line flags and environment
//! variables; library users can build it directly.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use help_complete_discovery::config::CompletionConfig;
//!
//! let config = CompletionConfig::default().with_probe_timeout(Some(Duration::from_secs(2)));
//! assert!(config.use_cache);
//! assert_eq!(config.probe_timeout, Some(Duration::from_secs(2)));
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{
    CacheError, FileCache, MemoryStore, SuggestionStore, WritePolicy, default_cache_path,
};

/// Default per-attempt wait before a help invocation is killed.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Location of the persisted cache file.
    pub cache_path: PathBuf,
    /// When `false` nothing is read from or written to disk.
    pub use_cache: bool,
    /// Per-attempt timeout; `None` waits forever.
    pub probe_timeout: Option<Duration>,
    /// Checked on every store, not only at startup.
    pub write_policy: WritePolicy,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            use_cache: true,
            probe_timeout: Some(Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS)),
            write_policy: WritePolicy::from_env(),
        }
    }
}

impl CompletionConfig {
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// `0` disables the timeout.
    pub fn probe_timeout_from_millis(millis: u64) -> Option<Duration> {
        (millis > 0).then(|| Duration::from_millis(millis))
    }

    /// Opens the store this configuration describes.
    pub fn open_store(&self) -> Result<Box<dyn SuggestionStore>, CacheError> {
        if self.use_cache {
            let cache = FileCache::load(&self.cache_path, self.write_policy.clone())?;
            Ok(Box::new(cache))
        } else {
            Ok(Box::new(MemoryStore::new()))
        }
    }
}
