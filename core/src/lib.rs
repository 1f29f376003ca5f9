//! Core types for help-text driven shell completion.
//!
//! This crate defines the small data model shared by the discovery crate and
//! the `help-complete` binary:
//!
//! - [`CommandLine`]: the partially typed command line being completed.
//! - [`CacheEntry`]: suggestions plus the time they were computed.
//! - [`CacheMap`]: the persisted mapping from command line to entry.
//!
//! Staleness is decided by [`is_stale`] against [`MAX_CACHE_AGE_SECS`].
//!
//! # Example
//!
//! ```
//! use help_complete_core::*;
//!
//! let mut cache = CacheMap::new();
//! cache.insert(
//!     "mytool run".to_string(),
//!     CacheEntry::new(vec!["--port".to_string()]),
//! );
//!
//! assert!(!is_stale(cache.get("mytool run")));
//! assert!(is_stale(cache.get("mytool build")));
//! ```

mod types;

pub use types::*;
