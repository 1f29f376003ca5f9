//! Completion type definitions shared by the prober, the cache, and the binary.
//!
//! The types here are deliberately small: a command line is just the text the
//! user typed, a suggestion is just a string, and a cache entry pairs a list
//! of suggestions with the moment it was computed. Cache entries serialize to
//! `{"args": [...], "timestamp": <unix seconds>}` so the persisted file stays
//! readable by hand.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maximum age of a cache entry, in seconds, before it is treated as absent.
pub const MAX_CACHE_AGE_SECS: f64 = 345_600.0;

/// In-memory form of the persisted cache: command line text to entry.
///
/// A `BTreeMap` keeps the serialized file in a stable key order.
pub type CacheMap = BTreeMap<String, CacheEntry>;

/// The text a user has typed so far, e.g. `"mytool sub --fo"`.
///
/// Never mutated. Probing works on whitespace-delimited prefixes of it.
///
/// # Examples
///
/// ```
/// use help_complete_core::CommandLine;
///
/// let line = CommandLine::new("mytool  config show --f");
/// assert_eq!(line.tokens(), vec!["mytool", "config", "show", "--f"]);
/// assert_eq!(line.as_str(), "mytool  config show --f");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandLine(String);

impl CommandLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the raw text, used verbatim as the cache key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the line on runs of whitespace.
    pub fn tokens(&self) -> Vec<String> {
        self.0.split_whitespace().map(ToOwned::to_owned).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for CommandLine {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A timestamped list of suggestions for one command line.
///
/// # Examples
///
/// ```
/// use help_complete_core::{CacheEntry, MAX_CACHE_AGE_SECS};
///
/// let entry = CacheEntry::at(vec!["--foo".into()], 1_000.0);
/// assert!(!entry.is_stale_at(1_000.0 + MAX_CACHE_AGE_SECS, MAX_CACHE_AGE_SECS));
/// assert!(entry.is_stale_at(1_001.0 + MAX_CACHE_AGE_SECS, MAX_CACHE_AGE_SECS));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Suggestions in emission order.
    pub args: Vec<String>,
    /// Seconds since the Unix epoch when the suggestions were computed.
    pub timestamp: f64,
}

impl CacheEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(args: Vec<String>) -> Self {
        Self::at(args, unix_now())
    }

    pub fn at(args: Vec<String>, timestamp: f64) -> Self {
        Self { args, timestamp }
    }

    pub fn age_secs(&self, now: f64) -> f64 {
        now - self.timestamp
    }

    /// An entry is stale once it is strictly older than `ttl_secs`.
    pub fn is_stale_at(&self, now: f64, ttl_secs: f64) -> bool {
        self.age_secs(now) > ttl_secs
    }

    pub fn is_stale(&self, ttl_secs: f64) -> bool {
        self.is_stale_at(unix_now(), ttl_secs)
    }
}

/// Returns `true` when there is no entry or the entry has outlived
/// [`MAX_CACHE_AGE_SECS`].
///
/// # Examples
///
/// ```
/// use help_complete_core::{CacheEntry, is_stale};
///
/// assert!(is_stale(None));
/// assert!(!is_stale(Some(&CacheEntry::new(vec!["x".into()]))));
/// ```
pub fn is_stale(entry: Option<&CacheEntry>) -> bool {
    entry.is_none_or(|entry| entry.is_stale(MAX_CACHE_AGE_SECS))
}

/// Current time as fractional seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    let now = chrono::Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_tokens_collapse_whitespace() {
        let line = CommandLine::new("  tool\tsub   --fo ");
        assert_eq!(line.tokens(), vec!["tool", "sub", "--fo"]);
        assert!(!line.is_blank());
        assert!(CommandLine::new(" \t ").is_blank());
    }

    #[test]
    fn test_staleness_boundary() {
        let now = unix_now();
        let old = CacheEntry::at(vec!["a".into()], now - 345_601.0);
        let recent = CacheEntry::at(vec!["a".into()], now - 345_599.0);

        assert!(old.is_stale_at(now, MAX_CACHE_AGE_SECS));
        assert!(!recent.is_stale_at(now, MAX_CACHE_AGE_SECS));
        assert!(is_stale(Some(&old)));
        assert!(!is_stale(Some(&recent)));
    }

    #[test]
    fn test_exact_ttl_age_is_fresh() {
        let entry = CacheEntry::at(Vec::new(), 100.0);
        assert!(!entry.is_stale_at(100.0 + MAX_CACHE_AGE_SECS, MAX_CACHE_AGE_SECS));
    }

    #[test]
    fn test_missing_entry_is_stale() {
        assert!(is_stale(None));
    }

    #[test]
    fn test_entry_serializes_with_args_and_timestamp() {
        let entry = CacheEntry::at(vec!["--foo".into(), "run".into()], 1_700_000_000.5);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["args"], serde_json::json!(["--foo", "run"]));
        assert_eq!(json["timestamp"], serde_json::json!(1_700_000_000.5));
    }

    #[test]
    fn test_cache_map_parses_persisted_shape() {
        let raw = r#"{"tool run": {"args": ["--port"], "timestamp": 12.0}}"#;
        let map: CacheMap = serde_json::from_str(raw).unwrap();
        assert_eq!(map["tool run"].args, vec!["--port"]);
        assert_eq!(map["tool run"].timestamp, 12.0);
    }

    #[test]
    fn test_unix_now_is_after_2020() {
        assert!(unix_now() > 1_577_836_800.0);
    }
}
