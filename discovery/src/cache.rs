//! Suggestion cache persisted as a single JSON file.
//!
//! The whole mapping is read once at startup and rewritten in full whenever an
//! entry is upserted. There is no locking: two concurrent completions may both
//! write, and the later write wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use help_complete_core::{CacheEntry, CacheMap};
use tracing::{debug, info};

/// File name of the cache inside the home directory.
pub const CACHE_FILE_NAME: &str = ".help-complete.json";

/// Environment variable that disables cache writes when set to a non-empty
/// value.
pub const CACHING_OFF_ENV: &str = "HELP_COMPLETE_CACHING_OFF";

/// Typed error for cache file operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed.
    #[error("cache I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but is not a valid cache mapping.
    #[error("malformed cache file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize cache: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Read/write access to cached suggestions, keyed by command line text.
pub trait SuggestionStore {
    fn lookup(&self, key: &str) -> Option<CacheEntry>;

    /// Replaces the entry for `key` with `suggestions` stamped now.
    fn upsert(&mut self, key: &str, suggestions: &[String]) -> Result<(), CacheError>;
}

/// Decides, at write time, whether an upsert may touch the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePolicy {
    Always,
    Never,
    /// Writes are skipped while the named variable holds a non-empty value.
    Env(String),
}

impl WritePolicy {
    pub fn from_env() -> Self {
        Self::Env(CACHING_OFF_ENV.to_string())
    }

    pub fn allows_write(&self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Env(var) => !is_truthy(std::env::var(var).ok().as_deref()),
        }
    }
}

impl Default for WritePolicy {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Any non-empty value counts as set.
pub fn is_truthy(value: Option<&str>) -> bool {
    value.is_some_and(|value| !value.is_empty())
}

/// Default cache location (`~/.help-complete.json`).
///
/// Falls back to the current directory when no home directory is known.
pub fn default_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_FILE_NAME)
}

/// File-backed suggestion cache.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: CacheMap,
    policy: WritePolicy,
}

impl FileCache {
    /// Loads the cache at `path`. A missing file is an empty cache; a
    /// malformed one is an error.
    pub fn load(path: impl Into<PathBuf>, policy: WritePolicy) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| CacheError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No cache file yet");
                CacheMap::new()
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        Ok(Self {
            path,
            entries,
            policy,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &CacheMap {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        let raw = serde_json::to_string(&self.entries).map_err(CacheError::Serialize)?;
        fs::write(&self.path, raw).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl SuggestionStore for FileCache {
    fn lookup(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).cloned()
    }

    fn upsert(&mut self, key: &str, suggestions: &[String]) -> Result<(), CacheError> {
        if !self.policy.allows_write() {
            debug!(key, "Cache writes disabled, skipping store");
            return Ok(());
        }
        self.entries
            .insert(key.to_string(), CacheEntry::new(suggestions.to_vec()));
        self.persist()?;
        info!(
            key,
            count = suggestions.len(),
            path = %self.path.display(),
            "Stored suggestions"
        );
        Ok(())
    }
}

/// In-memory store, used when caching is turned off and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: CacheMap,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: CacheMap) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &CacheMap {
        &self.entries
    }
}

impl SuggestionStore for MemoryStore {
    fn lookup(&self, key: &str) -> Option<CacheEntry> {
        self.entries.get(key).cloned()
    }

    fn upsert(&mut self, key: &str, suggestions: &[String]) -> Result<(), CacheError> {
        self.entries
            .insert(key.to_string(), CacheEntry::new(suggestions.to_vec()));
        Ok(())
    }
}

impl<T: SuggestionStore + ?Sized> SuggestionStore for Box<T> {
    fn lookup(&self, key: &str) -> Option<CacheEntry> {
        (**self).lookup(key)
    }

    fn upsert(&mut self, key: &str, suggestions: &[String]) -> Result<(), CacheError> {
        (**self).upsert(key, suggestions)
    }
}
