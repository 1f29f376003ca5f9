//! End-to-end completion: cache lookup, help probing, extraction, store.

use help_complete_core::{CommandLine, MAX_CACHE_AGE_SECS};
use tracing::debug;

use crate::cache::{CacheError, SuggestionStore};
use crate::extractor::TextExtractor;
use crate::probe::{HelpRunner, ProbeError, Prober};

/// Typed error for a completion request.
#[derive(Debug, thiserror::Error)]
pub enum CompleteError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Where a completion's suggestions came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionSource {
    /// A fresh cache entry; the tool was not run.
    Cached,
    /// The tool's help output was probed and extracted.
    Probed,
}

/// Suggestions for one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub suggestions: Vec<String>,
    pub source: SuggestionSource,
}

/// Wires a store, a prober, and an extractor together.
pub struct Completer<S, R, E> {
    store: S,
    prober: Prober<R>,
    extractor: E,
    ttl_secs: f64,
}

impl<S, R, E> Completer<S, R, E>
where
    S: SuggestionStore,
    R: HelpRunner,
    E: TextExtractor,
{
    pub fn new(store: S, prober: Prober<R>, extractor: E) -> Self {
        Self {
            store,
            prober,
            extractor,
            ttl_secs: MAX_CACHE_AGE_SECS,
        }
    }

    pub fn with_ttl_secs(mut self, ttl_secs: f64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn prober(&self) -> &Prober<R> {
        &self.prober
    }

    /// Returns suggestions for `command_line`.
    ///
    /// A fresh cache entry is returned and re-stored with the current time,
    /// so lines in regular use do not expire. Otherwise the tool is probed,
    /// the help text extracted, and the result stored under the raw line.
    pub fn complete(
        &mut self,
        command_line: impl Into<CommandLine>,
    ) -> Result<Completion, CompleteError> {
        let command_line = command_line.into();
        let key = command_line.as_str();

        if let Some(entry) = self.store.lookup(key) {
            if !entry.is_stale(self.ttl_secs) {
                debug!(key, count = entry.args.len(), "Cache hit");
                // A hit restarts the entry's age.
                self.store.upsert(key, &entry.args)?;
                return Ok(Completion {
                    suggestions: entry.args,
                    source: SuggestionSource::Cached,
                });
            }
            debug!(key, "Cache entry is stale");
        } else {
            debug!(key, "Cache miss");
        }

        let help_text = self.prober.probe(command_line.clone())?;
        let suggestions = self.extractor.extract(&help_text);
        self.store.upsert(key, &suggestions)?;

        Ok(Completion {
            suggestions,
            source: SuggestionSource::Probed,
        })
    }
}
