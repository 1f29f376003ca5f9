//! Completion suggestions discovered from a tool's own `--help` output.
//!
//! Nothing about the wrapped tool's grammar is hardcoded. For a partially
//! typed command line the crate:
//!
//! 1. looks the line up in a [`cache::SuggestionStore`];
//! 2. on a miss, runs the tool with `--help` appended, dropping trailing
//!    tokens until the tool accepts the prefix ([`probe::Prober`]);
//! 3. scrapes positional choices and `--flags` from the help text
//!    ([`extractor::TextExtractor`]);
//! 4. stores the suggestions for next time.
//!
//! # Main entry points
//!
//! - [`complete_command_line`]: one-shot completion using a
//!   [`config::CompletionConfig`].
//! - [`complete::Completer`]: the same flow with injectable store, runner,
//!   and extractor.
//! - [`extractor::extract_positional`] and [`extractor::extract_optional`]:
//!   pure text scans, no process is run.
//!
//! # Example
//!
//! ```
//! use help_complete_discovery::extractor::{ArgparseExtractor, TextExtractor};
//!
//! let help = "usage: mytool {serve, build} [-h]\n  --port PORT\n";
//! assert_eq!(
//!     ArgparseExtractor.extract(help),
//!     vec!["serve", "build", "--port"]
//! );
//! ```

pub mod cache;
pub mod complete;
pub mod config;
pub mod extractor;
pub mod probe;

use complete::{CompleteError, Completer, Completion};
use config::CompletionConfig;
use extractor::ArgparseExtractor;
use help_complete_core::CommandLine;
use probe::{ProcessRunner, Prober};

/// Completes `command_line` against the real tool using `config`.
///
/// Opens the configured store, probes the tool as a child process, and
/// extracts argparse-style suggestions.
pub fn complete_command_line(
    command_line: impl Into<CommandLine>,
    config: &CompletionConfig,
) -> Result<Completion, CompleteError> {
    let store = config.open_store()?;
    let prober = Prober::new(ProcessRunner::new(config.probe_timeout));
    Completer::new(store, prober, ArgparseExtractor).complete(command_line)
}
