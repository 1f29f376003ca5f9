//! Suggestion extraction from captured help text.
//!
//! Extraction is a pair of regex scans tuned for argparse-style help output:
//!
//! - positional choices appear as a brace group, e.g. `{train,run,shell}`;
//! - optional arguments appear as `--flag` tokens.
//!
//! Both scans are heuristic. Help text in any other convention simply yields
//! no suggestions. Alternative conventions plug in through [`TextExtractor`].
//!
//! # Example
//!
//! ```
//! use help_complete_discovery::extractor::{ArgparseExtractor, TextExtractor};
//!
//! let help = "\
//! usage: mytool [-h] {train,run} ...
//!
//! optional arguments:
//!   -h, --help  show this help message and exit
//!   --version   print the version
//! ";
//!
//! let suggestions = ArgparseExtractor.extract(help);
//! assert_eq!(suggestions, vec!["train", "run", "--help", "--version"]);
//! ```

use std::sync::LazyLock;

use regex::Regex;

// Greedy: with several brace groups on one line this spans from the first
// `{` to the last `}`.
static POSITIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(.*)\}").expect("static regex must compile"));

static OPTIONAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\[](--\S+)").expect("static regex must compile"));

/// Turns a block of help text into completion suggestions.
pub trait TextExtractor {
    fn extract(&self, help_text: &str) -> Vec<String>;
}

/// Extractor for argparse-style help: positional choices first, then flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgparseExtractor;

impl TextExtractor for ArgparseExtractor {
    fn extract(&self, help_text: &str) -> Vec<String> {
        let mut suggestions = extract_positional(help_text);
        suggestions.extend(extract_optional(help_text));
        suggestions
    }
}

/// Returns the comma-separated choices of the first `{...}` group.
///
/// Each choice is trimmed; empty choices are kept as empty strings.
///
/// ```
/// use help_complete_discovery::extractor::extract_positional;
///
/// assert_eq!(extract_positional("cmd {a, b, c} --help"), vec!["a", "b", "c"]);
/// assert!(extract_positional("no braces here").is_empty());
/// ```
pub fn extract_positional(text: &str) -> Vec<String> {
    let Some(captures) = POSITIONAL_RE.captures(text) else {
        return Vec::new();
    };
    captures
        .get(1)
        .map(|group| {
            group
                .as_str()
                .split(',')
                .map(str::trim)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Returns every `--flag` token not directly preceded by `[`, in text order.
///
/// A flag at the very start of the text has no preceding character and is
/// not matched.
///
/// ```
/// use help_complete_discovery::extractor::extract_optional;
///
/// assert_eq!(extract_optional(" cmd --foo --bar baz"), vec!["--foo", "--bar"]);
/// assert!(extract_optional("x[--hidden").is_empty());
/// ```
pub fn extract_optional(text: &str) -> Vec<String> {
    OPTIONAL_RE
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|flag| flag.as_str().trim().to_string())
        .collect()
}
