use std::path::PathBuf;

use clap::Parser;
use help_complete_discovery::cache::default_cache_path;
use help_complete_discovery::complete::SuggestionSource;
use help_complete_discovery::complete_command_line;
use help_complete_discovery::config::{CompletionConfig, DEFAULT_PROBE_TIMEOUT_MS};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "HELP_COMPLETE_LOG";

#[derive(Debug, Parser)]
#[command(name = "help-complete")]
#[command(about = "Print completion suggestions for a partially typed command line")]
struct Cli {
    /// Full command line typed so far, as a single argument (e.g. "mytool sub --fo").
    #[arg(allow_hyphen_values = true)]
    command_line: String,
    /// Cache file location (default: ~/.help-complete.json).
    #[arg(long, env = "HELP_COMPLETE_CACHE_FILE")]
    cache_file: Option<PathBuf>,
    /// Neither read nor write the cache.
    #[arg(long)]
    no_cache: bool,
    /// Per-attempt help timeout in milliseconds; 0 waits forever.
    #[arg(long, env = "HELP_COMPLETE_PROBE_TIMEOUT_MS", default_value_t = DEFAULT_PROBE_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Log probe attempts and cache decisions to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn build_config(cli: &Cli) -> CompletionConfig {
    let mut config = CompletionConfig::default()
        .with_cache_path(cli.cache_file.clone().unwrap_or_else(default_cache_path))
        .with_probe_timeout(CompletionConfig::probe_timeout_from_millis(cli.timeout_ms));
    if cli.no_cache {
        config = config.without_cache();
    }
    config
}

fn run(cli: Cli) -> Result<(), String> {
    let config = build_config(&cli);
    let completion =
        complete_command_line(cli.command_line.as_str(), &config).map_err(|err| err.to_string())?;

    debug!(
        count = completion.suggestions.len(),
        cached = completion.source == SuggestionSource::Cached,
        "Emitting suggestions"
    );
    for suggestion in &completion.suggestions {
        println!("{suggestion}");
    }
    Ok(())
}
