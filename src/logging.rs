//! Diagnostic logging on stderr.
//!
//! Standard output is reserved for the report, so every `tracing` event goes
//! to stderr. `RUST_LOG` wins over the configured level when set.

use tracing_subscriber::EnvFilter;

const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Raise `base` by `verbosity` steps, saturating at "trace".
pub fn effective_level(base: &str, verbosity: u8) -> &'static str {
    let start = LEVELS
        .iter()
        .position(|level| level.eq_ignore_ascii_case(base))
        .unwrap_or(1);
    LEVELS[(start + verbosity as usize).min(LEVELS.len() - 1)]
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init(base: &str, verbosity: u8) {
    let level = effective_level(base, verbosity);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("notedup={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_target(false)
        .without_time()
        .try_init();
}
