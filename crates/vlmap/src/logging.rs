//! Logging initialization.
//!
//! Uses the `tracing` ecosystem with human-readable or JSON output on stderr.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `level` - Default filter directive when `RUST_LOG` is unset.
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
///
/// # Notes
///
/// - Log output goes to stderr (stdout carries command results)
/// - The RUST_LOG environment variable overrides the level
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging from the `[logging]` config section, with CLI overrides.
pub fn init_from_config(config: &vlmap_core::Config, verbose: bool, json_logs: bool) {
    let level = effective_level(&config.logging.level, verbose);
    let json_format = json_logs || config.logging.format == "json";
    init(level, json_format);
}

/// `--verbose` raises anything quieter than debug to debug.
fn effective_level(configured: &str, verbose: bool) -> &str {
    if verbose && !matches!(configured, "debug" | "trace") {
        "debug"
    } else {
        configured
    }
}
