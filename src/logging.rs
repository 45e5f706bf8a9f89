//! Diagnostic logging setup.
//!
//! Everything goes to stderr so table/JSON/CSV output on stdout stays
//! machine-readable. Filter precedence: `ENHANCE_LOG`, then `--verbose`,
//! then `[logging] level`.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::config::schema::LoggingConfig;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "ENHANCE_LOG";

/// Build the filter directive without touching global state.
pub fn filter_directive(config: &LoggingConfig, verbose: bool, env: Option<&str>) -> String {
    if let Some(directive) = env.map(str::trim).filter(|d| !d.is_empty()) {
        return directive.to_string();
    }
    if verbose {
        return "enhance=debug,info".to_string();
    }
    let level = config.level.trim();
    if level.is_empty() {
        "warn".to_string()
    } else {
        level.to_string()
    }
}

/// Install the global subscriber. Call once from `main`.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(config, verbose, env.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
}
