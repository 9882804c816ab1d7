//! Tracing subscriber setup
//!
//! Logs go to stderr so they never mix with the report on stdout.
//! `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` and the
//! default is `warn`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter directive for the given verbosity
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Initialize the global subscriber.
///
/// Fails if a subscriber was already installed.
pub fn init(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose)))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::{debug, warn};

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "debug");
        assert_eq!(default_directive(false), "warn");
    }

    #[test]
    fn test_logging_init() {
        // Only one subscriber per process
        let _ = init(false);

        debug!("not shown by default");
        warn!("shown by default");
    }
}
