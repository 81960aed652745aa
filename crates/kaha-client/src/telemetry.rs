//! # Telemetry
//!
//! Structured logging for the register.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages (every backend call)
//! - `RUST_LOG=kaha=trace` - Trace level for Kaha crates only
//! - Default: `info,kaha=debug,reqwest=warn`

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info,kaha=debug,reqwest=warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global `fmt` subscriber.
///
/// Returns `false` when a subscriber was already installed (the host app
/// may have set up its own), in which case nothing changes.
pub fn init_tracing() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_second_init_is_harmless() {
        init_tracing();
        assert!(!init_tracing());
    }
}
