//! Log output for the valuecache binary
//!
//! Logs go to stderr so stdout carries only the cached document. The level is
//! taken from `RUST_LOG` and defaults to `warn`.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset or invalid
const DEFAULT_FILTER: &str = "warn";

/// Installs the global tracing subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init();
        init();
        tracing::debug!("logging initialised twice without panicking");
    }
}
