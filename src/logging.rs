//! # Structured Logging Module
//!
//! Environment-aware tracing initialisation for hosts that don't install
//! their own subscriber. Library code only ever emits through `tracing`
//! macros; calling [`init_structured_logging`] is optional and idempotent.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialise console logging with an env-filter.
///
/// The filter is read from `SWITCHBOARD_LOG` (falling back to `RUST_LOG`
/// semantics, then `info`). Setting `SWITCHBOARD_LOG_FORMAT=json` switches
/// the output to JSON lines for log shippers. Safe to call more than once
/// and tolerant of a subscriber having been installed by the host already.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_env("SWITCHBOARD_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let json = std::env::var("SWITCHBOARD_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let result = if json {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_ansi(false).json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .try_init()
        };

        if result.is_err() {
            // A global subscriber is already set by the host application.
            tracing::debug!("global tracing subscriber already initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }
}
