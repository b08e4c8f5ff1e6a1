//! Log subscriber setup for hosts embedding the engine.
//!
//! The library itself only emits `tracing` events; nothing is printed until
//! the host installs a subscriber.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the filter directives, e.g.
/// `RESPIRA_LOG=respira_core=debug`.
pub const LOG_ENV: &str = "RESPIRA_LOG";

/// Install a global fmt subscriber filtered by `RESPIRA_LOG`, falling back
/// to `default_directive`. Returns false if a subscriber was already set.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        let _ = init_logging("warn");
        assert!(!init_logging("warn"));
    }
}
