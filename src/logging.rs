//! Structured logging setup on top of `tracing`.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Unknown names fall back to INFO.
pub fn parse_level(name: &str) -> Level {
    match name.trim().to_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "DEBUG" => Level::DEBUG,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Installs the global subscriber once per process; later calls are ignored.
///
/// `RUST_LOG` directives are honoured on top of `level`. Output goes to
/// stderr so stdout stays free for command results.
pub fn init_logging(level: &str, json: bool) {
    let level = parse_level(level);

    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env().add_directive(level.into());

        let builder = tracing_subscriber::fmt()
            .with_target(true)
            .with_writer(std::io::stderr)
            .with_env_filter(filter);

        let installed = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };

        if installed.is_ok() {
            tracing::debug!(%level, json, "logging initialized");
        }
    });
}
