//! Logging initialization.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Options for environment-based initialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct InitOptions {
    /// Whether verbose output was requested via CLI.
    pub verbose: bool,
    /// Emit JSON-formatted log lines instead of the human format.
    pub json: bool,
}

static LOGGING_INIT: OnceLock<()> = OnceLock::new();

/// Initializes the tracing subscriber once.
///
/// `RUST_LOG` wins when set; otherwise the filter defaults to `info` for
/// this crate and the HTTP trace layer, or `debug` under `--verbose`.
/// Subsequent calls are no-ops.
pub fn init(options: InitOptions) {
    LOGGING_INIT.get_or_init(|| {
        let default_directives = if options.verbose {
            "gitnotes=debug,tower_http=debug"
        } else {
            "gitnotes=info,tower_http=info"
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false);
        if options.json {
            let _ = builder.json().try_init();
        } else {
            let _ = builder.try_init();
        }
    });
}
