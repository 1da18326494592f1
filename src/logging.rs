use tracing_subscriber::EnvFilter;

/// Filter directives are read from this variable (`EnvFilter` syntax).
pub const LOG_ENV: &str = "RESGUARD_LOG";

/// Install the stderr subscriber. Warnings only unless `RESGUARD_LOG` says
/// otherwise, so a clean hook run prints nothing.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
