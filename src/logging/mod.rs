use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs a global `tracing` subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `default_directive` (for example `"openmw_mod_utils=info"`). Returns
/// `false` when a subscriber was already installed.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
