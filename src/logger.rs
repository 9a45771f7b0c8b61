/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    if let Err(e) = fmt().with_env_filter(filter).with_target(false).try_init() {
        debug!("Tracing subscriber already installed, keeping it: {e}");
    }
}


use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};
