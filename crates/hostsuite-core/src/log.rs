//! Process-wide `tracing` setup for plugins.
//!
//! Hosts give plugins no console, so nothing is installed unless the plugin
//! asks for it. The filter comes from `HOSTSUITE_LOG` and defaults to `warn`.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "HOSTSUITE_LOG";

static INIT: OnceCell<bool> = OnceCell::new();

/// Install a stderr fmt subscriber once per process.
///
/// Returns `false` when another subscriber was already set as the global default.
pub fn init_logging() -> bool {
    *INIT.get_or_init(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init()
            .is_ok()
    })
}
