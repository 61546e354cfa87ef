//! Logging utilities
//!
//! Everything in this crate logs through the `log` facade with the emitting
//! component in parentheses, e.g. `(WindowManager) Window ... created`.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize logging with a default level, still overridable by `RUST_LOG`
///
/// Returns `false` if a logger was already installed.
pub fn try_init_with_level(level: log::LevelFilter) -> bool {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .is_ok()
}
