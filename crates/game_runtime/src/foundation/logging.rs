//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// `default_level` is used when `RUST_LOG` is not set. Safe to call more
/// than once; only the first call installs the logger. Returns whether this
/// call installed it.
pub fn init(default_level: &str) -> bool {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

/// Flush whatever the installed logger has buffered
pub fn flush() {
    log::logger().flush();
}
