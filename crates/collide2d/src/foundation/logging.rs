//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// Hosts call this once at simulation start. A second call leaves the
/// existing logger in place and reports that through it.
pub fn init() {
    if let Err(e) = env_logger::builder().try_init() {
        log::warn!("Logging already initialized: {e}");
    }
}
