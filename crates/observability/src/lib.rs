//! Process-wide logging setup shared by the binaries.

pub mod subscriber;

pub use subscriber::{LogFormat, ObservabilityConfig, ParseLogFormatError};

/// Initialize logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    subscriber::init(&ObservabilityConfig::from_env());
}
