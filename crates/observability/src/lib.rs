//! Process-wide tracing setup shared by the binaries.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize tracing/logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    subscriber::init(LogFormat::from_env());
}
