use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::error::SdkError;

/// Install the global `tracing` subscriber.
///
/// Defaults to `info` unless `RUST_LOG` says otherwise. Calling it twice is
/// harmless; the second subscriber is ignored.
pub fn init_log() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Log an SDK failure under a category tag, e.g. `[Session] Error (Code: 1006): ...`.
pub fn log_error(kind: &str, error: &SdkError) {
    error!("[{}] {}", kind, error);
}
