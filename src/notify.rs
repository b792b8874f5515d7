//! User-visible notifications
//!
//! Only two failures reach the user: publisher initialization exhaustion and
//! publish-attempt exhaustion. Both use [`NETWORK_ALERT`].

use parking_lot::Mutex;
use tracing::error;

pub const NETWORK_ALERT: &str =
    "Unable to establish a connection due to network issues. Please check your connection and try again.";

/// A blocking alert shown to the user.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Prints alerts to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        error!("Alert shown to user: {}", message);
        eprintln!("\n!! {message}\n");
    }
}

/// Keeps alerts in memory.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}
