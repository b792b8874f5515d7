//! Video call session orchestration
//!
//! Drives a communication SDK through one call: credentials are resolved,
//! a session is connected, a local publisher is created with bounded retry
//! and published, remote streams get subscriber placeholders, and network
//! loss triggers a reconnect followed by a fresh publish. Media, signaling
//! and transport all live behind the [`sdk`] traits.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod exception;
pub mod model;
pub mod notify;
pub mod placeholder;
pub mod retry;
pub mod sdk;
pub mod server;
pub mod session;
pub mod sim;
pub mod util;

pub use error::{CallError, SdkError};
pub use session::{SessionConfig, SessionHandler, SessionSnapshot, SessionState};
