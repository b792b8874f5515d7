//! Error types for call sessions.

use thiserror::Error;

/// SDK code for ICE workflow failures, the one failure the publish path
/// recovers from.
pub const WORKFLOW_ERROR_CODE: i64 = 1500;

/// Code the SDK reports when a session cannot reach the room.
pub const CONNECT_FAILED_ERROR_CODE: i64 = 1006;

/// A failure reported by the communication SDK through a completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error (Code: {code}): {message}")]
pub struct SdkError {
    pub code: i64,
    pub message: String,
}

impl SdkError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        SdkError {
            code,
            message: message.into(),
        }
    }

    /// ICE workflow / network failure.
    pub fn is_workflow(&self) -> bool {
        self.code == WORKFLOW_ERROR_CODE
    }
}

/// Errors surfaced by the call session components.
#[derive(Debug, Error)]
pub enum CallError {
    /// Credentials could not be obtained from the credential endpoint.
    #[error("failed to fetch session credentials: {0}")]
    CredentialFetch(String),

    /// `Session.connect` reported an error.
    #[error("failed to connect to session: {0}")]
    SessionConnect(SdkError),

    /// Every publisher initialization attempt failed. Carries the error of
    /// the final attempt.
    #[error("publisher initialization failed after {attempts} attempts: {last}")]
    PublisherInit { attempts: u32, last: SdkError },

    /// Subscribing to a remote stream failed.
    #[error("failed to subscribe to stream {stream}: {source}")]
    Subscribe { stream: String, source: SdkError },

    /// Reconnecting after a network loss failed.
    #[error("failed to reconnect to session: {0}")]
    Reconnect(SdkError),

    /// A global SDK exception with a code the handler does not act on.
    #[error("unrecognized SDK exception: {0}")]
    UnrecognizedSdkException(SdkError),

    /// Startup configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for CallError {
    fn from(e: reqwest::Error) -> Self {
        CallError::CredentialFetch(e.to_string())
    }
}
