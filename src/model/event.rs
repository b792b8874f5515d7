//! Events emitted by the communication SDK
//!
//! Session events are delivered per session in the order the SDK produces
//! them. Exception events come from the SDK's global channel and are not tied
//! to any session.

use std::fmt;

use crate::model::stream::{Connection, Stream};

/// Why a stream, connection or session went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    ClientDisconnected,
    ForceDisconnected,
    ForceUnpublished,
    MediaStopped,
    NetworkDisconnected,
    Other(String),
}

impl Reason {
    pub fn is_network(&self) -> bool {
        matches!(self, Reason::NetworkDisconnected)
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::ClientDisconnected => f.write_str("clientDisconnected"),
            Reason::ForceDisconnected => f.write_str("forceDisconnected"),
            Reason::ForceUnpublished => f.write_str("forceUnpublished"),
            Reason::MediaStopped => f.write_str("mediaStopped"),
            Reason::NetworkDisconnected => f.write_str("networkDisconnected"),
            Reason::Other(s) => f.write_str(s),
        }
    }
}

/// Lifecycle events of a single session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A remote participant started publishing.
    StreamCreated(Stream),

    /// A remote stream went away.
    StreamDestroyed { stream: Stream, reason: Reason },

    /// A remote participant left the room.
    ConnectionDestroyed {
        connection: Connection,
        reason: Reason,
    },

    /// The local client lost its connection to the room.
    SessionDisconnected { reason: Reason },
}

impl SessionEvent {
    /// SDK-facing event name, useful for logging.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::StreamCreated(_) => "streamCreated",
            SessionEvent::StreamDestroyed { .. } => "streamDestroyed",
            SessionEvent::ConnectionDestroyed { .. } => "connectionDestroyed",
            SessionEvent::SessionDisconnected { .. } => "sessionDisconnected",
        }
    }
}

/// An event from the SDK's global `exception` channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionEvent {
    pub code: i64,
    pub message: String,
}

impl ExceptionEvent {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        ExceptionEvent {
            code,
            message: message.into(),
        }
    }
}
