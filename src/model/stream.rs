//! Remote stream and connection descriptors
//!
//! Streams are identified by the id the SDK assigns them. The session handler
//! keys subscriber placeholders on [`StreamId`].

use std::fmt;
use std::ops::Deref;

/// Identifier of a remote stream as assigned by the SDK.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        StreamId(id.into())
    }
}

impl Deref for StreamId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote stream announced by a `streamCreated` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stream {
    pub id: StreamId,
    /// Connection that owns the stream.
    pub connection_id: String,
}

impl Stream {
    pub fn new(id: impl Into<String>, connection_id: impl Into<String>) -> Self {
        Stream {
            id: StreamId::new(id),
            connection_id: connection_id.into(),
        }
    }
}

/// A remote participant's connection to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: String,
}
