//! Data models for call sessions
//!
//! This module contains the plain data exchanged between the session handler
//! and the communication SDK: credentials, streams, options and events.

pub mod credentials;
pub mod event;
pub mod options;
pub mod stream;

pub use credentials::Credentials;
pub use event::{ExceptionEvent, Reason, SessionEvent};
pub use options::{InsertMode, MediaOptions};
pub use stream::{Connection, Stream, StreamId};
