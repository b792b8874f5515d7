//! Capability surface of the communication SDK
//!
//! The session handler never talks to media or the network directly. It drives
//! an implementation of these traits, which owns signaling, ICE and media.
//! Completion callbacks of the SDK map onto the returned futures; event
//! listeners map onto channels.

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::error::SdkError;
use crate::model::{ExceptionEvent, MediaOptions, SessionEvent, Stream};

/// The local outgoing media stream.
///
/// A publisher starts acquiring its capture device as soon as it is created.
/// [`LocalPublisher::ready`] resolves once that completes or fails. A failed
/// publisher must not be reused.
#[async_trait]
pub trait LocalPublisher: Send + Sync + 'static {
    fn id(&self) -> &str;

    async fn ready(&mut self) -> Result<(), SdkError>;

    /// Release the capture resource. Must tolerate repeated calls.
    fn destroy(&mut self);
}

/// A single logical connection to a room.
#[async_trait]
pub trait RtcSession: Send + Sync + 'static {
    type Publisher: LocalPublisher;

    /// Connect, or reconnect after a network loss.
    async fn connect(&self, token: &str) -> Result<(), SdkError>;

    async fn publish(&self, publisher: &Self::Publisher) -> Result<(), SdkError>;

    async fn subscribe(
        &self,
        stream: &Stream,
        target: &str,
        options: &MediaOptions,
    ) -> Result<(), SdkError>;

    fn disconnect(&self);
}

/// Entry point of the SDK.
pub trait RtcSdk: Send + Sync + 'static {
    type Publisher: LocalPublisher;
    type Session: RtcSession<Publisher = Self::Publisher>;

    /// Create a session object and the receiver its events are delivered on.
    fn init_session(
        &self,
        api_key: &str,
        session_id: &str,
    ) -> (Self::Session, mpsc::UnboundedReceiver<SessionEvent>);

    /// Start acquiring a local publisher attached to `target`.
    fn init_publisher(&self, target: &str, options: &MediaOptions) -> Self::Publisher;

    /// Subscribe to the global exception channel.
    fn exceptions(&self) -> broadcast::Receiver<ExceptionEvent>;

    fn check_system_requirements(&self) -> bool;
}
