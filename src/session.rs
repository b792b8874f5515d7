//! Session lifecycle handling
//!
//! [`SessionHandler`] owns one session from credential resolution to teardown.
//! It runs a single `select!` loop over three sources: session events, the
//! global exception channel, and at most one in-flight connect or publish
//! operation. Subscriptions run alongside and only ever log their failures.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Publishing
//!                     |             |  ^         |  (publish error: re-init, re-publish)
//!                     v             v  |         v
//!               Disconnected    Reconnecting <---+  (networkDisconnected)
//!                                   |
//!                                   v
//!                               Disconnected (reconnect failed)
//! ```

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::error::{CallError, SdkError, CONNECT_FAILED_ERROR_CODE};
use crate::exception::handle_exception;
use crate::model::{Credentials, MediaOptions, SessionEvent, Stream, StreamId};
use crate::notify::{Notifier, NETWORK_ALERT};
use crate::placeholder::PlaceholderRegistry;
use crate::retry::{initialize_with_retry, RetryPolicy, ScopedPublisher};
use crate::sdk::{LocalPublisher, RtcSdk, RtcSession};
use crate::util::log_error;

/// Error-triggered re-publishes allowed before giving up.
pub const DEFAULT_MAX_PUBLISH_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Publishing,
    Reconnecting,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Element the local publisher is attached to.
    pub publisher_target: String,
    /// Container subscriber placeholders are created in.
    pub subscriber_container: String,
    pub publisher_options: MediaOptions,
    pub subscriber_options: MediaOptions,
    pub init_policy: RetryPolicy,
    pub max_publish_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            publisher_target: "publisher".to_string(),
            subscriber_container: "subscriber".to_string(),
            publisher_options: MediaOptions::default(),
            subscriber_options: MediaOptions::default(),
            init_policy: RetryPolicy::default(),
            max_publish_attempts: DEFAULT_MAX_PUBLISH_ATTEMPTS,
        }
    }
}

/// Observable view of the handler, published after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    /// Every state entered so far, in order, starting with `Disconnected`.
    pub transitions: Vec<SessionState>,
    pub placeholders: Vec<StreamId>,
    pub publish_attempts: u32,
    /// Id of the publisher currently published to the session.
    pub published: Option<String>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        SessionSnapshot {
            state: SessionState::Disconnected,
            transitions: vec![SessionState::Disconnected],
            placeholders: vec![],
            publish_attempts: 0,
            published: None,
        }
    }
}

/// Everything that lives exactly as long as one session.
struct SessionContext<S: RtcSdk> {
    credentials: Credentials,
    session: Arc<S::Session>,
    /// Owned on behalf of the session once published.
    publisher: Option<ScopedPublisher<S::Publisher>>,
    /// Error-triggered re-publishes since the last successful publish.
    publish_attempts: u32,
    placeholders: PlaceholderRegistry,
}

impl<S: RtcSdk> SessionContext<S> {
    /// Drop the publisher and remote placeholders; they do not survive a lost
    /// connection.
    fn invalidate(&mut self) {
        self.publisher = None;
        let dropped = self.placeholders.clear();
        if dropped > 0 {
            info!(
                "Removed {} subscriber placeholders from '{}'",
                dropped,
                self.placeholders.container()
            );
        }
    }
}

/// Completion of the in-flight operation.
enum Step<P: LocalPublisher> {
    Connected(Result<(), SdkError>),
    PublisherReady(Result<ScopedPublisher<P>, CallError>),
    Published(Result<ScopedPublisher<P>, SdkError>),
}

type Pending<P> = Option<BoxFuture<'static, Step<P>>>;
type Subscription = BoxFuture<'static, (StreamId, Result<(), SdkError>)>;

/// What the loop should do after handling an input.
enum Flow {
    Continue,
    Stop(Result<(), CallError>),
}

pub struct SessionHandler<S: RtcSdk> {
    sdk: Arc<S>,
    config: SessionConfig,
    notifier: Arc<dyn Notifier>,
    state: SessionState,
    transitions: Vec<SessionState>,
    snapshot: watch::Sender<SessionSnapshot>,
}

impl<S: RtcSdk> SessionHandler<S> {
    pub fn new(sdk: Arc<S>, config: SessionConfig, notifier: Arc<dyn Notifier>) -> Self {
        let (snapshot, _) = watch::channel(SessionSnapshot::default());
        SessionHandler {
            sdk,
            config,
            notifier,
            state: SessionState::Disconnected,
            transitions: vec![SessionState::Disconnected],
            snapshot,
        }
    }

    /// Receiver for [`SessionSnapshot`]s. Keeps the last snapshot after the
    /// handler finishes.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    /// Open the session and handle it until it ends.
    ///
    /// Returns `Ok` when the session ends by a non-network disconnect or
    /// `shutdown`, and an error when the initial connect or a reconnect fails.
    pub async fn run<F>(mut self, credentials: Credentials, shutdown: F) -> Result<(), CallError>
    where
        F: Future<Output = ()>,
    {
        let mut exceptions = self.sdk.exceptions();
        let mut exceptions_open = true;

        let (session, mut events) = self
            .sdk
            .init_session(&credentials.api_key, &credentials.session_id);
        let mut ctx = SessionContext::<S> {
            credentials,
            session: Arc::new(session),
            publisher: None,
            publish_attempts: 0,
            placeholders: PlaceholderRegistry::new(self.config.subscriber_container.clone()),
        };

        let mut subscriptions: FuturesUnordered<Subscription> = FuturesUnordered::new();
        self.transition(SessionState::Connecting, &ctx);
        let mut pending: Pending<S::Publisher> = Some(connect_op(&ctx));

        tokio::pin!(shutdown);

        let result = loop {
            let flow = tokio::select! {
                step = poll_pending(&mut pending) => {
                    pending = None;
                    self.handle_step(step, &mut ctx, &mut pending)
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event, &mut ctx, &mut pending, &mut subscriptions),
                    None => {
                        warn!("Session event channel closed");
                        Flow::Stop(Ok(()))
                    }
                },
                exception = exceptions.recv(), if exceptions_open => {
                    match exception {
                        Ok(event) => {
                            let kind = handle_exception(&event);
                            debug!("SDK exception {} handled as {:?}", event.code, kind);
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Missed {} SDK exceptions", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            exceptions_open = false;
                        }
                    }
                    Flow::Continue
                }
                Some((stream_id, result)) = subscriptions.next(), if !subscriptions.is_empty() => {
                    match result {
                        Ok(()) => info!("Subscribed to stream {}", stream_id),
                        Err(e) => log_error("Subscribe", &e),
                    }
                    Flow::Continue
                }
                _ = &mut shutdown => {
                    info!("Shutting down, disconnecting from session");
                    ctx.session.disconnect();
                    Flow::Stop(Ok(()))
                }
            };

            self.publish_snapshot(&ctx);

            if let Flow::Stop(result) = flow {
                break result;
            }
        };

        drop(pending);
        drop(subscriptions);
        self.teardown(&mut ctx);
        result
    }

    fn handle_step(
        &mut self,
        step: Step<S::Publisher>,
        ctx: &mut SessionContext<S>,
        pending: &mut Pending<S::Publisher>,
    ) -> Flow {
        match step {
            Step::Connected(Ok(())) => {
                if self.state == SessionState::Reconnecting {
                    info!("Session reconnected successfully.");
                    ctx.publish_attempts = 0;
                } else {
                    info!("Session connected successfully.");
                }
                self.transition(SessionState::Connected, ctx);
                *pending = Some(self.init_op());
                Flow::Continue
            }
            Step::Connected(Err(e)) => {
                let reconnecting = self.state == SessionState::Reconnecting;
                log_error("Session", &e);
                self.transition(SessionState::Disconnected, ctx);

                if reconnecting {
                    error!("Reconnect failed, giving up on the session");
                    Flow::Stop(Err(CallError::Reconnect(e)))
                } else {
                    Flow::Stop(Err(CallError::SessionConnect(e)))
                }
            }
            Step::PublisherReady(Ok(publisher)) => {
                self.transition(SessionState::Publishing, ctx);
                *pending = Some(publish_op(ctx.session.clone(), publisher));
                Flow::Continue
            }
            Step::PublisherReady(Err(e)) => {
                error!("Failed to initialize the publisher: {}", e);
                warn!("Unable to initialize the publisher. Please check your connection and try again.");
                self.notifier.alert(NETWORK_ALERT);
                self.transition(SessionState::Connected, ctx);
                Flow::Continue
            }
            Step::Published(Ok(publisher)) => {
                info!("Publisher {} published to the session.", publisher.id());
                ctx.publisher = Some(publisher);
                ctx.publish_attempts = 0;
                Flow::Continue
            }
            Step::Published(Err(e)) => {
                log_error("Publisher", &e);

                if !e.is_workflow() {
                    error!("Unrecoverable publisher error: {}", e.message);
                    self.transition(SessionState::Connected, ctx);
                    return Flow::Continue;
                }

                if ctx.publish_attempts >= self.config.max_publish_attempts {
                    error!(
                        "Failed to recover from publisher error after {} attempts: {}",
                        ctx.publish_attempts, e.message
                    );
                    self.notifier.alert(NETWORK_ALERT);
                    self.transition(SessionState::Connected, ctx);
                    return Flow::Continue;
                }

                ctx.publish_attempts += 1;
                info!(
                    "Attempting to retry publisher initialization ({}/{})...",
                    ctx.publish_attempts, self.config.max_publish_attempts
                );
                *pending = Some(self.init_op());
                Flow::Continue
            }
        }
    }

    fn handle_event(
        &mut self,
        event: SessionEvent,
        ctx: &mut SessionContext<S>,
        pending: &mut Pending<S::Publisher>,
        subscriptions: &mut FuturesUnordered<Subscription>,
    ) -> Flow {
        debug!("Session event: {}", event.name());

        match event {
            SessionEvent::StreamCreated(stream) => {
                info!(
                    "Stream {} created by connection {}",
                    stream.id, stream.connection_id
                );
                let Some(placeholder) = ctx.placeholders.attach(&stream.id) else {
                    warn!("Stream {} already has a placeholder", stream.id);
                    return Flow::Continue;
                };
                let target = placeholder.element_id.clone();
                subscriptions.push(subscribe_op(
                    ctx.session.clone(),
                    stream,
                    target,
                    self.config.subscriber_options.clone(),
                ));
                Flow::Continue
            }
            SessionEvent::StreamDestroyed { stream, reason } => {
                warn!("A stream was destroyed: {}", reason);
                if reason.is_network() {
                    warn!("A stream was lost due to network issues.");
                }
                if ctx.placeholders.detach(&stream.id).is_none() {
                    debug!("No placeholder for stream {}", stream.id);
                }
                Flow::Continue
            }
            SessionEvent::ConnectionDestroyed { connection, reason } => {
                warn!("A connection was destroyed: {} ({})", reason, connection.id);
                Flow::Continue
            }
            SessionEvent::SessionDisconnected { reason } => {
                warn!("You were disconnected from the session: {}", reason);

                let live = matches!(
                    self.state,
                    SessionState::Connected | SessionState::Publishing
                );

                if reason.is_network() && live {
                    warn!("You were disconnected due to network issues. Please check your connection.");
                    // Drops any in-flight publish sequence along with its publisher.
                    *pending = None;
                    subscriptions.clear();
                    ctx.invalidate();
                    self.transition(SessionState::Reconnecting, ctx);
                    *pending = Some(connect_op(ctx));
                    return Flow::Continue;
                }

                if reason.is_network() && self.state == SessionState::Reconnecting {
                    debug!("Already reconnecting");
                    return Flow::Continue;
                }

                if self.state == SessionState::Connecting {
                    *pending = None;
                    let e = SdkError::new(
                        CONNECT_FAILED_ERROR_CODE,
                        format!("disconnected while connecting: {reason}"),
                    );
                    log_error("Session", &e);
                    self.transition(SessionState::Disconnected, ctx);
                    return Flow::Stop(Err(CallError::SessionConnect(e)));
                }

                *pending = None;
                self.transition(SessionState::Disconnected, ctx);
                Flow::Stop(Ok(()))
            }
        }
    }

    fn init_op(&self) -> BoxFuture<'static, Step<S::Publisher>> {
        let sdk = self.sdk.clone();
        let target = self.config.publisher_target.clone();
        let options = self.config.publisher_options.clone();
        let policy = self.config.init_policy;

        async move {
            Step::PublisherReady(initialize_with_retry(&*sdk, &target, &options, policy).await)
        }
        .boxed()
    }

    fn teardown(&mut self, ctx: &mut SessionContext<S>) {
        ctx.invalidate();
        if self.state != SessionState::Disconnected {
            self.transition(SessionState::Disconnected, ctx);
        }
        self.publish_snapshot(ctx);
        info!("Session {} closed", ctx.credentials.session_id);
    }

    fn transition(&mut self, next: SessionState, ctx: &SessionContext<S>) {
        if self.state != next {
            info!("Session state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        self.transitions.push(next);
        self.publish_snapshot(ctx);
    }

    fn publish_snapshot(&self, ctx: &SessionContext<S>) {
        self.snapshot.send_replace(SessionSnapshot {
            state: self.state,
            transitions: self.transitions.clone(),
            placeholders: ctx.placeholders.stream_ids(),
            publish_attempts: ctx.publish_attempts,
            published: ctx.publisher.as_ref().map(|p| p.id().to_string()),
        });
    }
}

async fn poll_pending<P: LocalPublisher>(pending: &mut Pending<P>) -> Step<P> {
    match pending {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

fn connect_op<S: RtcSdk>(ctx: &SessionContext<S>) -> BoxFuture<'static, Step<S::Publisher>> {
    let session = ctx.session.clone();
    let token = ctx.credentials.token.clone();

    async move { Step::Connected(session.connect(&token).await) }.boxed()
}

fn publish_op<T: RtcSession>(
    session: Arc<T>,
    publisher: ScopedPublisher<T::Publisher>,
) -> BoxFuture<'static, Step<T::Publisher>> {
    async move {
        match session.publish(&publisher).await {
            Ok(()) => Step::Published(Ok(publisher)),
            // The failed publisher is released here and never reused.
            Err(e) => Step::Published(Err(e)),
        }
    }
    .boxed()
}

fn subscribe_op<T: RtcSession>(
    session: Arc<T>,
    stream: Stream,
    target: String,
    options: MediaOptions,
) -> Subscription {
    async move {
        let result = session.subscribe(&stream, &target, &options).await;
        (stream.id, result)
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::WORKFLOW_ERROR_CODE;
    use crate::model::{Connection, ExceptionEvent, Reason};
    use crate::notify::RecordingNotifier;
    use crate::sim::{Outcome, SimScript, SimSdk};

    use tokio::sync::oneshot;
    use tokio::task::JoinHandle;

    use SessionState::*;

    struct Harness {
        sdk: SimSdk,
        notifier: Arc<RecordingNotifier>,
        snapshots: watch::Receiver<SessionSnapshot>,
        stop: Option<oneshot::Sender<()>>,
        task: JoinHandle<Result<(), CallError>>,
    }

    impl Harness {
        fn start(script: SimScript) -> Harness {
            Harness::start_with(script, SessionConfig::default())
        }

        fn start_with(script: SimScript, config: SessionConfig) -> Harness {
            let sdk = SimSdk::new(script);
            let notifier = Arc::new(RecordingNotifier::default());
            let handler = SessionHandler::new(Arc::new(sdk.clone()), config, notifier.clone());
            let snapshots = handler.watch();
            let (stop, stopped) = oneshot::channel::<()>();
            let task = tokio::spawn(handler.run(Credentials::new("a", "s", "t"), async move {
                let _ = stopped.await;
            }));

            Harness {
                sdk,
                notifier,
                snapshots,
                stop: Some(stop),
                task,
            }
        }

        async fn wait_for(&mut self, f: impl FnMut(&SessionSnapshot) -> bool) -> SessionSnapshot {
            tokio::time::timeout(Duration::from_secs(5), self.snapshots.wait_for(f))
                .await
                .expect("timed out waiting for session snapshot")
                .expect("handler dropped")
                .clone()
        }

        async fn settle(&self) {
            for _ in 0..50 {
                tokio::task::yield_now().await;
            }
        }

        /// Wait for the handler to end on its own.
        async fn join(mut self) -> (Result<(), CallError>, SessionSnapshot) {
            let _stop = self.stop.take();
            let result = tokio::time::timeout(Duration::from_secs(5), &mut self.task)
                .await
                .expect("handler did not stop")
                .expect("handler panicked");
            let snapshot = self.snapshots.borrow().clone();
            (result, snapshot)
        }

        async fn finish(mut self) -> (Result<(), CallError>, SessionSnapshot) {
            if let Some(stop) = self.stop.take() {
                let _ = stop.send(());
            }
            let result = tokio::time::timeout(Duration::from_secs(5), self.task)
                .await
                .expect("handler did not stop")
                .expect("handler panicked");
            let snapshot = self.snapshots.borrow().clone();
            (result, snapshot)
        }
    }

    fn workflow(msg: &str) -> Outcome {
        Outcome::Fail(SdkError::new(WORKFLOW_ERROR_CODE, msg))
    }

    fn stream_created(id: &str) -> SessionEvent {
        SessionEvent::StreamCreated(Stream::new(id, format!("conn-{id}")))
    }

    fn stream_destroyed(id: &str, reason: Reason) -> SessionEvent {
        SessionEvent::StreamDestroyed {
            stream: Stream::new(id, format!("conn-{id}")),
            reason,
        }
    }

    fn network_lost() -> SessionEvent {
        SessionEvent::SessionDisconnected {
            reason: Reason::NetworkDisconnected,
        }
    }

    #[tokio::test]
    async fn connects_then_publishes() {
        let mut h = Harness::start(SimScript::default());

        let snap = h.wait_for(|s| s.published.is_some()).await;
        assert_eq!(snap.state, Publishing);
        assert_eq!(snap.transitions, vec![Disconnected, Connecting, Connected, Publishing]);
        assert_eq!(h.sdk.stats().published, vec!["publisher-1".to_string()]);

        let (result, snap) = h.finish().await;
        assert!(result.is_ok());
        assert_eq!(snap.state, Disconnected);
    }

    #[tokio::test]
    async fn publishes_third_attempt_after_two_init_failures() {
        let mut h = Harness::start(SimScript {
            init: vec![workflow("first"), workflow("second")],
            ..Default::default()
        });

        h.wait_for(|s| s.published.is_some()).await;
        let stats = h.sdk.stats();
        assert_eq!(stats.published, vec!["publisher-3".to_string()]);
        assert_eq!(stats.publishers_created, 3);
        assert_eq!(stats.publishers_destroyed, 2);
        assert!(h.notifier.messages().is_empty());

        let sdk = h.sdk.clone();
        let _ = h.finish().await;
        assert_eq!(sdk.stats().publishers_destroyed, 3);
    }

    #[tokio::test]
    async fn init_exhaustion_alerts_and_stays_connected() {
        let mut h = Harness::start(SimScript {
            init: vec![workflow("1"), workflow("2"), workflow("3")],
            ..Default::default()
        });

        h.wait_for(|s| s.transitions.ends_with(&[Connected, Connected])).await;
        h.settle().await;
        assert_eq!(h.notifier.messages(), vec![NETWORK_ALERT.to_string()]);
        assert_eq!(h.sdk.stats().publishers_created, 3);
        assert!(h.sdk.stats().published.is_empty());
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn connect_error_is_terminal() {
        let h = Harness::start(SimScript {
            connect: vec![Outcome::Fail(SdkError::new(1006, "connect failed"))],
            ..Default::default()
        });

        let (result, snap) = h.join().await;
        assert!(matches!(result, Err(CallError::SessionConnect(e)) if e.code == 1006));
        assert_eq!(snap.transitions, vec![Disconnected, Connecting, Disconnected]);
    }

    #[tokio::test]
    async fn network_loss_while_connecting_is_a_connect_error() {
        let mut h = Harness::start(SimScript {
            connect: vec![Outcome::Hang],
            ..Default::default()
        });
        h.wait_for(|s| s.state == Connecting).await;

        assert!(h.sdk.emit(network_lost()));
        let sdk = h.sdk.clone();
        let (result, snap) = h.join().await;
        assert!(matches!(
            result,
            Err(CallError::SessionConnect(e)) if e.code == CONNECT_FAILED_ERROR_CODE
        ));
        assert_eq!(snap.transitions, vec![Disconnected, Connecting, Disconnected]);
        assert_eq!(sdk.stats().connect_tokens.len(), 1);
        assert_eq!(sdk.stats().publishers_created, 0);
    }

    #[tokio::test]
    async fn workflow_publish_error_republishes_with_a_fresh_publisher() {
        let mut h = Harness::start(SimScript {
            publish: vec![workflow("publish lost")],
            ..Default::default()
        });

        let snap = h.wait_for(|s| s.published.is_some()).await;
        assert_eq!(snap.published.as_deref(), Some("publisher-2"));
        assert_eq!(snap.publish_attempts, 0);
        assert_eq!(
            h.sdk.stats().published,
            vec!["publisher-1".to_string(), "publisher-2".to_string()]
        );
        assert_eq!(h.sdk.stats().publishers_destroyed, 1);
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn publish_attempt_ceiling_alerts_and_stops_initializing() {
        let config = SessionConfig {
            max_publish_attempts: 2,
            ..Default::default()
        };
        let mut h = Harness::start_with(
            SimScript {
                publish: vec![workflow("1"), workflow("2"), workflow("3")],
                ..Default::default()
            },
            config,
        );

        h.wait_for(|s| s.state == Connected && s.transitions.len() > 4)
            .await;
        h.settle().await;

        let stats = h.sdk.stats();
        assert_eq!(stats.published.len(), 3);
        assert_eq!(stats.publishers_created, 3);
        assert_eq!(h.notifier.messages(), vec![NETWORK_ALERT.to_string()]);
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn non_workflow_publish_error_is_not_retried() {
        let mut h = Harness::start(SimScript {
            publish: vec![Outcome::Fail(SdkError::new(1601, "internal"))],
            ..Default::default()
        });

        h.wait_for(|s| s.transitions.ends_with(&[Publishing, Connected])).await;
        h.settle().await;
        assert_eq!(h.sdk.stats().publishers_created, 1);
        assert!(h.notifier.messages().is_empty());
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn placeholders_follow_remote_streams() {
        let mut h = Harness::start(SimScript::default());
        h.wait_for(|s| s.published.is_some()).await;

        h.sdk.emit(stream_created("a"));
        h.sdk.emit(stream_created("b"));
        h.sdk.emit(stream_created("a"));
        let snap = h.wait_for(|s| s.placeholders.len() == 2).await;
        assert_eq!(snap.placeholders, vec![StreamId::new("a"), StreamId::new("b")]);

        h.sdk.emit(stream_destroyed("a", Reason::NetworkDisconnected));
        h.sdk.emit(stream_destroyed("missing", Reason::ClientDisconnected));
        let snap = h.wait_for(|s| s.placeholders.len() == 1).await;
        assert_eq!(snap.placeholders, vec![StreamId::new("b")]);

        h.settle().await;
        let mut subscribed = h.sdk.stats().subscribed;
        subscribed.sort();
        assert_eq!(
            subscribed,
            vec!["subscriber-a".to_string(), "subscriber-b".to_string()]
        );
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn subscribe_failure_keeps_the_placeholder() {
        let mut h = Harness::start(SimScript {
            subscribe: vec![Outcome::Fail(SdkError::new(1600, "no media"))],
            ..Default::default()
        });
        h.wait_for(|s| s.published.is_some()).await;

        h.sdk.emit(stream_created("a"));
        let snap = h.wait_for(|s| s.placeholders.len() == 1).await;
        h.settle().await;
        assert_eq!(snap.state, Publishing);
        assert!(h.notifier.messages().is_empty());
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn connection_destroyed_changes_nothing() {
        let mut h = Harness::start(SimScript::default());
        let before = h.wait_for(|s| s.published.is_some()).await;

        h.sdk.emit(SessionEvent::ConnectionDestroyed {
            connection: Connection {
                id: "remote".to_string(),
            },
            reason: Reason::ClientDisconnected,
        });
        h.settle().await;
        assert_eq!(*h.snapshots.borrow(), before);
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn network_loss_reconnects_and_republishes() {
        let mut h = Harness::start(SimScript::default());
        h.wait_for(|s| s.published.is_some()).await;
        h.sdk.emit(stream_created("a"));
        h.wait_for(|s| s.placeholders.len() == 1).await;

        h.sdk.emit(network_lost());
        let snap = h
            .wait_for(|s| s.published.as_deref() == Some("publisher-2"))
            .await;

        let after_loss = &snap.transitions[4..];
        assert_eq!(after_loss, &[Reconnecting, Connected, Publishing]);
        assert!(snap.placeholders.is_empty());
        let stats = h.sdk.stats();
        assert_eq!(stats.connect_tokens, vec!["t".to_string(), "t".to_string()]);
        assert_eq!(stats.publishers_destroyed, 1);
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn reconnect_failure_ends_disconnected() {
        let mut h = Harness::start(SimScript::default());
        h.wait_for(|s| s.published.is_some()).await;

        h.sdk
            .script_connect([Outcome::Fail(SdkError::new(1006, "still offline"))]);
        h.sdk.emit(network_lost());

        let (result, snap) = h.join().await;
        assert!(matches!(result, Err(CallError::Reconnect(_))));
        assert_eq!(snap.state, Disconnected);
        assert_eq!(snap.published, None);
        assert!(snap.transitions.ends_with(&[Reconnecting, Disconnected]));
    }

    #[tokio::test]
    async fn network_loss_cancels_a_hung_initialization() {
        let mut h = Harness::start(SimScript {
            init: vec![Outcome::Hang],
            ..Default::default()
        });
        h.wait_for(|s| s.state == Connected).await;
        h.settle().await;
        assert_eq!(h.sdk.stats().publishers_created, 1);

        h.sdk.emit(network_lost());
        let snap = h.wait_for(|s| s.published.is_some()).await;
        assert_eq!(snap.published.as_deref(), Some("publisher-2"));
        assert_eq!(h.sdk.stats().publishers_destroyed, 1);
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn reconnect_resets_the_publish_attempt_counter() {
        let mut h = Harness::start(SimScript {
            publish: vec![workflow("1"), Outcome::Hang],
            ..Default::default()
        });
        let snap = h
            .wait_for(|s| s.publish_attempts == 1 && s.transitions.ends_with(&[Publishing, Publishing]))
            .await;
        assert_eq!(snap.published, None);

        h.sdk.script_publish([Outcome::Hang]);
        h.sdk.emit(network_lost());
        let snap = h
            .wait_for(|s| s.transitions.contains(&Reconnecting) && s.state == Publishing)
            .await;
        assert_eq!(snap.publish_attempts, 0);
        assert_eq!(snap.published, None);
        h.settle().await;
        assert_eq!(h.sdk.stats().published.last().map(String::as_str), Some("publisher-3"));
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn client_disconnect_ends_the_session() {
        let mut h = Harness::start(SimScript::default());
        h.wait_for(|s| s.published.is_some()).await;
        h.sdk.emit(SessionEvent::SessionDisconnected {
            reason: Reason::ClientDisconnected,
        });
        h.settle().await;

        let sdk = h.sdk.clone();
        let (result, snap) = h.finish().await;
        assert!(result.is_ok());
        assert_eq!(snap.state, Disconnected);
        assert_eq!(sdk.stats().disconnects, 0);
        assert_eq!(sdk.stats().publishers_destroyed, 1);
    }

    #[tokio::test]
    async fn global_workflow_exception_does_not_trigger_recovery() {
        let mut h = Harness::start(SimScript::default());
        h.wait_for(|s| s.published.is_some()).await;

        h.sdk
            .trigger_exception(ExceptionEvent::new(WORKFLOW_ERROR_CODE, "ICE failed"));
        h.sdk.trigger_exception(ExceptionEvent::new(9999, "simulated"));
        h.settle().await;

        let stats = h.sdk.stats();
        assert_eq!(stats.publishers_created, 1);
        assert_eq!(stats.published.len(), 1);
        assert_eq!(h.snapshots.borrow().state, Publishing);
        let _ = h.finish().await;
    }

    #[tokio::test]
    async fn shutdown_releases_the_publisher() {
        let mut h = Harness::start(SimScript::default());
        h.wait_for(|s| s.published.is_some()).await;
        let sdk = h.sdk.clone();

        let (result, snap) = h.finish().await;
        assert!(result.is_ok());
        assert_eq!(snap.published, None);
        assert_eq!(sdk.stats().disconnects, 1);
        assert_eq!(sdk.stats().publishers_destroyed, 1);
    }
}
