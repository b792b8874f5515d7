//! Scripted in-process SDK
//!
//! Plays back a [`SimScript`] of outcomes for every SDK call and records what
//! the caller did. The binary uses it to run the call flow without a media
//! backend; the tests use it to drive failure scenarios.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::error::SdkError;
use crate::model::{ExceptionEvent, MediaOptions, Reason, SessionEvent, Stream};
use crate::sdk::{LocalPublisher, RtcSdk, RtcSession};

/// How a scripted call completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Fail(SdkError),
    /// Never completes.
    Hang,
}

impl Outcome {
    async fn resolve(self) -> Result<(), SdkError> {
        match self {
            Outcome::Ok => Ok(()),
            Outcome::Fail(e) => Err(e),
            Outcome::Hang => std::future::pending().await,
        }
    }
}

/// Outcomes consumed in order per call kind. An exhausted queue succeeds.
#[derive(Debug, Clone, Default)]
pub struct SimScript {
    pub init: Vec<Outcome>,
    pub connect: Vec<Outcome>,
    pub publish: Vec<Outcome>,
    pub subscribe: Vec<Outcome>,
    /// Streams announced right after every successful connect.
    pub remote_streams: Vec<Stream>,
    pub unsupported_platform: bool,
}

/// Counters of what the caller asked the SDK to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    pub publishers_created: u32,
    pub publishers_destroyed: u32,
    /// `(api_key, session_id)` of every session created.
    pub sessions: Vec<(String, String)>,
    /// Token passed to every connect call.
    pub connect_tokens: Vec<String>,
    /// Publisher ids in the order they were handed to `publish`.
    pub published: Vec<String>,
    /// Subscribe targets in call order.
    pub subscribed: Vec<String>,
    pub disconnects: u32,
    pub requirement_checks: u32,
}

#[derive(Debug, Default)]
struct SimState {
    init: VecDeque<Outcome>,
    connect: VecDeque<Outcome>,
    publish: VecDeque<Outcome>,
    subscribe: VecDeque<Outcome>,
    remote_streams: Vec<Stream>,
    events: Option<mpsc::UnboundedSender<SessionEvent>>,
    stats: SimStats,
}

fn next(queue: &mut VecDeque<Outcome>) -> Outcome {
    queue.pop_front().unwrap_or(Outcome::Ok)
}

#[derive(Debug, Clone)]
pub struct SimSdk {
    state: Arc<Mutex<SimState>>,
    exceptions: broadcast::Sender<ExceptionEvent>,
    supported: bool,
}

impl SimSdk {
    pub fn new(script: SimScript) -> Self {
        let (exceptions, _) = broadcast::channel(16);
        let state = SimState {
            init: script.init.into(),
            connect: script.connect.into(),
            publish: script.publish.into(),
            subscribe: script.subscribe.into(),
            remote_streams: script.remote_streams,
            ..Default::default()
        };

        SimSdk {
            state: Arc::new(Mutex::new(state)),
            exceptions,
            supported: !script.unsupported_platform,
        }
    }

    /// Deliver a session event to the current session. Returns false when no
    /// session is listening.
    pub fn emit(&self, event: SessionEvent) -> bool {
        let state = self.state.lock();
        match &state.events {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Raise an event on the global exception channel.
    pub fn trigger_exception(&self, event: ExceptionEvent) {
        info!("Triggering SDK exception {}: {}", event.code, event.message);
        let _ = self.exceptions.send(event);
    }

    /// Queue more publish outcomes.
    pub fn script_publish(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.state.lock().publish.extend(outcomes);
    }

    /// Queue more connect outcomes.
    pub fn script_connect(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.state.lock().connect.extend(outcomes);
    }

    pub fn stats(&self) -> SimStats {
        self.state.lock().stats.clone()
    }
}

impl RtcSdk for SimSdk {
    type Publisher = SimPublisher;
    type Session = SimSession;

    fn init_session(
        &self,
        api_key: &str,
        session_id: &str,
    ) -> (SimSession, mpsc::UnboundedReceiver<SessionEvent>) {
        info!("Sim: init session {} for api key {}", session_id, api_key);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock();
        state.events = Some(tx);
        state
            .stats
            .sessions
            .push((api_key.to_string(), session_id.to_string()));
        drop(state);

        let session = SimSession {
            state: self.state.clone(),
        };
        (session, rx)
    }

    fn init_publisher(&self, target: &str, options: &MediaOptions) -> SimPublisher {
        let mut state = self.state.lock();
        state.stats.publishers_created += 1;
        let id = format!("publisher-{}", state.stats.publishers_created);
        debug!(
            "Sim: {} attached to '{}' ({} {}x{})",
            id, target, options.insert_mode, options.width, options.height
        );

        SimPublisher {
            outcome: next(&mut state.init),
            id,
            state: self.state.clone(),
            destroyed: false,
        }
    }

    fn exceptions(&self) -> broadcast::Receiver<ExceptionEvent> {
        self.exceptions.subscribe()
    }

    fn check_system_requirements(&self) -> bool {
        self.state.lock().stats.requirement_checks += 1;
        self.supported
    }
}

#[derive(Debug)]
pub struct SimPublisher {
    id: String,
    outcome: Outcome,
    state: Arc<Mutex<SimState>>,
    destroyed: bool,
}

#[async_trait]
impl LocalPublisher for SimPublisher {
    fn id(&self) -> &str {
        &self.id
    }

    async fn ready(&mut self) -> Result<(), SdkError> {
        self.outcome.clone().resolve().await
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.state.lock().stats.publishers_destroyed += 1;
    }
}

#[derive(Debug)]
pub struct SimSession {
    state: Arc<Mutex<SimState>>,
}

#[async_trait]
impl RtcSession for SimSession {
    type Publisher = SimPublisher;

    async fn connect(&self, token: &str) -> Result<(), SdkError> {
        debug!("Sim: connect with token of {} bytes", token.len());
        let outcome = {
            let mut state = self.state.lock();
            state.stats.connect_tokens.push(token.to_string());
            next(&mut state.connect)
        };

        outcome.resolve().await?;

        let state = self.state.lock();
        if let Some(tx) = &state.events {
            for stream in &state.remote_streams {
                let _ = tx.send(SessionEvent::StreamCreated(stream.clone()));
            }
        }
        Ok(())
    }

    async fn publish(&self, publisher: &SimPublisher) -> Result<(), SdkError> {
        let outcome = {
            let mut state = self.state.lock();
            state.stats.published.push(publisher.id.clone());
            next(&mut state.publish)
        };
        outcome.resolve().await
    }

    async fn subscribe(
        &self,
        stream: &Stream,
        target: &str,
        _options: &MediaOptions,
    ) -> Result<(), SdkError> {
        debug!("Sim: subscribe {} into '{}'", stream.id, target);
        let outcome = {
            let mut state = self.state.lock();
            state.stats.subscribed.push(target.to_string());
            next(&mut state.subscribe)
        };
        outcome.resolve().await
    }

    fn disconnect(&self) {
        let mut state = self.state.lock();
        state.stats.disconnects += 1;
        if let Some(tx) = &state.events {
            let _ = tx.send(SessionEvent::SessionDisconnected {
                reason: Reason::ClientDisconnected,
            });
        }
    }
}
