//! Bounded retry around publisher initialization
//!
//! Each attempt creates a fresh publisher. Failed attempts are released before
//! the next one starts; there is no delay between attempts. The first success
//! ends the sequence, and exhaustion reports the error of the final attempt.

use std::ops::{Deref, DerefMut};

use tracing::{error, info, warn};

use crate::error::CallError;
use crate::model::MediaOptions;
use crate::sdk::{LocalPublisher, RtcSdk};

/// Attempts made when nothing else is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Attempt ceiling for one initialization sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// A ceiling of zero is raised to one; at least one attempt is always made.
    pub fn new(max_attempts: u32) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Owns a publisher and destroys it when dropped.
///
/// Every publisher the initializer creates lives inside one of these, so a
/// failed attempt, a cancelled sequence or a torn-down session all release
/// the capture resource.
#[derive(Debug)]
pub struct ScopedPublisher<P: LocalPublisher>(P);

impl<P: LocalPublisher> ScopedPublisher<P> {
    pub fn new(publisher: P) -> Self {
        ScopedPublisher(publisher)
    }
}

impl<P: LocalPublisher> Deref for ScopedPublisher<P> {
    type Target = P;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<P: LocalPublisher> DerefMut for ScopedPublisher<P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<P: LocalPublisher> Drop for ScopedPublisher<P> {
    fn drop(&mut self) {
        self.0.destroy();
    }
}

/// Create a publisher, retrying immediately on failure up to the policy's
/// ceiling.
pub async fn initialize_with_retry<S: RtcSdk>(
    sdk: &S,
    target: &str,
    options: &MediaOptions,
    policy: RetryPolicy,
) -> Result<ScopedPublisher<S::Publisher>, CallError> {
    let mut attempt = 0;

    loop {
        info!("Attempting to initialize publisher (Attempt {})...", attempt + 1);

        let mut publisher = ScopedPublisher::new(sdk.init_publisher(target, options));

        match publisher.ready().await {
            Ok(()) => {
                info!("Publisher {} initialized successfully.", publisher.id());
                return Ok(publisher);
            }
            Err(e) => {
                warn!("Publisher initialization failed: {}", e.message);
                drop(publisher);
                attempt += 1;

                if attempt >= policy.max_attempts() {
                    error!("Max retries reached. Unable to initialize publisher.");
                    return Err(CallError::PublisherInit { attempts: attempt, last: e });
                }

                info!("Retrying publisher initialization...");
            }
        }
    }
}

/// Continuation form of [`initialize_with_retry`]. Exactly one of `on_success`
/// and `on_error` runs, once.
pub async fn initialize_with_retry_then<S, T>(
    sdk: &S,
    target: &str,
    options: &MediaOptions,
    policy: RetryPolicy,
    on_success: impl FnOnce(ScopedPublisher<S::Publisher>) -> T,
    on_error: impl FnOnce(CallError) -> T,
) -> T
where
    S: RtcSdk,
{
    match initialize_with_retry(sdk, target, options, policy).await {
        Ok(publisher) => on_success(publisher),
        Err(e) => on_error(e),
    }
}
