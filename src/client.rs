//! Call client
//!
//! Resolves credentials, then hands a session to the [`SessionHandler`] and
//! runs it until the session ends or the process receives Ctrl-C. The
//! communication SDK is the in-process [`SimSdk`], scripted from the command
//! line.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::CallArgs;
use crate::exception::SIMULATED_EXCEPTION_CODE;
use crate::model::ExceptionEvent;
use crate::notify::ConsoleNotifier;
use crate::sdk::RtcSdk;
use crate::session::{SessionHandler, SessionState};
use crate::sim::SimSdk;
use crate::util::init_log;

/// Blocking entry point for the `call` subcommand.
pub fn main(args: CallArgs) -> Result<()> {
    init_log();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building the tokio runtime")?;

    runtime.block_on(run(args))
}

/// Run the call until it ends or Ctrl-C.
pub async fn run(args: CallArgs) -> Result<()> {
    let sdk = Arc::new(SimSdk::new(args.sim_script()));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    run_with(sdk, args, shutdown).await
}

/// Run the call on `sdk` until the session ends or `shutdown` completes.
pub async fn run_with<F>(sdk: Arc<SimSdk>, args: CallArgs, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    check_platform(&*sdk);

    let credentials = args
        .credential_source()?
        .resolve()
        .await
        .context("resolving session credentials")?;
    info!("Joining session {}", credentials.session_id);

    let handler = SessionHandler::new(
        sdk.clone(),
        args.session_config(),
        Arc::new(ConsoleNotifier),
    );

    if args.simulate_exception {
        let mut snapshots = handler.watch();
        let sdk = sdk.clone();
        tokio::spawn(async move {
            if snapshots
                .wait_for(|s| s.state != SessionState::Disconnected)
                .await
                .is_ok()
            {
                sdk.trigger_exception(ExceptionEvent::new(
                    SIMULATED_EXCEPTION_CODE,
                    "This is a simulated exception for testing purposes.",
                ));
            }
        });
    }

    handler
        .run(credentials, shutdown)
        .await
        .context("call session failed")?;

    info!("Call session ended");
    Ok(())
}

/// Warn when the platform cannot run the SDK. The call goes ahead either way.
pub fn check_platform<S: RtcSdk>(sdk: &S) -> bool {
    let supported = sdk.check_system_requirements();
    if !supported {
        warn!("This platform does not support WebRTC. Please use a modern browser like Chrome or Firefox.");
    }
    supported
}
