//! Global SDK exception handling
//!
//! Exceptions on the global channel are logged and nothing more. Recovery
//! from workflow failures belongs to the publish path, which sees the same
//! failure through its own completion.

use tracing::{error, warn};

use crate::error::{SdkError, WORKFLOW_ERROR_CODE};
use crate::model::ExceptionEvent;
use crate::util::log_error;

/// Code used when simulating an exception from the command line.
pub const SIMULATED_EXCEPTION_CODE: i64 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    /// ICE workflow failure, handled by publish recovery.
    Workflow,
    Unrecognized,
}

pub fn classify(event: &ExceptionEvent) -> ExceptionKind {
    if event.code == WORKFLOW_ERROR_CODE {
        ExceptionKind::Workflow
    } else {
        ExceptionKind::Unrecognized
    }
}

/// Log an exception and report how it was classified. Nothing is retried.
pub fn handle_exception(event: &ExceptionEvent) -> ExceptionKind {
    let kind = classify(event);
    match kind {
        ExceptionKind::Workflow => {
            warn!("Global ICE Workflow Error detected: {}", event.message);
            warn!("Network issues detected. Please check your connection and try again.");
        }
        ExceptionKind::Unrecognized => {
            log_error(
                "Global Exception",
                &SdkError::new(event.code, event.message.clone()),
            );
            error!("Exception Details: {:?}", event);
        }
    }
    kind
}
