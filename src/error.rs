//! Error types surfaced by the engine.
//!
//! Failures stay local to the action that produced them: they are reported
//! through that action's handle and never reach projection or notification.

use std::time::Duration;

use thiserror::Error;

use crate::queue::ActionId;

/// Why an action's operation did not produce a value.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The operation returned an error.
    #[error("operation failed: {0:#}")]
    Operation(#[source] anyhow::Error),

    /// The operation ran longer than the configured timeout.
    #[error("operation timed out after {}ms", after.as_millis())]
    TimedOut { after: Duration },

    /// The operation panicked.
    #[error("operation panicked")]
    Panicked,
}

/// Resolution of a [`DispatchHandle`](crate::store::DispatchHandle) that
/// did not confirm.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The operation failed; the action's speculative effect was rolled back.
    #[error("action {id} failed: {source}")]
    Execution {
        id: ActionId,
        #[source]
        source: ExecutionError,
    },

    /// A reset discarded the action before it settled.
    #[error("action {id} was discarded by a reset")]
    Discarded { id: ActionId },

    /// The store was dropped before the action settled.
    #[error("store closed before action {id} settled")]
    Closed { id: ActionId },
}

impl DispatchError {
    pub fn action_id(&self) -> ActionId {
        match self {
            DispatchError::Execution { id, .. }
            | DispatchError::Discarded { id }
            | DispatchError::Closed { id } => *id,
        }
    }

    /// Short machine-readable tag, used in logs and CLI output.
    pub fn error_type(&self) -> &'static str {
        match self {
            DispatchError::Execution {
                source: ExecutionError::TimedOut { .. },
                ..
            } => "timeout",
            DispatchError::Execution {
                source: ExecutionError::Panicked,
                ..
            } => "panic",
            DispatchError::Execution { .. } => "execution",
            DispatchError::Discarded { .. } => "discarded",
            DispatchError::Closed { .. } => "closed",
        }
    }
}

/// Errors raised while building a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no Tokio runtime available; build the store inside a runtime or pass a handle")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),
}
