//! Errors raised by state machine operations.

use crate::checkpoint::StoreError;
use crate::core::CallbackError;
use thiserror::Error;

/// Errors returned by `StateMachine` lifecycle and dispatch operations.
///
/// Precondition failures are checked before the machine is mutated.
/// Callback and store failures are passed through unchanged.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("State '{0}' is already registered")]
    DuplicateState(String),

    #[error("Initial state is not set")]
    MissingInitialState,

    #[error("State machine '{0}' has not been started")]
    NotStarted(String),

    #[error("State machine '{machine}' is not running (status: {status:?})")]
    NotRunning {
        machine: String,
        status: super::MachineStatus,
    },

    #[error("No snapshot stored for state machine '{0}'")]
    NoSnapshot(String),

    #[error("Snapshot names state '{state}', which is not registered in '{machine}'")]
    UnknownSnapshotState { machine: String, state: String },

    #[error(transparent)]
    Callback(#[from] CallbackError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
