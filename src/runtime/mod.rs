//! The state machine runtime.
//!
//! # Key Concepts
//!
//! - **Transitions**: Normal, self and null variants with an optional guard and action
//! - **State Machine**: Registers states/events/transitions, runs the
//!   start/stop/restart lifecycle and dispatches events
//! - **Persistence**: Every state change is written through a `StateStore`
//!
//! Everything runs synchronously on the caller's thread: callbacks complete
//! (or fail) before the triggering call returns.

mod error;
mod machine;
mod transition;

pub use error::MachineError;
pub use machine::{Dispatch, MachineStatus, StateMachine, StateOptions, DEFAULT_HISTORY_LIMIT};
pub use transition::Transition;
