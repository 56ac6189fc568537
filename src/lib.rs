//! Resumable FSM: an event-driven finite state machine with crash recovery
//!
//! States carry ordered entry/exit callbacks, transitions carry an optional
//! guard and action, and the machine persists its current state through a
//! pluggable `StateStore` so execution can be stopped and resumed later
//! without replaying events.
//!
//! # Core Concepts
//!
//! - **State / Event**: Named identities, equal by name
//! - **Transition**: Normal, self or null, fired by the first match for the
//!   current state and event
//! - **StateMachine**: start/stop/restart lifecycle and event dispatch
//! - **Snapshot**: The persisted name of the current state
//!
//! # Example
//!
//! ```rust
//! use resumable_fsm::{Event, State, StateMachine};
//!
//! let mut machine: StateMachine<&str> = StateMachine::in_memory("switch");
//! let off = State::new("Off");
//! let on = State::new("On");
//! on.on_entry(|who| {
//!     println!("{who} turned the light on");
//!     Ok(())
//! });
//! let flip = Event::new("flip");
//!
//! machine.add_initial_state(off.clone()).unwrap();
//! machine.add_state(on.clone()).unwrap();
//! machine.add_event(flip.clone());
//! machine.add_transition(&off, &on, &flip).unwrap();
//! machine.add_transition(&on, &off, &flip).unwrap();
//!
//! machine.start(&"nobody").unwrap();
//! machine.trigger_event(&flip, &"alice").unwrap();
//! machine.stop(&"alice").unwrap();
//!
//! // Later, possibly in a new process sharing the same store:
//! machine.restart(&"bob").unwrap();
//! assert_eq!(machine.current_state(), Some(&on));
//! ```

pub mod checkpoint;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod runtime;

// Re-export commonly used types
pub use crate::checkpoint::{
    FileStore, MemoryStore, Snapshot, SnapshotFormat, StateStore, StoreError,
};
pub use crate::config::{Config, ConfigError};
pub use crate::core::{CallbackError, CallbackResult, Event, Guard, State, TransitionKind};
pub use crate::diagnostics::DefinitionIssue;
pub use crate::runtime::{
    Dispatch, MachineError, MachineStatus, StateMachine, StateOptions, Transition,
};

/// Initialize logging with the given log level.
///
/// `RUST_LOG` overrides `level` when set. Returns `false` if a global
/// subscriber was already installed.
pub fn init_logging(level: &str) -> bool {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
