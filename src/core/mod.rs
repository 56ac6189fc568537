//! Identity primitives and the hooks attached to them.
//!
//! - `State`: named node carrying ordered entry/exit callbacks
//! - `Event`: named stimulus
//! - `Guard`: predicate gating a transition
//! - `History`: record of fired transitions

mod callback;
mod event;
mod guard;
mod history;
mod state;

pub use callback::{Callback, CallbackError, CallbackResult};
pub use event::Event;
pub use guard::Guard;
pub use history::{History, TransitionKind, TransitionRecord};
pub use state::State;
