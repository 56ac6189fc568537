//! Named states with entry and exit hooks.
//!
//! A `State` is a cheap shared handle: clones refer to the same callback
//! lists, so hooks attached after the state has been registered with a
//! machine are still run by that machine.

use super::callback::{run_all, Callback, CallbackResult};
use parking_lot::RwLock;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

struct Hooks<D> {
    entry: Vec<Callback<D>>,
    exit: Vec<Callback<D>>,
}

/// A named node of a state machine.
///
/// Identity is the name alone. Two states with the same name compare equal
/// even if their callback lists differ.
///
/// # Example
///
/// ```rust
/// use resumable_fsm::core::State;
///
/// let idle: State<u32> = State::new("Idle");
/// idle.on_entry(|count| {
///     println!("entered idle with {count}");
///     Ok(())
/// });
///
/// assert_eq!(idle, State::new("Idle"));
/// assert_eq!(idle.entry_callback_count(), 1);
/// ```
pub struct State<D = ()> {
    name: Arc<str>,
    hooks: Arc<RwLock<Hooks<D>>>,
}

impl<D> State<D> {
    /// Create a state with no callbacks.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            hooks: Arc::new(RwLock::new(Hooks {
                entry: Vec::new(),
                exit: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a callback run every time the state is entered.
    pub fn on_entry<F>(&self, callback: F)
    where
        F: Fn(&D) -> CallbackResult + Send + Sync + 'static,
    {
        self.hooks.write().entry.push(Arc::new(callback));
    }

    /// Append a callback run every time the state is exited.
    pub fn on_exit<F>(&self, callback: F)
    where
        F: Fn(&D) -> CallbackResult + Send + Sync + 'static,
    {
        self.hooks.write().exit.push(Arc::new(callback));
    }

    /// Run the entry callbacks in registration order.
    ///
    /// The first failing callback aborts the remaining ones and its error
    /// is returned unchanged.
    pub fn enter(&self, data: &D) -> CallbackResult {
        // Snapshot the list so a callback may attach further hooks.
        let callbacks = self.hooks.read().entry.clone();
        run_all(&callbacks, data)
    }

    /// Run the exit callbacks in registration order.
    pub fn exit(&self, data: &D) -> CallbackResult {
        let callbacks = self.hooks.read().exit.clone();
        run_all(&callbacks, data)
    }

    pub fn entry_callback_count(&self) -> usize {
        self.hooks.read().entry.len()
    }

    pub fn exit_callback_count(&self) -> usize {
        self.hooks.read().exit.len()
    }
}

impl<D> Clone for State<D> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<D> PartialEq for State<D> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<D> Eq for State<D> {}

impl<D> Hash for State<D> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<D> fmt::Debug for State<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.read();
        f.debug_struct("State")
            .field("name", &self.name)
            .field("entry_callbacks", &hooks.entry.len())
            .field("exit_callbacks", &hooks.exit.len())
            .finish()
    }
}

impl<D> fmt::Display for State<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
