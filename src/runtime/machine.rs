//! State machine runtime: registration, lifecycle and dispatch.

use crate::checkpoint::{MemoryStore, Snapshot, StateStore};
use crate::core::{Event, History, State, TransitionKind, TransitionRecord};
use crate::runtime::error::MachineError;
use crate::runtime::transition::Transition;
use chrono::Utc;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Number of fired transitions a machine remembers unless told otherwise.
pub const DEFAULT_HISTORY_LIMIT: usize = 1024;

/// Lifecycle of the machine itself, as opposed to the states it manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MachineStatus {
    /// Neither `start` nor `restart` has succeeded yet
    Unstarted,
    Running,
    /// `stop` was called; the current state is retained
    Stopped,
}

/// Outcome of `trigger_event`.
#[derive(Clone, Debug, PartialEq)]
pub enum Dispatch {
    /// The first matching transition fired
    Fired {
        kind: TransitionKind,
        from: String,
        to: String,
    },

    /// The first matching transition's guard rejected the data
    Blocked { state: String, event: String },

    /// No transition is registered for the event in the current state
    Unhandled,
}

/// Role flags for `StateMachine::add_state_with`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateOptions {
    pub initial: bool,
    pub final_state: bool,
}

/// Event-driven state machine that persists its current state.
///
/// States, events and transitions are registered up front. `start` enters
/// the initial state; `trigger_event` fires the first transition whose
/// source is the current state and whose event matches. The current state
/// is written to the store on `start` and on every fired transition, so
/// `restart` can resume from it after `stop` or a process restart.
///
/// # Example
///
/// ```rust
/// use resumable_fsm::{Dispatch, Event, State, StateMachine};
///
/// let mut machine: StateMachine = StateMachine::in_memory("door");
/// let closed = State::new("Closed");
/// let open = State::new("Open");
/// let push = Event::new("push");
///
/// machine.add_initial_state(closed.clone()).unwrap();
/// machine.add_state(open.clone()).unwrap();
/// machine.add_event(push.clone());
/// assert!(machine.add_transition(&closed, &open, &push).is_some());
///
/// machine.start(&()).unwrap();
/// let outcome = machine.trigger_event(&push, &()).unwrap();
///
/// assert!(matches!(outcome, Dispatch::Fired { .. }));
/// assert_eq!(machine.current_state(), Some(&open));
/// ```
pub struct StateMachine<D = ()> {
    name: String,
    states: IndexMap<String, State<D>>,
    events: Vec<Event>,
    transitions: Vec<Transition<D>>,
    initial: Option<State<D>>,
    final_state: Option<State<D>>,
    current: Option<State<D>>,
    status: MachineStatus,
    store: Arc<dyn StateStore>,
    history: History,
}

impl<D: 'static> StateMachine<D> {
    /// Create a machine that persists through `store`.
    pub fn new(name: impl Into<String>, store: Arc<dyn StateStore>) -> Self {
        Self {
            name: name.into(),
            states: IndexMap::new(),
            events: Vec::new(),
            transitions: Vec::new(),
            initial: None,
            final_state: None,
            current: None,
            status: MachineStatus::Unstarted,
            store,
            history: History::bounded(DEFAULT_HISTORY_LIMIT),
        }
    }

    /// Create a machine backed by a fresh `MemoryStore`.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(MemoryStore::new()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a state with no special role.
    pub fn add_state(&mut self, state: State<D>) -> Result<(), MachineError> {
        self.add_state_with(state, StateOptions::default())
    }

    /// Register a state and flag it as initial.
    pub fn add_initial_state(&mut self, state: State<D>) -> Result<(), MachineError> {
        self.add_state_with(
            state,
            StateOptions {
                initial: true,
                ..StateOptions::default()
            },
        )
    }

    /// Register a state and flag it as final.
    pub fn add_final_state(&mut self, state: State<D>) -> Result<(), MachineError> {
        self.add_state_with(
            state,
            StateOptions {
                final_state: true,
                ..StateOptions::default()
            },
        )
    }

    /// Register a state.
    ///
    /// Fails if a state with the same name is already registered. The first
    /// state flagged initial (or final) keeps that role for the machine's
    /// lifetime; later flags are ignored.
    pub fn add_state_with(
        &mut self,
        state: State<D>,
        options: StateOptions,
    ) -> Result<(), MachineError> {
        if self.states.contains_key(state.name()) {
            return Err(MachineError::DuplicateState(state.name().to_string()));
        }

        if options.initial && self.initial.is_none() {
            self.initial = Some(state.clone());
        }
        if options.final_state && self.final_state.is_none() {
            self.final_state = Some(state.clone());
        }

        tracing::debug!(machine = %self.name, state = %state.name(), "State registered");
        self.states.insert(state.name().to_string(), state);
        Ok(())
    }

    /// Register an event. Duplicates are accepted.
    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Add a transition from `src` to `dst` on `evt`.
    ///
    /// Returns `None`, without registering anything, if any of the three is
    /// not registered with this machine.
    pub fn add_transition(
        &mut self,
        src: &State<D>,
        dst: &State<D>,
        evt: &Event,
    ) -> Option<&mut Transition<D>> {
        let (Some(source), Some(destination), Some(event)) = (
            self.registered_state(src),
            self.registered_state(dst),
            self.registered_event(evt),
        ) else {
            tracing::debug!(
                machine = %self.name,
                src = %src.name(),
                dst = %dst.name(),
                event = %evt.name(),
                "Transition refers to unregistered state or event"
            );
            return None;
        };
        Some(self.push_transition(Transition::normal(source, destination, event)))
    }

    /// Add a transition that exits and re-enters `state` on `evt`.
    pub fn add_self_transition(
        &mut self,
        state: &State<D>,
        evt: &Event,
    ) -> Option<&mut Transition<D>> {
        let (Some(state), Some(event)) = (self.registered_state(state), self.registered_event(evt))
        else {
            return None;
        };
        Some(self.push_transition(Transition::self_loop(state, event)))
    }

    /// Add a transition on `evt` that only runs its action and stays in `state`.
    pub fn add_null_transition(
        &mut self,
        state: &State<D>,
        evt: &Event,
    ) -> Option<&mut Transition<D>> {
        let (Some(state), Some(event)) = (self.registered_state(state), self.registered_event(evt))
        else {
            return None;
        };
        Some(self.push_transition(Transition::null(state, event)))
    }

    /// Enter the initial state.
    ///
    /// The initial state is persisted, overwriting any earlier snapshot,
    /// before its entry callbacks run. History from earlier runs is dropped.
    pub fn start(&mut self, data: &D) -> Result<(), MachineError> {
        let initial = self
            .initial
            .clone()
            .ok_or(MachineError::MissingInitialState)?;

        tracing::info!(machine = %self.name, state = %initial.name(), "Starting state machine");
        self.history.clear();
        self.current = Some(initial.clone());
        self.status = MachineStatus::Running;
        self.persist(&initial)?;
        initial.enter(data)?;
        Ok(())
    }

    /// Run the current state's exit callbacks.
    ///
    /// The current state is kept in memory and in the store, ready for
    /// `restart`.
    pub fn stop(&mut self, data: &D) -> Result<(), MachineError> {
        if self.initial.is_none() {
            return Err(MachineError::MissingInitialState);
        }
        let current = self
            .current
            .clone()
            .ok_or_else(|| MachineError::NotStarted(self.name.clone()))?;

        tracing::info!(machine = %self.name, state = %current.name(), "Stopping state machine");
        self.status = MachineStatus::Stopped;
        current.exit(data)?;
        Ok(())
    }

    /// Resume from the last persisted state, with an empty history.
    ///
    /// The restored state also becomes the machine's initial state, so a
    /// later `start` enters it rather than the originally configured one.
    pub fn restart(&mut self, data: &D) -> Result<(), MachineError> {
        let snapshot = self
            .store
            .read_snapshot(&self.name)?
            .ok_or_else(|| MachineError::NoSnapshot(self.name.clone()))?;

        let restored = self.states.get(&snapshot.state).cloned().ok_or_else(|| {
            MachineError::UnknownSnapshotState {
                machine: self.name.clone(),
                state: snapshot.state.clone(),
            }
        })?;

        tracing::info!(
            machine = %self.name,
            state = %restored.name(),
            snapshot = %snapshot.id,
            "Restarting state machine from snapshot"
        );
        self.initial = Some(restored.clone());
        self.current = Some(restored.clone());
        self.history.clear();
        self.status = MachineStatus::Running;
        restored.enter(data)?;
        Ok(())
    }

    /// Fire the first transition registered for the current state and `event`.
    ///
    /// Only the first matching transition is considered, even when its guard
    /// rejects the data. A guard returning `false` leaves the machine where it
    /// is. Otherwise the current state is updated and persisted before the
    /// guard's error (if any) is returned and before the action and exit/entry
    /// callbacks run, so any callback failure leaves the machine at the
    /// destination state.
    pub fn trigger_event(&mut self, event: &Event, data: &D) -> Result<Dispatch, MachineError> {
        if self.initial.is_none() {
            return Err(MachineError::MissingInitialState);
        }
        let current = self
            .current
            .clone()
            .ok_or_else(|| MachineError::NotStarted(self.name.clone()))?;
        if self.status != MachineStatus::Running {
            return Err(MachineError::NotRunning {
                machine: self.name.clone(),
                status: self.status,
            });
        }

        let Some(index) = self
            .transitions
            .iter()
            .position(|t| t.matches(&current, event))
        else {
            tracing::debug!(
                machine = %self.name,
                state = %current.name(),
                event = %event.name(),
                "Event not handled in current state"
            );
            return Ok(Dispatch::Unhandled);
        };

        let transition = &self.transitions[index];
        let guard = transition.guard_allows(data);
        if let Ok(false) = guard {
            tracing::debug!(
                machine = %self.name,
                state = %current.name(),
                event = %event.name(),
                "Guard blocked transition"
            );
            return Ok(Dispatch::Blocked {
                state: current.name().to_string(),
                event: event.name().to_string(),
            });
        }

        let destination = transition.destination().clone();
        let kind = transition.kind();
        self.current = Some(destination.clone());
        self.persist(&destination)?;
        self.history.record(TransitionRecord {
            event: event.name().to_string(),
            from: current.name().to_string(),
            to: destination.name().to_string(),
            kind,
            timestamp: Utc::now(),
        });

        // A guard that errors still leaves the machine at the destination.
        guard?;
        tracing::debug!(
            machine = %self.name,
            from = %current.name(),
            to = %destination.name(),
            event = %event.name(),
            ?kind,
            "Transition fired"
        );
        self.transitions[index].fire(data)?;

        Ok(Dispatch::Fired {
            kind,
            from: current.name().to_string(),
            to: destination.name().to_string(),
        })
    }

    pub fn current_state(&self) -> Option<&State<D>> {
        self.current.as_ref()
    }

    pub fn initial_state(&self) -> Option<&State<D>> {
        self.initial.as_ref()
    }

    pub fn final_state(&self) -> Option<&State<D>> {
        self.final_state.as_ref()
    }

    /// Whether the current state is the designated final state.
    pub fn is_final(&self) -> bool {
        matches!((&self.current, &self.final_state), (Some(current), Some(last)) if current == last)
    }

    pub fn status(&self) -> MachineStatus {
        self.status
    }

    /// Registered states in registration order.
    pub fn states(&self) -> impl Iterator<Item = &State<D>> {
        self.states.values()
    }

    pub fn state(&self, name: &str) -> Option<&State<D>> {
        self.states.get(name)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn transitions(&self) -> &[Transition<D>] {
        &self.transitions
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Cap how many fired transitions are remembered; the oldest are dropped first.
    pub fn set_history_limit(&mut self, limit: usize) {
        self.history.set_limit(limit);
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    fn registered_state(&self, state: &State<D>) -> Option<State<D>> {
        self.states.get(state.name()).cloned()
    }

    fn registered_event(&self, event: &Event) -> Option<Event> {
        self.events.iter().find(|e| *e == event).cloned()
    }

    fn push_transition(&mut self, transition: Transition<D>) -> &mut Transition<D> {
        tracing::debug!(machine = %self.name, ?transition, "Transition registered");
        let index = self.transitions.len();
        self.transitions.push(transition);
        &mut self.transitions[index]
    }

    fn persist(&self, state: &State<D>) -> Result<(), MachineError> {
        let snapshot = Snapshot::new(self.name.as_str(), state.name());
        if let Err(e) = self.store.write_snapshot(&snapshot) {
            // The in-memory state has already moved on.
            tracing::warn!(
                machine = %self.name,
                state = %state.name(),
                error = %e,
                "Failed to persist current state"
            );
            return Err(e.into());
        }
        Ok(())
    }
}

impl<D> fmt::Debug for StateMachine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("name", &self.name)
            .field("states", &self.states.keys().collect::<Vec<_>>())
            .field("events", &self.events)
            .field("transitions", &self.transitions)
            .field("initial", &self.initial.as_ref().map(|s| s.name()))
            .field("final_state", &self.final_state.as_ref().map(|s| s.name()))
            .field("current", &self.current.as_ref().map(|s| s.name()))
            .field("status", &self.status)
            .finish()
    }
}
