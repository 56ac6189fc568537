//! Event-triggered transitions between states.

use crate::core::{Callback, CallbackError, CallbackResult, Event, Guard, State, TransitionKind};
use std::fmt;
use std::sync::Arc;

/// A rule mapping (source state, event) to a destination state, with an
/// optional guard and an optional action.
///
/// Transitions are created through `StateMachine::add_transition`,
/// `add_self_transition` and `add_null_transition`, which only hand one out
/// when every referenced state and event is registered.
pub struct Transition<D = ()> {
    kind: TransitionKind,
    event: Event,
    source: State<D>,
    destination: State<D>,
    guard: Option<Guard<D>>,
    action: Option<Callback<D>>,
}

impl<D: 'static> Transition<D> {
    pub(crate) fn normal(source: State<D>, destination: State<D>, event: Event) -> Self {
        Self::with_kind(TransitionKind::Normal, source, destination, event)
    }

    pub(crate) fn self_loop(state: State<D>, event: Event) -> Self {
        Self::with_kind(TransitionKind::SelfLoop, state.clone(), state, event)
    }

    pub(crate) fn null(state: State<D>, event: Event) -> Self {
        Self::with_kind(TransitionKind::Null, state.clone(), state, event)
    }

    fn with_kind(
        kind: TransitionKind,
        source: State<D>,
        destination: State<D>,
        event: Event,
    ) -> Self {
        Self {
            kind,
            event,
            source,
            destination,
            guard: None,
            action: None,
        }
    }

    /// Set the guard, replacing any previous one.
    pub fn add_condition<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&D) -> bool + Send + Sync + 'static,
    {
        self.guard = Some(Guard::new(predicate));
        self
    }

    /// Set a guard built elsewhere, replacing any previous one.
    pub fn set_guard(&mut self, guard: Guard<D>) -> &mut Self {
        self.guard = Some(guard);
        self
    }

    /// Set the action, replacing any previous one.
    pub fn add_action<F>(&mut self, action: F) -> &mut Self
    where
        F: Fn(&D) -> CallbackResult + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn kind(&self) -> TransitionKind {
        self.kind
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn source(&self) -> &State<D> {
        &self.source
    }

    pub fn destination(&self) -> &State<D> {
        &self.destination
    }

    /// Whether this transition is the one to consider for `current` and `event`.
    pub fn matches(&self, current: &State<D>, event: &Event) -> bool {
        self.source == *current && self.event == *event
    }

    /// Evaluate the guard. A missing guard always passes.
    pub fn guard_allows(&self, data: &D) -> Result<bool, CallbackError> {
        match &self.guard {
            Some(guard) => guard.check(data),
            None => Ok(true),
        }
    }

    /// Run the body of the transition without consulting the guard:
    /// the action, then the kind-specific exit/entry sequence.
    pub(crate) fn fire(&self, data: &D) -> CallbackResult {
        if let Some(action) = &self.action {
            action(data)?;
        }
        match self.kind {
            TransitionKind::Normal | TransitionKind::SelfLoop => {
                self.source.exit(data)?;
                self.destination.enter(data)
            }
            TransitionKind::Null => Ok(()),
        }
    }

    /// Evaluate the guard and, if it passes, run the transition body.
    ///
    /// Returns whether the body ran. Failures from the guard, action, or
    /// state callbacks are returned unchanged.
    pub fn invoke(&self, data: &D) -> Result<bool, CallbackError> {
        if !self.guard_allows(data)? {
            return Ok(false);
        }
        self.fire(data)?;
        Ok(true)
    }
}

impl<D> Transition<D> {
    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

impl<D> fmt::Debug for Transition<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("kind", &self.kind)
            .field("event", &self.event.name())
            .field("source", &self.source.name())
            .field("destination", &self.destination.name())
            .field("guard", &self.has_guard())
            .field("action", &self.has_action())
            .finish()
    }
}
