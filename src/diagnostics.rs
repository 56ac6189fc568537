//! Definition checks for a configured state machine.
//!
//! The engine itself is permissive: duplicate events are accepted and a
//! later transition for the same (state, event) pair silently never fires.
//! `validate` reports every such issue in one pass using Stillwater's
//! `Validation`, so all of them can be fixed at once. It is advisory and
//! never blocks any machine operation.
//!
//! # Example
//!
//! ```rust
//! use resumable_fsm::{Event, State, StateMachine};
//!
//! let mut machine: StateMachine = StateMachine::in_memory("lint");
//! let a = State::new("A");
//! let orphan = State::new("Orphan");
//! let go = Event::new("go");
//! machine.add_initial_state(a.clone()).unwrap();
//! machine.add_state(orphan).unwrap();
//! machine.add_event(go.clone());
//! machine.add_self_transition(&a, &go);
//!
//! assert!(machine.validate().is_failure());
//! ```

use crate::runtime::StateMachine;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet, VecDeque};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A problem in how a machine was put together.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DefinitionIssue {
    #[error("No initial state is designated")]
    MissingInitialState,

    #[error("Event '{name}' is registered {count} times")]
    DuplicateEvent { name: String, count: usize },

    #[error("Transition #{index} on '{event}' from '{state}' is shadowed by #{shadowed_by}")]
    ShadowedTransition {
        state: String,
        event: String,
        index: usize,
        shadowed_by: usize,
    },

    #[error("State '{name}' is unreachable from the initial state")]
    UnreachableState { name: String },
}

/// Check `machine`, accumulating ALL issues.
pub fn validate<D: 'static>(
    machine: &StateMachine<D>,
) -> Validation<(), NonEmptyVec<DefinitionIssue>> {
    let mut checks: Vec<Validation<(), NonEmptyVec<DefinitionIssue>>> = Vec::new();

    if machine.initial_state().is_none() {
        checks.push(Validation::fail(DefinitionIssue::MissingInitialState));
    }

    let mut event_counts: IndexMap<&str, usize> = IndexMap::new();
    for event in machine.events() {
        *event_counts.entry(event.name()).or_insert(0) += 1;
    }
    for (name, count) in event_counts {
        if count > 1 {
            checks.push(Validation::fail(DefinitionIssue::DuplicateEvent {
                name: name.to_string(),
                count,
            }));
        }
    }

    let mut first_match: HashMap<(&str, &str), usize> = HashMap::new();
    for (index, transition) in machine.transitions().iter().enumerate() {
        let key = (transition.source().name(), transition.event().name());
        match first_match.get(&key) {
            Some(&shadowed_by) => checks.push(Validation::fail(
                DefinitionIssue::ShadowedTransition {
                    state: key.0.to_string(),
                    event: key.1.to_string(),
                    index,
                    shadowed_by,
                },
            )),
            None => {
                first_match.insert(key, index);
            }
        }
    }

    if let Some(initial) = machine.initial_state() {
        let reachable = reachable_from(machine, initial.name());
        for state in machine.states() {
            if !reachable.contains(state.name()) {
                checks.push(Validation::fail(DefinitionIssue::UnreachableState {
                    name: state.name().to_string(),
                }));
            }
        }
    }

    if checks.is_empty() {
        return Validation::success(());
    }
    Validation::all_vec(checks).map(|_| ())
}

fn reachable_from<'a, D: 'static>(
    machine: &'a StateMachine<D>,
    start: &'a str,
) -> HashSet<&'a str> {
    let mut seen = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(name) = queue.pop_front() {
        for transition in machine.transitions() {
            let next = transition.destination().name();
            if transition.source().name() == name && seen.insert(next) {
                queue.push_back(next);
            }
        }
    }
    seen
}

impl<D: 'static> StateMachine<D> {
    /// Report definition issues. See [`validate`].
    pub fn validate(&self) -> Validation<(), NonEmptyVec<DefinitionIssue>> {
        validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Event, State};

    fn issues(machine: &StateMachine) -> Vec<DefinitionIssue> {
        match machine.validate() {
            Validation::Failure(errors) => errors.iter().cloned().collect(),
            Validation::Success(_) => Vec::new(),
        }
    }

    #[test]
    fn well_formed_machine_passes() {
        let mut machine: StateMachine = StateMachine::in_memory("ok");
        let a = State::new("A");
        let b = State::new("B");
        let go = Event::new("go");
        machine.add_initial_state(a.clone()).unwrap();
        machine.add_state(b.clone()).unwrap();
        machine.add_event(go.clone());
        machine.add_transition(&a, &b, &go).unwrap();
        machine.add_transition(&b, &a, &go).unwrap();

        assert!(machine.validate().is_success());
    }

    #[test]
    fn validation_accumulates_all_issues() {
        let mut machine: StateMachine = StateMachine::in_memory("messy");
        let a = State::new("A");
        let b = State::new("B");
        let c = State::new("C");
        let go = Event::new("go");
        machine.add_initial_state(a.clone()).unwrap();
        machine.add_state(b.clone()).unwrap();
        machine.add_state(c).unwrap();
        machine.add_event(go.clone());
        machine.add_event(Event::new("go"));
        machine.add_transition(&a, &b, &go).unwrap();
        machine.add_self_transition(&a, &go).unwrap();

        let found = issues(&machine);

        assert_eq!(found.len(), 3);
        assert!(found.contains(&DefinitionIssue::DuplicateEvent {
            name: "go".to_string(),
            count: 2,
        }));
        assert!(found.contains(&DefinitionIssue::ShadowedTransition {
            state: "A".to_string(),
            event: "go".to_string(),
            index: 1,
            shadowed_by: 0,
        }));
        assert!(found.contains(&DefinitionIssue::UnreachableState {
            name: "C".to_string(),
        }));
    }

    #[test]
    fn missing_initial_state_is_reported() {
        let mut machine: StateMachine = StateMachine::in_memory("headless");
        machine.add_state(State::new("A")).unwrap();

        assert_eq!(issues(&machine), vec![DefinitionIssue::MissingInitialState]);
    }
}
