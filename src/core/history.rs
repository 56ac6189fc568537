//! Record of fired transitions.
//!
//! Every transition the machine moves through is appended to its history,
//! giving callers an audit trail of the path taken in the current run. A
//! bounded history forgets its oldest records first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which body a transition runs when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    /// Action, then exit(source), then entry(destination).
    Normal,
    /// Action, then exit and entry of the same state.
    SelfLoop,
    /// Action only, no exit or entry.
    Null,
}

/// Record of a single fired transition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Name of the triggering event
    pub event: String,
    /// Name of the state left
    pub from: String,
    /// Name of the state arrived at
    pub to: String,
    pub kind: TransitionKind,
    /// When the transition fired
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of fired transitions.
///
/// # Example
///
/// ```rust
/// use chrono::Utc;
/// use resumable_fsm::core::{History, TransitionKind, TransitionRecord};
///
/// let mut history = History::new();
/// history.record(TransitionRecord {
///     event: "0".into(),
///     from: "A".into(),
///     to: "B".into(),
///     kind: TransitionKind::Normal,
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.path(), vec!["A", "B"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct History {
    records: Vec<TransitionRecord>,
    #[serde(default)]
    limit: Option<usize>,
}

impl History {
    /// An unbounded history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            limit: None,
        }
    }

    /// A history that keeps at most `limit` records.
    pub fn bounded(limit: usize) -> Self {
        Self {
            records: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Change the cap, dropping the oldest records if already over it.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = Some(limit);
        self.trim();
    }

    pub fn record(&mut self, record: TransitionRecord) {
        self.records.push(record);
        self.trim();
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn trim(&mut self) {
        if let Some(limit) = self.limit {
            let excess = self.records.len().saturating_sub(limit);
            self.records.drain(..excess);
        }
    }

    /// Names of the states traversed: the first source, then each destination.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            path.push(first.from.as_str());
        }
        for record in &self.records {
            path.push(record.to.as_str());
        }
        path
    }

    /// Time elapsed between the first and last recorded transition.
    ///
    /// Returns `None` when nothing has been recorded.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.records.first(), self.records.last()) {
            last.timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok()
        } else {
            None
        }
    }

    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(from: &str, to: &str, timestamp: DateTime<Utc>) -> TransitionRecord {
        TransitionRecord {
            event: "e".to_string(),
            from: from.to_string(),
            to: to.to_string(),
            kind: TransitionKind::Normal,
            timestamp,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = History::new();
        assert!(history.is_empty());
        assert!(history.path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn path_returns_state_sequence() {
        let mut history = History::new();
        history.record(record("A", "B", Utc::now()));
        history.record(record("B", "C", Utc::now()));

        assert_eq!(history.path(), vec!["A", "B", "C"]);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn duration_spans_first_to_last() {
        let start = Utc::now();
        let mut history = History::new();
        history.record(record("A", "B", start));
        history.record(record("B", "C", start + chrono::Duration::milliseconds(25)));

        assert_eq!(history.duration(), Some(Duration::from_millis(25)));
    }

    #[test]
    fn single_record_has_zero_duration() {
        let mut history = History::new();
        history.record(record("A", "A", Utc::now()));

        assert_eq!(history.duration(), Some(Duration::from_secs(0)));
    }

    #[test]
    fn bounded_history_drops_oldest_first() {
        let mut history = History::bounded(2);
        history.record(record("A", "B", Utc::now()));
        history.record(record("B", "C", Utc::now()));
        history.record(record("C", "D", Utc::now()));

        assert_eq!(history.len(), 2);
        assert_eq!(history.path(), vec!["B", "C", "D"]);
    }

    #[test]
    fn lowering_the_limit_trims_immediately() {
        let mut history = History::new();
        for _ in 0..5 {
            history.record(record("A", "A", Utc::now()));
        }

        history.set_limit(3);

        assert_eq!(history.len(), 3);
        assert_eq!(history.limit(), Some(3));
    }

    #[test]
    fn clear_keeps_the_limit() {
        let mut history = History::bounded(4);
        history.record(record("A", "B", Utc::now()));

        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.limit(), Some(4));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = History::new();
        history.record(record("A", "B", Utc::now()));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: History = serde_json::from_str(&json).unwrap();

        assert_eq!(history.records(), deserialized.records());
    }
}
