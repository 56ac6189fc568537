//! In-process state store.

use super::{Snapshot, StateStore, StoreError};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Keeps snapshots in memory. Useful for tests and for machines that only
/// need stop/restart within a single process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<String, Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of machines with a stored snapshot.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

impl StateStore for MemoryStore {
    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.slots
            .lock()
            .insert(snapshot.machine.clone(), snapshot.clone());
        Ok(())
    }

    fn read_snapshot(&self, machine: &str) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.slots.lock().get(machine).cloned())
    }

    fn clear_snapshot(&self, machine: &str) -> Result<(), StoreError> {
        self.slots.lock().remove(machine);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_snapshot_reads_as_none() {
        let store = MemoryStore::new();
        assert!(store.read_snapshot("m").unwrap().is_none());
    }

    #[test]
    fn write_overwrites_previous_snapshot() {
        let store = MemoryStore::new();
        store.write_snapshot(&Snapshot::new("m", "A")).unwrap();
        store.write_snapshot(&Snapshot::new("m", "B")).unwrap();

        let snapshot = store.read_snapshot("m").unwrap().unwrap();
        assert_eq!(snapshot.state, "B");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn machines_do_not_share_slots() {
        let store = MemoryStore::new();
        store.write_snapshot(&Snapshot::new("first", "A")).unwrap();
        store.write_snapshot(&Snapshot::new("second", "Z")).unwrap();

        assert_eq!(store.read_snapshot("first").unwrap().unwrap().state, "A");
        assert_eq!(store.read_snapshot("second").unwrap().unwrap().state, "Z");
    }

    #[test]
    fn clear_removes_only_that_machine() {
        let store = MemoryStore::new();
        store.write_snapshot(&Snapshot::new("first", "A")).unwrap();
        store.write_snapshot(&Snapshot::new("second", "Z")).unwrap();

        store.clear_snapshot("first").unwrap();
        store.clear_snapshot("never-written").unwrap();

        assert!(store.read_snapshot("first").unwrap().is_none());
        assert!(store.read_snapshot("second").unwrap().is_some());
    }
}
