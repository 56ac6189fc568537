//! Snapshot persistence for crash recovery.
//!
//! A machine writes a `Snapshot` naming its current state on every `start`
//! and on every fired transition. `restart` reads it back to resume without
//! replaying events. Each store keeps exactly one snapshot per machine name,
//! overwritten on each write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::{FileStore, SnapshotFormat};
pub use memory::MemoryStore;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// The persisted identity of a machine's current state.
/// Does NOT include callbacks (not serializable).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: Uuid,

    /// Name of the machine that wrote the snapshot
    pub machine: String,

    /// Name of the current state
    pub state: String,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(machine: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4(),
            machine: machine.into(),
            state: state.into(),
            taken_at: Utc::now(),
        }
    }

    /// Check that this snapshot can be restored into `machine`.
    pub fn validate_for(&self, machine: &str) -> Result<(), StoreError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            });
        }
        if self.machine != machine {
            return Err(StoreError::ValidationFailed(format!(
                "snapshot belongs to machine '{}', not '{}'",
                self.machine, machine
            )));
        }
        Ok(())
    }
}

/// Durable single-slot storage of "the last known current state".
///
/// Implementations must fail loudly when the medium is unavailable, and
/// must report a snapshot that was never written as `Ok(None)`.
pub trait StateStore: Send + Sync {
    /// Store `snapshot` as the sole snapshot for `snapshot.machine`.
    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Read the most recent snapshot for `machine`, if any.
    fn read_snapshot(&self, machine: &str) -> Result<Option<Snapshot>, StoreError>;

    /// Forget the snapshot for `machine`. Clearing a missing snapshot is not an error.
    fn clear_snapshot(&self, machine: &str) -> Result<(), StoreError>;
}
