//! Directory-backed state store.

use super::{Snapshot, StateStore, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// On-disk encoding of a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    /// Pretty-printed JSON, readable by humans
    #[default]
    Json,
    /// Compact bincode encoding
    Binary,
}

impl SnapshotFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Binary => "bin",
        }
    }

    fn encode(self, snapshot: &Snapshot) -> Result<Vec<u8>, StoreError> {
        match self {
            Self::Json => serde_json::to_vec_pretty(snapshot)
                .map_err(|e| StoreError::SerializationFailed(e.to_string())),
            Self::Binary => bincode::serialize(snapshot)
                .map_err(|e| StoreError::SerializationFailed(e.to_string())),
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<Snapshot, StoreError> {
        match self {
            Self::Json => serde_json::from_slice(bytes)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string())),
            Self::Binary => bincode::deserialize(bytes)
                .map_err(|e| StoreError::DeserializationFailed(e.to_string())),
        }
    }
}

/// Stores one snapshot file per machine inside a directory.
///
/// Writes go to a temporary file that is then renamed over the previous
/// snapshot, so a crash mid-write never leaves a truncated snapshot behind.
#[derive(Clone, Debug)]
pub struct FileStore {
    directory: PathBuf,
    format: SnapshotFormat,
}

impl FileStore {
    /// Open a store rooted at `directory`, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>, format: SnapshotFormat) -> Result<Self, StoreError> {
        let directory = directory.into();
        fs::create_dir_all(&directory).map_err(|source| StoreError::Io {
            path: directory.clone(),
            source,
        })?;
        Ok(Self { directory, format })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn format(&self) -> SnapshotFormat {
        self.format
    }

    /// Path of the snapshot file for `machine`.
    ///
    /// ASCII letters, digits, `-` and `_` are kept; every other byte is
    /// written as `%XX`, so distinct machine names never share a file.
    pub fn snapshot_path(&self, machine: &str) -> PathBuf {
        let mut stem = String::with_capacity(machine.len());
        for byte in machine.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                stem.push(char::from(byte));
            } else {
                stem.push_str(&format!("%{byte:02X}"));
            }
        }
        self.directory
            .join(format!("{stem}.snapshot.{}", self.format.extension()))
    }
}

impl StateStore for FileStore {
    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let path = self.snapshot_path(&snapshot.machine);
        let bytes = self.format.encode(snapshot)?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, bytes).map_err(|source| StoreError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        tracing::debug!(
            machine = %snapshot.machine,
            state = %snapshot.state,
            path = ?path,
            "Snapshot written"
        );
        Ok(())
    }

    fn read_snapshot(&self, machine: &str) -> Result<Option<Snapshot>, StoreError> {
        let path = self.snapshot_path(machine);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let snapshot = self.format.decode(&bytes)?;
        snapshot.validate_for(machine)?;

        tracing::debug!(%machine, state = %snapshot.state, "Snapshot loaded");
        Ok(Some(snapshot))
    }

    fn clear_snapshot(&self, machine: &str) -> Result<(), StoreError> {
        let path = self.snapshot_path(machine);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::SNAPSHOT_VERSION;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Json).unwrap();

        assert!(store.read_snapshot("m").unwrap().is_none());
    }

    #[test]
    fn json_snapshot_survives_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let written = Snapshot::new("Triple Event", "D");
        FileStore::new(dir.path(), SnapshotFormat::Json)
            .unwrap()
            .write_snapshot(&written)
            .unwrap();

        let reopened = FileStore::new(dir.path(), SnapshotFormat::Json).unwrap();
        let read = reopened.read_snapshot("Triple Event").unwrap().unwrap();

        assert_eq!(read, written);
    }

    #[test]
    fn binary_snapshot_is_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Binary).unwrap();
        let written = Snapshot::new("m", "B");

        store.write_snapshot(&written).unwrap();

        assert_eq!(store.read_snapshot("m").unwrap(), Some(written));
    }

    #[test]
    fn write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Json).unwrap();
        store.write_snapshot(&Snapshot::new("m", "A")).unwrap();
        store.write_snapshot(&Snapshot::new("m", "B")).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();

        assert_eq!(files, vec!["m.snapshot.json".to_string()]);
    }

    #[test]
    fn machine_names_are_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Binary).unwrap();

        let path = store.snapshot_path("Triple Event/../x");
        assert_eq!(
            path,
            dir.path().join("Triple%20Event%2F%2E%2E%2Fx.snapshot.bin")
        );
    }

    #[test]
    fn similar_names_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Json).unwrap();
        store.write_snapshot(&Snapshot::new("a b", "A")).unwrap();
        store.write_snapshot(&Snapshot::new("a_b", "B")).unwrap();
        store.write_snapshot(&Snapshot::new("a%20b", "C")).unwrap();

        let state = |name: &str| store.read_snapshot(name).unwrap().map(|s| s.state);
        assert_eq!(state("a b").as_deref(), Some("A"));
        assert_eq!(state("a_b").as_deref(), Some("B"));
        assert_eq!(state("a%20b").as_deref(), Some("C"));
    }

    #[test]
    fn snapshot_under_the_wrong_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Json).unwrap();
        store.write_snapshot(&Snapshot::new("a", "A")).unwrap();
        fs::rename(store.snapshot_path("a"), store.snapshot_path("b")).unwrap();

        let err = store.read_snapshot("b").unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailed(_)));
    }

    #[test]
    fn corrupt_file_is_a_deserialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Json).unwrap();
        fs::write(store.snapshot_path("m"), b"not json").unwrap();

        let err = store.read_snapshot("m").unwrap_err();
        assert!(matches!(err, StoreError::DeserializationFailed(_)));
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Json).unwrap();
        let mut snapshot = Snapshot::new("m", "A");
        snapshot.version = SNAPSHOT_VERSION + 1;
        store.write_snapshot(&snapshot).unwrap();

        assert!(matches!(
            store.read_snapshot("m"),
            Err(StoreError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn clear_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path(), SnapshotFormat::Json).unwrap();
        store.write_snapshot(&Snapshot::new("m", "A")).unwrap();

        store.clear_snapshot("m").unwrap();
        store.clear_snapshot("m").unwrap();

        assert!(store.read_snapshot("m").unwrap().is_none());
    }

    #[test]
    fn unwritable_directory_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("gone"), SnapshotFormat::Json).unwrap();
        fs::remove_dir(store.directory()).unwrap();

        let err = store.write_snapshot(&Snapshot::new("m", "A")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
