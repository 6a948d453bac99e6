//! Durable storage of the full collection set.
//!
//! # Responsibilities
//! - Load the last committed snapshot at startup
//! - Overwrite the snapshot after every mutation
//!
//! # Design Decisions
//! - Whole-state snapshots, no append log
//! - File writes go to a sibling temp file, are fsynced, then renamed
//!   over the target so a crash never leaves a half-written file
//! - A missing file is an empty store

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::store::StoreError;

/// Collection name → records in insertion order.
pub type Snapshot = BTreeMap<String, Vec<Map<String, Value>>>;

/// Backend that stores and restores snapshots.
pub trait Persistence: Send + std::fmt::Debug {
    fn load(&self) -> Result<Snapshot, StoreError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Snapshot persisted as a JSON document on local disk.
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> Result<Snapshot, StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "No store file yet, starting empty");
            return Ok(Snapshot::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;
        tracing::info!(
            path = %self.path.display(),
            collections = snapshot.len(),
            "Loaded store file"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let temp = self.temp_path();
        {
            let file = File::create(&temp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, snapshot)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "Store file written");
        Ok(())
    }
}

/// In-memory backend. Clones share the same saved snapshot, so a store can
/// be "restarted" from a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    saved: Arc<Mutex<Snapshot>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of the last saved snapshot.
    pub fn saved(&self) -> Snapshot {
        self.saved.lock().expect("memory persistence mutex poisoned").clone()
    }
}

impl Persistence for MemoryPersistence {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.saved())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("simulated write failure")));
        }
        *self.saved.lock().expect("memory persistence mutex poisoned") = snapshot.clone();
        Ok(())
    }
}
