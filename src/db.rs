//! Contact state store
//!
//! Keeps every conversation's state in memory and rewrites the whole JSON
//! file after each mutation. Writes go through a temp file and a rename, so
//! the file on disk is always a complete snapshot.

mod schema;

pub use schema::*;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("State file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shared handle to the contact table.
///
/// Every read-modify-write (an inbound event, an eviction sweep) holds the
/// lock for its whole duration. Snapshots are written with blocking `std::fs`
/// calls under that lock; the file is small and writes are serialized anyway.
#[derive(Clone)]
pub struct ContactDb {
    table: Arc<Mutex<ContactTable>>,
}

impl ContactDb {
    /// Open the state file, starting empty if it is missing or unreadable
    pub fn open(path: &Path) -> Self {
        let contacts = match load_contacts(path) {
            Ok(Some(file)) => {
                tracing::info!(path = %path.display(), contacts = file.contacts.len(), "Loaded contact state");
                file.contacts
            }
            Ok(None) => {
                tracing::info!(path = %path.display(), "No state file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "State file unreadable, starting empty");
                BTreeMap::new()
            }
        };
        Self::from_table(ContactTable {
            path: Some(path.to_path_buf()),
            contacts,
        })
    }

    /// Store with no backing file (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn in_memory() -> Self {
        Self::from_table(ContactTable {
            path: None,
            contacts: BTreeMap::new(),
        })
    }

    fn from_table(table: ContactTable) -> Self {
        Self {
            table: Arc::new(Mutex::new(table)),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, ContactTable> {
        self.table.lock().await
    }
}

/// In-memory contact mapping plus its persistence target
#[derive(Debug)]
pub struct ContactTable {
    path: Option<PathBuf>,
    contacts: BTreeMap<String, ConversationState>,
}

impl ContactTable {
    /// Existing state, or a fresh zero-valued one. Never persists.
    pub fn get(&self, id: &str) -> ConversationState {
        self.contacts.get(id).cloned().unwrap_or_default()
    }

    /// Replace the stored state and persist the full mapping.
    ///
    /// A failed write is logged; the in-memory value stays authoritative.
    pub fn put(&mut self, id: impl Into<String>, state: ConversationState) {
        self.contacts.insert(id.into(), state);
        self.persist();
    }

    /// Drop every conversation with no customer message, or whose last one is
    /// older than `horizon`. Persists once for the whole sweep.
    pub fn evict_stale(&mut self, now: Timestamp, horizon: Duration) -> usize {
        let horizon_ms = i64::try_from(horizon.as_millis()).unwrap_or(i64::MAX);
        let before = self.contacts.len();
        self.contacts.retain(|_, state| match state.last_customer_message_at {
            Some(at) => now.saturating_sub(at) <= horizon_ms,
            None => false,
        });
        let evicted = before - self.contacts.len();
        self.persist();
        evicted
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    #[allow(dead_code)] // API completeness
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    #[allow(dead_code)] // Used in tests
    pub fn contains(&self, id: &str) -> bool {
        self.contacts.contains_key(id)
    }

    /// Write the current mapping, logging instead of failing
    pub fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = write_snapshot(path, &self.contacts) {
            tracing::error!(path = %path.display(), error = %e, "Failed to persist contact state");
        }
    }
}

/// Read the state file. `Ok(None)` when it does not exist.
pub fn load_contacts(path: &Path) -> StoreResult<Option<ContactsFile>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Serialize the full mapping to `<path>.tmp` and rename it into place
pub fn write_snapshot(path: &Path, contacts: &BTreeMap<String, ConversationState>) -> StoreResult<()> {
    #[derive(serde::Serialize)]
    struct Snapshot<'a> {
        contacts: &'a BTreeMap<String, ConversationState>,
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_vec_pretty(&Snapshot { contacts })?;
    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);
    fs::write(&temp_path, json)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
