use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential storage i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Single persisted slot for the raw credential token.
///
/// `changes()` hands out a watch on a version counter bumped by every
/// mutation through any handle to the same slot. That counter is this
/// crate's rendition of the browser `storage` event: a second handle
/// clearing the slot (another tab logging out) wakes the re-validation
/// task in the first.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, StoreError>;
    fn save(&self, token: &str) -> Result<(), StoreError>;
    fn clear(&self) -> Result<(), StoreError>;
    fn changes(&self) -> watch::Receiver<u64>;
}

struct MemoryInner {
    slot: Mutex<Option<String>>,
    version: watch::Sender<u64>,
}

/// In-process slot. Clones share the slot, so two clones model two tabs
/// over one storage area.
#[derive(Clone)]
pub struct MemoryTokenStore {
    inner: Arc<MemoryInner>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            inner: Arc::new(MemoryInner {
                slot: Mutex::new(None),
                version,
            }),
        }
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.inner.slot.lock().expect("mutex poisoned").clone())
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        let mut guard = self.inner.slot.lock().expect("mutex poisoned");
        *guard = Some(token.to_owned());
        drop(guard);
        self.inner.version.send_modify(|v| *v += 1);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.inner.slot.lock().expect("mutex poisoned");
        let was_present = guard.take().is_some();
        drop(guard);
        // Clearing an already-empty slot is a no-op, keeping logout
        // idempotent all the way down.
        if was_present {
            self.inner.version.send_modify(|v| *v += 1);
        }
        Ok(())
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.inner.version.subscribe()
    }
}

/// File-backed slot: one file holding the raw token string.
///
/// Out-of-process edits to the file are not watched; the periodic
/// re-validation pass re-reads the file each tick and picks them up there.
#[derive(Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    version: Arc<watch::Sender<u64>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            path: path.into(),
            version: Arc::new(version),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(token.to_owned()))
                }
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        self.version.send_modify(|v| *v += 1);
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                self.version.send_modify(|v| *v += 1);
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }
}
