//! Shared durable key-value area between display surfaces.
//!
//! Every handle belongs to an execution context. Change notifications are
//! delivered only to *other* contexts that share the same notifier, mirroring
//! platform storage events; writes from another process are never announced
//! and must be picked up by polling.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::error::SyncError;

pub type ContextId = u64;

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

fn next_context() -> ContextId {
    NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed)
}

const EVENT_CAPACITY: usize = 64;

/// A key in the shared area changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
    pub origin: ContextId,
}

pub trait SharedArea: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SyncError>;
    fn remove(&self, key: &str) -> Result<(), SyncError>;

    /// Listen for changes made by other contexts.
    fn watch(&self) -> ChangeFeed;
}

#[derive(Clone)]
struct Notifier {
    tx: broadcast::Sender<StorageEvent>,
}

impl Notifier {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    fn notify(&self, key: &str, new_value: Option<&str>, origin: ContextId) {
        // No listeners is fine.
        let _ = self.tx.send(StorageEvent {
            key: key.to_string(),
            new_value: new_value.map(str::to_string),
            origin,
        });
    }

    fn feed(&self, context: ContextId) -> ChangeFeed {
        ChangeFeed {
            rx: self.tx.subscribe(),
            context,
        }
    }
}

/// Stream of [`StorageEvent`]s originating outside the listening context.
pub struct ChangeFeed {
    rx: broadcast::Receiver<StorageEvent>,
    context: ContextId,
}

impl ChangeFeed {
    /// Next foreign change, or `None` once every writer handle is gone.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.origin != self.context => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "Change feed lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Process-local shared area. Use [`MemoryArea::context`] to get a handle for
/// another execution context over the same entries.
#[derive(Clone)]
pub struct MemoryArea {
    entries: Arc<RwLock<HashMap<String, String>>>,
    notifier: Notifier,
    context: ContextId,
}

impl Default for MemoryArea {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArea {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            notifier: Notifier::new(),
            context: next_context(),
        }
    }

    /// A handle on the same entries from a different execution context.
    pub fn context(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            notifier: self.notifier.clone(),
            context: next_context(),
        }
    }

    pub fn context_id(&self) -> ContextId {
        self.context
    }
}

impl SharedArea for MemoryArea {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        let entries = self.entries.read().map_err(|_| SyncError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        self.entries
            .write()
            .map_err(|_| SyncError::Poisoned)?
            .insert(key.to_string(), value.to_string());
        self.notifier.notify(key, Some(value), self.context);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SyncError> {
        let removed = self
            .entries
            .write()
            .map_err(|_| SyncError::Poisoned)?
            .remove(key);
        if removed.is_some() {
            self.notifier.notify(key, None, self.context);
        }
        Ok(())
    }

    fn watch(&self) -> ChangeFeed {
        self.notifier.feed(self.context)
    }
}

/// Shared area persisted as one JSON file per key in a directory.
///
/// Values are written to a temporary file and renamed into place, so readers
/// never see a half-written value. Handles opened separately on the same
/// directory (for example in two processes) share no notifier.
#[derive(Clone)]
pub struct FileArea {
    dir: PathBuf,
    notifier: Notifier,
    context: ContextId,
}

impl FileArea {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SyncError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "Opened shared area");
        Ok(Self {
            dir,
            notifier: Notifier::new(),
            context: next_context(),
        })
    }

    /// A handle on the same directory from a different execution context.
    pub fn context(&self) -> Self {
        Self {
            dir: self.dir.clone(),
            notifier: self.notifier.clone(),
            context: next_context(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl SharedArea for FileArea {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        let path = self.path_for(key);
        let tmp = path.with_extension(format!("{}.tmp", self.context));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        self.notifier.notify(key, Some(value), self.context);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SyncError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => {
                self.notifier.notify(key, None, self.context);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn watch(&self) -> ChangeFeed {
        self.notifier.feed(self.context)
    }
}
