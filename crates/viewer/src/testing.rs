//! Shared helpers for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use viewer_sync::{ChangeFeed, MemoryArea, SharedArea, StateStore, SyncError};

/// Memory area whose writes can be switched to fail.
#[derive(Clone, Default)]
pub(crate) struct FlakyArea {
    inner: MemoryArea,
    failing: Arc<AtomicBool>,
}

impl FlakyArea {
    pub(crate) fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), SyncError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(std::io::Error::other("disk full").into())
        } else {
            Ok(())
        }
    }
}

impl SharedArea for FlakyArea {
    fn get(&self, key: &str) -> Result<Option<String>, SyncError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SyncError> {
        self.check()?;
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), SyncError> {
        self.check()?;
        self.inner.remove(key)
    }

    fn watch(&self) -> ChangeFeed {
        self.inner.watch()
    }
}

pub(crate) fn flaky_store() -> (StateStore, FlakyArea) {
    let area = FlakyArea::default();
    (StateStore::new(Arc::new(area.clone())), area)
}
