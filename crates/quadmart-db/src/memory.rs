use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Barrier;

use crate::error::KvError;
use crate::kv::KvBackend;

/// Process-local key-value store.
///
/// Clones share the same entries, so two listing stores built from clones
/// behave like two screens writing to one device store. Failure injection
/// and the read rendezvous exist for tests.
#[derive(Clone, Default)]
pub struct MemoryKv {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    /// The first `parties` reads wait on the barrier after taking their snapshot.
    rendezvous: Option<(Arc<Barrier>, usize)>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the first `parties` reads each wait until all of them have read,
    /// forcing their read-modify-write cycles to overlap.
    pub fn with_read_rendezvous(parties: usize) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                rendezvous: Some((Arc::new(Barrier::new(parties)), parties)),
                ..MemoryInner::default()
            }),
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `set`/`remove` calls that reached the map.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Bypass the async interface, e.g. to plant a corrupt blob.
    pub fn insert_raw(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    pub fn raw(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, KvError> {
        self.inner.entries.lock().map_err(|_| KvError::Poisoned)
    }

    fn check_writable(&self) -> Result<(), KvError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("write rejected".into()));
        }
        Ok(())
    }
}

impl KvBackend for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(KvError::Unavailable("read rejected".into()));
        }

        let value = self.raw(key)?;
        let nth = self.inner.reads.fetch_add(1, Ordering::SeqCst);

        if let Some((barrier, parties)) = &self.inner.rendezvous {
            if nth < *parties {
                barrier.wait().await;
            }
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), KvError> {
        self.check_writable()?;
        self.entries()?.insert(key.to_string(), value);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        self.check_writable()?;
        self.entries()?.remove(key);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_entries() {
        let a = MemoryKv::new();
        let b = a.clone();

        a.set("k", "v".into()).await.unwrap();
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(a.write_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures() {
        let kv = MemoryKv::new();
        kv.insert_raw("k", "v").unwrap();

        kv.set_fail_reads(true);
        assert!(matches!(kv.get("k").await, Err(KvError::Unavailable(_))));

        kv.set_fail_writes(true);
        assert!(kv.set("k", "w".into()).await.is_err());
        assert!(kv.remove("k").await.is_err());
        assert_eq!(kv.raw("k").unwrap().as_deref(), Some("v"));
        assert_eq!(kv.write_count(), 0);
    }
}
