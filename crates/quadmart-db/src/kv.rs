use std::future::Future;

use crate::error::KvError;

/// A flat string key-value primitive with no queries and no transactions.
///
/// Each call is atomic on its own; nothing spans two calls.
pub trait KvBackend: Send + Sync {
    /// Returns `None` when the key has never been written or was removed.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, KvError>> + Send;

    /// Replaces the whole value stored under `key`.
    fn set(&self, key: &str, value: String) -> impl Future<Output = Result<(), KvError>> + Send;

    /// Removing an absent key succeeds.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), KvError>> + Send;
}
