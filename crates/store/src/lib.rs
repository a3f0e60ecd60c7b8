use anyhow::Result;
use async_trait::async_trait;

use shared::protocol::{DocumentEntry, ItemFields};

mod memory;
mod remote;

pub use memory::MemoryInventoryStore;
pub use remote::RemoteInventoryStore;

/// Key-document capability required from the backing inventory database.
///
/// Failures to reach the store propagate to the caller as-is; no adapter
/// retries or recovers. A missing document is never an error: `get`
/// reports it as `None` and `delete` treats it as already done.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Every document in `collection`, in store-defined order.
    async fn list_all(&self, collection: &str) -> Result<Vec<DocumentEntry>>;

    /// Fields stored under `key`, or `None` when no such document exists.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<ItemFields>>;

    /// Full replace of the document's fields, creating it when absent.
    /// Not a partial merge.
    async fn set(&self, collection: &str, key: &str, fields: ItemFields) -> Result<()>;

    /// Removes the document under `key`.
    async fn delete(&self, collection: &str, key: &str) -> Result<()>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
