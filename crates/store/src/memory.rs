use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use shared::protocol::{DocumentEntry, ItemFields};

use crate::InventoryStore;

/// Process-local store for tests and offline runs. Listing order follows
/// map iteration and is unspecified, matching the remote contract.
#[derive(Default)]
pub struct MemoryInventoryStore {
    collections: Mutex<HashMap<String, HashMap<String, ItemFields>>>,
}

impl MemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryInventoryStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<DocumentEntry>> {
        let collections = self.collections.lock().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(documents
            .iter()
            .map(|(key, fields)| DocumentEntry {
                key: key.clone(),
                fields: *fields,
            })
            .collect())
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<ItemFields>> {
        let collections = self.collections.lock().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(key))
            .copied())
    }

    async fn set(&self, collection: &str, key: &str, fields: ItemFields) -> Result<()> {
        let mut collections = self.collections.lock().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        let mut collections = self.collections.lock().await;
        if let Some(documents) = collections.get_mut(collection) {
            documents.remove(key);
        }
        Ok(())
    }
}
