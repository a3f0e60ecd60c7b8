use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use shared::domain::{EmptyItemName, InventoryItem, InventorySnapshot, ItemName, ItemState};
use shared::protocol::ItemFields;
use store::InventoryStore;

pub const DEFAULT_COLLECTION: &str = "inventory";

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("invalid item name: {0}")]
    InvalidName(#[from] EmptyItemName),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Published whenever the in-memory snapshot is replaced by a refresh.
/// Send failures (nobody subscribed, or a subscriber torn down mid-flight)
/// are ignored, so a late update lands as a no-op.
#[derive(Debug, Clone)]
pub enum InventoryEvent {
    SnapshotReplaced(InventorySnapshot),
}

/// UI-facing surface of the inventory core: read the current snapshot or
/// a filtered view of it, and hand in add/remove intents.
#[async_trait]
pub trait InventoryHandle: Send + Sync {
    async fn refresh(&self) -> Result<InventorySnapshot, InventoryError>;
    async fn add_or_increment(&self, name: &str) -> Result<(), InventoryError>;
    async fn remove_or_decrement(&self, name: &str) -> Result<(), InventoryError>;
    async fn snapshot(&self) -> InventorySnapshot;
    async fn search(&self, query: &str) -> InventorySnapshot;
    fn subscribe_events(&self) -> broadcast::Receiver<InventoryEvent>;
}

/// Single in-process mediator between UI intents and the remote store.
///
/// Every mutation goes through the store and ends with a full refresh, so
/// after any completed call the snapshot is a faithful copy of store
/// state at the time of its listing query. Nothing is cached across
/// mutations.
pub struct InventoryController {
    store: Arc<dyn InventoryStore>,
    collection: String,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<InventoryEvent>,
}

struct ControllerState {
    snapshot: InventorySnapshot,
    refreshed_at: Option<DateTime<Utc>>,
}

fn state_from_fields(fields: Option<ItemFields>) -> ItemState {
    match fields {
        Some(fields) => ItemState::from_persisted(fields.quantity),
        None => ItemState::Absent,
    }
}

impl InventoryController {
    pub fn new(store: Arc<dyn InventoryStore>) -> Arc<Self> {
        Self::with_collection(store, DEFAULT_COLLECTION)
    }

    pub fn with_collection(
        store: Arc<dyn InventoryStore>,
        collection: impl Into<String>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            store,
            collection: collection.into(),
            inner: Mutex::new(ControllerState {
                snapshot: InventorySnapshot::default(),
                refreshed_at: None,
            }),
            events,
        })
    }

    /// Rebuilds the snapshot wholesale from a collection listing and
    /// replaces the in-memory state; no incremental merge. Documents with
    /// a blank key or a zero quantity (which this protocol never writes)
    /// are skipped.
    pub async fn refresh(&self) -> Result<InventorySnapshot, InventoryError> {
        let documents = self.store.list_all(&self.collection).await?;
        let mut items = Vec::with_capacity(documents.len());
        for entry in documents {
            let Ok(name) = ItemName::new(&entry.key) else {
                warn!(key = %entry.key, "skipping document with blank key");
                continue;
            };
            match ItemState::from_persisted(entry.fields.quantity) {
                ItemState::Present(quantity) => items.push(InventoryItem { name, quantity }),
                ItemState::Absent => {
                    warn!(key = %entry.key, "skipping document with zero quantity");
                }
            }
        }
        let snapshot = InventorySnapshot::new(items);

        {
            let mut guard = self.inner.lock().await;
            guard.snapshot = snapshot.clone();
            guard.refreshed_at = Some(Utc::now());
        }
        let _ = self
            .events
            .send(InventoryEvent::SnapshotReplaced(snapshot.clone()));
        Ok(snapshot)
    }

    /// Adds one unit of `name`, creating the document at quantity 1 when
    /// absent, then refreshes.
    ///
    /// The read and the write are two separate round trips with no
    /// compare-and-swap: two concurrent increments of the same name can
    /// lose one update. Last writer wins.
    pub async fn increment(&self, name: &str) -> Result<(), InventoryError> {
        let name = ItemName::new(name)?;
        let current = self.store.get(&self.collection, name.as_str()).await?;
        let quantity = state_from_fields(current).incremented();
        self.store
            .set(
                &self.collection,
                name.as_str(),
                ItemFields {
                    quantity: quantity.get(),
                },
            )
            .await?;
        debug!(item = %name, quantity = quantity.get(), "incremented");
        self.refresh().await?;
        Ok(())
    }

    /// Removes one unit of `name`: quantity 1 deletes the document
    /// outright, larger quantities are written back minus one, and an
    /// absent name mutates nothing. Refreshes in every case. Same
    /// unguarded read-then-write window as `increment`.
    pub async fn decrement(&self, name: &str) -> Result<(), InventoryError> {
        let name = ItemName::new(name)?;
        let current = self.store.get(&self.collection, name.as_str()).await?;
        match state_from_fields(current) {
            ItemState::Absent => {
                debug!(item = %name, "decrement of absent item ignored");
            }
            state => match state.decremented() {
                ItemState::Absent => {
                    self.store.delete(&self.collection, name.as_str()).await?;
                    debug!(item = %name, "removed at quantity floor");
                }
                ItemState::Present(quantity) => {
                    self.store
                        .set(
                            &self.collection,
                            name.as_str(),
                            ItemFields {
                                quantity: quantity.get(),
                            },
                        )
                        .await?;
                    debug!(item = %name, quantity = quantity.get(), "decremented");
                }
            },
        }
        self.refresh().await?;
        Ok(())
    }

    pub async fn snapshot(&self) -> InventorySnapshot {
        self.inner.lock().await.snapshot.clone()
    }

    /// Filtered view over the current snapshot; no store access.
    pub async fn search(&self, query: &str) -> InventorySnapshot {
        self.inner.lock().await.snapshot.filter(query)
    }

    pub async fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().await.refreshed_at
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<InventoryEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl InventoryHandle for Arc<InventoryController> {
    async fn refresh(&self) -> Result<InventorySnapshot, InventoryError> {
        InventoryController::refresh(self).await
    }

    async fn add_or_increment(&self, name: &str) -> Result<(), InventoryError> {
        self.increment(name).await
    }

    async fn remove_or_decrement(&self, name: &str) -> Result<(), InventoryError> {
        self.decrement(name).await
    }

    async fn snapshot(&self) -> InventorySnapshot {
        InventoryController::snapshot(self).await
    }

    async fn search(&self, query: &str) -> InventorySnapshot {
        InventoryController::search(self, query).await
    }

    fn subscribe_events(&self) -> broadcast::Receiver<InventoryEvent> {
        InventoryController::subscribe_events(self)
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
