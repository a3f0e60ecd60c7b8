use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;
use url::Url;

use shared::error::ApiError;
use shared::protocol::{DocumentEntry, ItemFields, ListDocumentsResponse};

use crate::InventoryStore;

/// HTTP adapter for a remote key-document service.
///
/// Documents live under
/// `{base}/collections/{collection}/documents/{key}`; `PUT` replaces the
/// full field set (creating the document when absent), `DELETE` removes
/// it, and a collection-level `GET` lists every entry.
pub struct RemoteInventoryStore {
    http: Client,
    base: Url,
}

impl RemoteInventoryStore {
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }

    fn documents_url(&self, collection: &str, key: Option<&str>) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("store url '{}' cannot be a base", self.base))?;
            segments.pop_if_empty();
            segments.push("collections").push(collection).push("documents");
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }
}

/// Turns a non-success response into an error, preferring the service's
/// own `ApiError` body over the bare status code.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().clone();
    let body = response.text().await.unwrap_or_default();
    if let Ok(api_error) = serde_json::from_str::<ApiError>(&body) {
        return Err(anyhow!(
            "store request {url} rejected: {:?}: {}",
            api_error.code,
            api_error.message
        ));
    }
    Err(anyhow!("store request {url} failed with status {status}"))
}

#[async_trait]
impl InventoryStore for RemoteInventoryStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<DocumentEntry>> {
        let url = self.documents_url(collection, None)?;
        let response = check_status(self.http.get(url).send().await?).await?;
        let listing: ListDocumentsResponse = response.json().await?;
        debug!(collection, documents = listing.documents.len(), "listed collection");
        Ok(listing.documents)
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Option<ItemFields>> {
        let url = self.documents_url(collection, Some(key))?;
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let fields: ItemFields = check_status(response).await?.json().await?;
        Ok(Some(fields))
    }

    async fn set(&self, collection: &str, key: &str, fields: ItemFields) -> Result<()> {
        let url = self.documents_url(collection, Some(key))?;
        check_status(self.http.put(url).json(&fields).send().await?).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        let url = self.documents_url(collection, Some(key))?;
        let response = self.http.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }
}
