use super::*;
use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tokio::{net::TcpListener, sync::Mutex};
use url::Url;

use shared::error::{ApiError, ErrorCode};
use shared::protocol::ListDocumentsResponse;

#[derive(Clone, Default)]
struct FakeStoreState {
    documents: Arc<Mutex<HashMap<String, ItemFields>>>,
    fail_listing: bool,
}

async fn list_documents(
    State(state): State<FakeStoreState>,
    Path(_collection): Path<String>,
) -> Result<Json<ListDocumentsResponse>, (StatusCode, Json<ApiError>)> {
    if state.fail_listing {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new(ErrorCode::Unavailable, "backing store offline")),
        ));
    }
    let documents = state.documents.lock().await;
    Ok(Json(ListDocumentsResponse {
        documents: documents
            .iter()
            .map(|(key, fields)| DocumentEntry {
                key: key.clone(),
                fields: *fields,
            })
            .collect(),
    }))
}

async fn get_document(
    State(state): State<FakeStoreState>,
    Path((_collection, key)): Path<(String, String)>,
) -> Result<Json<ItemFields>, StatusCode> {
    let documents = state.documents.lock().await;
    documents.get(&key).copied().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn put_document(
    State(state): State<FakeStoreState>,
    Path((_collection, key)): Path<(String, String)>,
    Json(fields): Json<ItemFields>,
) -> StatusCode {
    state.documents.lock().await.insert(key, fields);
    StatusCode::NO_CONTENT
}

async fn delete_document(
    State(state): State<FakeStoreState>,
    Path((_collection, key)): Path<(String, String)>,
) -> StatusCode {
    match state.documents.lock().await.remove(&key) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn spawn_fake_store(state: FakeStoreState) -> Result<Url> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/collections/:collection/documents", get(list_documents))
        .route(
            "/collections/:collection/documents/:key",
            get(get_document).put(put_document).delete(delete_document),
        )
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Url::parse(&format!("http://{addr}"))?)
}

async fn remote_store() -> RemoteInventoryStore {
    let base = spawn_fake_store(FakeStoreState::default())
        .await
        .expect("spawn fake store");
    RemoteInventoryStore::new(base)
}

fn fields(quantity: u32) -> ItemFields {
    ItemFields { quantity }
}

#[tokio::test]
async fn remote_get_of_missing_document_returns_none() {
    let store = remote_store().await;
    let found = store.get("inventory", "apple").await.expect("get");
    assert_eq!(found, None);
}

#[tokio::test]
async fn remote_set_then_get_roundtrips_fields() {
    let store = remote_store().await;
    store.set("inventory", "apple", fields(3)).await.expect("set");
    let found = store.get("inventory", "apple").await.expect("get");
    assert_eq!(found, Some(fields(3)));
}

#[tokio::test]
async fn remote_set_replaces_existing_fields() {
    let store = remote_store().await;
    store.set("inventory", "apple", fields(1)).await.expect("set");
    store.set("inventory", "apple", fields(7)).await.expect("set again");
    let found = store.get("inventory", "apple").await.expect("get");
    assert_eq!(found, Some(fields(7)));
}

#[tokio::test]
async fn remote_list_all_returns_every_document() {
    let store = remote_store().await;
    store.set("inventory", "apple", fields(2)).await.expect("set");
    store.set("inventory", "banana", fields(1)).await.expect("set");

    let mut listed = store.list_all("inventory").await.expect("list");
    listed.sort_by(|a, b| a.key.cmp(&b.key));
    assert_eq!(
        listed,
        vec![
            DocumentEntry {
                key: "apple".into(),
                fields: fields(2)
            },
            DocumentEntry {
                key: "banana".into(),
                fields: fields(1)
            },
        ]
    );
}

#[tokio::test]
async fn remote_delete_removes_document() {
    let store = remote_store().await;
    store.set("inventory", "apple", fields(1)).await.expect("set");
    store.delete("inventory", "apple").await.expect("delete");
    let found = store.get("inventory", "apple").await.expect("get");
    assert_eq!(found, None);
}

#[tokio::test]
async fn remote_delete_of_missing_key_is_ok() {
    let store = remote_store().await;
    store.delete("inventory", "apple").await.expect("delete");
}

#[tokio::test]
async fn remote_keys_survive_url_encoding() {
    let store = remote_store().await;
    store
        .set("inventory", "green tea", fields(4))
        .await
        .expect("set");
    let found = store.get("inventory", "green tea").await.expect("get");
    assert_eq!(found, Some(fields(4)));
}

#[tokio::test]
async fn remote_surfaces_service_error_body() {
    let base = spawn_fake_store(FakeStoreState {
        fail_listing: true,
        ..FakeStoreState::default()
    })
    .await
    .expect("spawn fake store");
    let store = RemoteInventoryStore::new(base);

    let err = store.list_all("inventory").await.expect_err("must fail");
    let text = err.to_string();
    assert!(
        text.contains("Unavailable") && text.contains("backing store offline"),
        "unexpected error: {text}"
    );
}

#[tokio::test]
async fn memory_set_get_delete_roundtrip() {
    let store = MemoryInventoryStore::new();
    store.set("inventory", "apple", fields(2)).await.expect("set");
    assert_eq!(
        store.get("inventory", "apple").await.expect("get"),
        Some(fields(2))
    );

    store.delete("inventory", "apple").await.expect("delete");
    assert_eq!(store.get("inventory", "apple").await.expect("get"), None);
}

#[tokio::test]
async fn memory_set_is_full_replace() {
    let store = MemoryInventoryStore::new();
    store.set("inventory", "apple", fields(1)).await.expect("set");
    store.set("inventory", "apple", fields(9)).await.expect("set again");
    assert_eq!(
        store.get("inventory", "apple").await.expect("get"),
        Some(fields(9))
    );
}

#[tokio::test]
async fn memory_collections_are_isolated() {
    let store = MemoryInventoryStore::new();
    store.set("inventory", "apple", fields(1)).await.expect("set");
    assert!(store.list_all("other").await.expect("list").is_empty());
    assert_eq!(store.list_all("inventory").await.expect("list").len(), 1);
}

#[tokio::test]
async fn memory_delete_of_missing_key_is_ok() {
    let store = MemoryInventoryStore::new();
    store.delete("inventory", "apple").await.expect("delete");
}
