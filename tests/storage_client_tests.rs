// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! StorageClient tests against a local JSON API stub.
//!
//! A missing prefix or bucket must list as empty and deleting an
//! already-gone object must be a no-op: account deletion relies on both
//! (not every user has uploaded recordings).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use stageready_admin::db::StorageClient;

#[derive(Clone, Default)]
struct StubState {
    objects: Arc<Mutex<BTreeSet<String>>>,
}

#[derive(serde::Deserialize)]
struct ListParams {
    #[serde(default)]
    prefix: String,
}

async fn stub_list(
    State(stub): State<StubState>,
    Path(bucket): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if bucket == "missing-bucket" {
        return Err(StatusCode::NOT_FOUND);
    }
    let objects = stub.objects.lock().unwrap();
    let items: Vec<serde_json::Value> = objects
        .iter()
        .filter(|name| name.starts_with(&params.prefix))
        .map(|name| json!({"name": name}))
        .collect();
    Ok(Json(json!({ "items": items })))
}

async fn stub_delete(
    State(stub): State<StubState>,
    Path((_bucket, object)): Path<(String, String)>,
) -> StatusCode {
    let mut objects = stub.objects.lock().unwrap();
    if objects.remove(&object) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn spawn_stub(state: StubState) -> std::net::SocketAddr {
    let app = Router::new()
        .route("/storage/v1/b/{bucket}/o", get(stub_list))
        .route("/storage/v1/b/{bucket}/o/{object}", delete(stub_delete))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_storage_client_against_stub() {
    let state = StubState::default();
    state.objects.lock().unwrap().extend([
        "users/alice/speeches/rec1.webm".to_string(),
        "users/alice/speeches/rec2.webm".to_string(),
        "users/alice/speechHistory/rec3.webm".to_string(),
        "users/bob/speeches/rec4.webm".to_string(),
    ]);

    let addr = spawn_stub(state.clone()).await;
    std::env::set_var("STORAGE_EMULATOR_HOST", addr.to_string());
    let client = StorageClient::new("test-bucket");

    // A prefix with no objects lists as empty, not as an error.
    let empty = client.list_objects("users/nobody/speeches").await.unwrap();
    assert!(empty.is_empty());
    assert_eq!(client.delete_prefix("users/nobody/speeches").await.unwrap(), 0);

    // Prefix listing only sees matching objects.
    let alice = client.list_objects("users/alice/speeches").await.unwrap();
    assert_eq!(alice.len(), 2);

    // Deleting a prefix removes exactly its objects.
    assert_eq!(client.delete_prefix("users/alice/speeches").await.unwrap(), 2);
    assert_eq!(
        client.list_objects("users/alice/speeches").await.unwrap().len(),
        0
    );
    assert_eq!(
        client
            .list_objects("users/alice/speechHistory")
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        client.list_objects("users/bob/speeches").await.unwrap().len(),
        1
    );

    // Re-running the delete is a no-op, as is deleting a gone object.
    assert_eq!(client.delete_prefix("users/alice/speeches").await.unwrap(), 0);
    client
        .delete_object("users/alice/speeches/rec1.webm")
        .await
        .unwrap();

    // A missing bucket (404 on listing) is recoverable: empty, no fault.
    let missing = StorageClient::new("missing-bucket");
    assert!(missing.list_objects("users/alice").await.unwrap().is_empty());
    assert_eq!(missing.delete_prefix("users/alice").await.unwrap(), 0);
}
