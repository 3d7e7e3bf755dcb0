// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use stageready_admin::config::Config;
use stageready_admin::db::{FirestoreDb, StorageClient};
use stageready_admin::routes::create_router;
use stageready_admin::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = test_db_offline();
    let storage = StorageClient::new_mock();

    let state = Arc::new(AppState {
        config,
        db,
        storage,
    });

    (create_router(state.clone()), state)
}

/// Raw emulator client for seeding documents the engine itself never
/// creates (speech records are written by the mobile app in production).
#[allow(dead_code)]
pub async fn raw_emulator_client() -> firestore::FirestoreDb {
    let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
        Ok(gcloud_sdk::Token {
            token_type: "Bearer".to_string(),
            token: gcloud_sdk::SecretValue::new(
                "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                    .to_string()
                    .into(),
            ),
            expiry: chrono::Utc::now() + chrono::Duration::hours(1),
        })
    });

    let options = firestore::FirestoreDbOptions::new("test-project".to_string());

    firestore::FirestoreDb::with_options_token_source(
        options,
        gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
        gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
    )
    .await
    .expect("Failed to connect to Firestore emulator")
}

/// Seed a raw speech document into one of a user's subcollections.
#[allow(dead_code)]
pub async fn seed_speech(
    client: &firestore::FirestoreDb,
    uid: &str,
    collection: &str,
    speech_id: &str,
    document: serde_json::Value,
) {
    let parent_path = client
        .parent_path("users", uid)
        .expect("valid parent path");

    let _: serde_json::Value = client
        .fluent()
        .insert()
        .into(collection)
        .document_id(speech_id)
        .parent(&parent_path)
        .object(&document)
        .execute()
        .await
        .expect("Failed to seed speech document");
}
