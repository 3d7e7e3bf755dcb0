// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Storage client for speech recordings.
//!
//! Talks to the Cloud Storage JSON API directly. Only two operations are
//! needed: listing objects under a prefix and deleting an object, both
//! used by account deletion. Listing a prefix that has no objects (not
//! every user has uploaded recordings) returns an empty list, never an
//! error.
//!
//! Auth: on GCP the access token comes from the metadata server; with
//! STORAGE_EMULATOR_HOST set, requests go to the emulator
//! unauthenticated.

use crate::error::AppError;
use serde::Deserialize;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Cloud Storage client.
#[derive(Clone)]
pub struct StorageClient {
    http: Option<reqwest::Client>,
    base_url: String,
    bucket: String,
    authenticate: bool,
}

impl StorageClient {
    /// Create a new client for the given bucket.
    ///
    /// For local development with the Storage emulator, set
    /// STORAGE_EMULATOR_HOST.
    pub fn new(bucket: &str) -> Self {
        if let Ok(host) = std::env::var("STORAGE_EMULATOR_HOST") {
            tracing::info!(host = %host, "Using unauthenticated connection for Storage emulator");
            return Self {
                http: Some(reqwest::Client::new()),
                base_url: format!("http://{}/storage/v1", host),
                bucket: bucket.to_string(),
                authenticate: false,
            };
        }

        Self {
            http: Some(reqwest::Client::new()),
            base_url: "https://storage.googleapis.com/storage/v1".to_string(),
            bucket: bucket.to_string(),
            authenticate: true,
        }
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All storage operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            http: None,
            base_url: String::new(),
            bucket: "mock-bucket".to_string(),
            authenticate: false,
        }
    }

    fn get_http(&self) -> Result<&reqwest::Client, AppError> {
        self.http
            .as_ref()
            .ok_or_else(|| AppError::Storage("Storage not connected (offline mode)".to_string()))
    }

    /// Fetch an access token from the GCE/Cloud Run metadata server.
    async fn bearer_token(&self) -> Result<Option<String>, AppError> {
        if !self.authenticate {
            return Ok(None);
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
        }

        let response = self
            .get_http()?
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Metadata token request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Storage(format!("Metadata token request failed: {}", e)))?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Storage(format!("Invalid metadata token response: {}", e)))?;
        Ok(Some(token.access_token))
    }

    /// List all object names under a prefix.
    ///
    /// An absent bucket or prefix lists as empty.
    pub async fn list_objects(&self, prefix: &str) -> Result<Vec<String>, AppError> {
        let http = self.get_http()?;
        let token = self.bearer_token().await?;
        let url = format!(
            "{}/b/{}/o",
            self.base_url,
            urlencoding::encode(&self.bucket)
        );

        let mut names = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = http.get(&url).query(&[("prefix", prefix)]);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page.as_str())]);
            }
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| AppError::Storage(format!("List request failed: {}", e)))?;

            if response.status() == reqwest::StatusCode::NOT_FOUND {
                return Ok(names);
            }
            let response = response
                .error_for_status()
                .map_err(|e| AppError::Storage(format!("List request failed: {}", e)))?;

            let body: ObjectList = response
                .json()
                .await
                .map_err(|e| AppError::Storage(format!("Invalid list response: {}", e)))?;

            names.extend(body.items.into_iter().map(|o| o.name));
            match body.next_page_token {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(names)
    }

    /// Delete a single object. Deleting an object that is already gone is
    /// a no-op.
    pub async fn delete_object(&self, name: &str) -> Result<(), AppError> {
        let http = self.get_http()?;
        let token = self.bearer_token().await?;
        let url = format!(
            "{}/b/{}/o/{}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(name)
        );

        let mut request = http.delete(&url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Delete request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        response
            .error_for_status()
            .map_err(|e| AppError::Storage(format!("Delete request failed: {}", e)))?;
        Ok(())
    }

    /// Delete every object under a prefix, returning how many were
    /// removed.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize, AppError> {
        let names = self.list_objects(prefix).await?;
        let count = names.len();
        for name in &names {
            self.delete_object(name).await?;
        }
        tracing::debug!(prefix = %prefix, count, "Deleted storage objects");
        Ok(count)
    }
}

/// Objects list response from the JSON API.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct ObjectResource {
    name: String,
}
