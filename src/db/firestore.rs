// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles, roles, admin bootstrap)
//! - Speeches (per-user practice history, nested subcollections)
//! - Gamification (XP/streak state)
//! - Badges (badge progress with derived counts)
//!
//! This is the single point of contact with the document store. Absence
//! of a keyed document is an expected outcome and surfaces as `Ok(None)`
//! or an empty list, never as an error.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Badge, BadgeProgress, Gamification, GamificationUpdate, Speech, User, UserUpdate};
use crate::models::user::ROLE_ADMIN;
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 10;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
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

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by auth UID.
    pub async fn get_user(&self, uid: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List all user profiles.
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Merge-update a user profile.
    ///
    /// Only the fields present in the partial are written; `updatedAt` is
    /// always stamped to now.
    pub async fn update_user(&self, uid: &str, update: &UserUpdate) -> Result<(), AppError> {
        let mut update = update.clone();
        update.updated_at = Some(chrono::Utc::now());
        self.merge_update(collections::USERS, uid, &update).await
    }

    /// Change a user's role (`user` or `admin`).
    pub async fn set_user_role(&self, uid: &str, role: &str) -> Result<(), AppError> {
        let update = UserUpdate {
            role: Some(role.to_string()),
            ..Default::default()
        };
        self.update_user(uid, &update).await
    }

    /// Whether the given user holds the admin role.
    pub async fn is_admin(&self, uid: &str) -> Result<bool, AppError> {
        Ok(self
            .get_user(uid)
            .await?
            .is_some_and(|user| user.is_admin()))
    }

    /// Whether any admin account exists yet (setup bootstrap check).
    pub async fn has_any_admin(&self) -> Result<bool, AppError> {
        let users = self.list_users().await?;
        Ok(users.iter().any(|u| u.is_admin()))
    }

    /// Write the first admin profile document for an already-created auth
    /// account (admin-setup bootstrap).
    pub async fn create_admin_user(
        &self,
        uid: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, AppError> {
        let now = chrono::Utc::now();
        let user = User {
            uid: uid.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age: None,
            gender: None,
            phone_number: None,
            interests: None,
            bio: None,
            role: ROLE_ADMIN.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let _: User = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(uid)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(user)
    }

    /// Delete the user profile document itself.
    ///
    /// Dependent records are handled by `services::deletion`; this only
    /// removes `users/{uid}`.
    pub async fn delete_user_doc(&self, uid: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Speech Operations ───────────────────────────────────────

    /// Get a user's speech history, newest first.
    ///
    /// A user with no history (or a parent document that no longer
    /// exists) yields an empty list.
    pub async fn list_user_speeches(&self, uid: &str) -> Result<Vec<Speech>, AppError> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::USERS, uid)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut speeches: Vec<Speech> = client
            .fluent()
            .select()
            .from(collections::SPEECH_HISTORY)
            .parent(&parent_path)
            .order_by([(
                "createdAt",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // The owner is the partition, never the document contents; the
        // display-name decoration is recomputed by multi-user reads and
        // never read back from a stored document.
        for speech in &mut speeches {
            speech.user_id = uid.to_string();
            speech.user_name = None;
        }
        Ok(speeches)
    }

    /// List one of the speech subcollections without ordering.
    ///
    /// Used by the cascade deleter to drain both `speechHistory` and the
    /// legacy `speeches` duplicate.
    pub async fn list_subcollection_speeches(
        &self,
        uid: &str,
        collection: &str,
    ) -> Result<Vec<Speech>, AppError> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::USERS, uid)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut speeches: Vec<Speech> = client
            .fluent()
            .select()
            .from(collection)
            .parent(&parent_path)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for speech in &mut speeches {
            speech.user_id = uid.to_string();
            speech.user_name = None;
        }
        Ok(speeches)
    }

    /// Fetch every user's speech history, decorated with the owner's
    /// display name and globally ordered newest first.
    ///
    /// Per-user reads are independent, so they run with bounded
    /// concurrency; the final sort restores a deterministic order.
    pub async fn list_all_speeches(&self, users: &[User]) -> Result<Vec<Speech>, AppError> {
        let futures: Vec<_> = users
            .iter()
            .map(|user| {
                let uid = user.uid.clone();
                let display_name = user.display_name();
                async move {
                    let mut speeches = self.list_user_speeches(&uid).await?;
                    for speech in &mut speeches {
                        speech.user_name = Some(display_name.clone());
                    }
                    Ok::<_, AppError>(speeches)
                }
            })
            .collect();
        let results: Vec<Result<Vec<Speech>, AppError>> = stream::iter(futures)
            .buffered(MAX_CONCURRENT_DB_OPS)
            .collect()
            .await;

        let mut all: Vec<Speech> = results
            .into_iter()
            .collect::<Result<Vec<Vec<Speech>>, AppError>>()?
            .into_iter()
            .flatten()
            .collect();

        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    /// Delete a single speech from the user's history.
    pub async fn delete_speech(&self, uid: &str, speech_id: &str) -> Result<(), AppError> {
        self.delete_speech_in(uid, collections::SPEECH_HISTORY, speech_id)
            .await
    }

    /// Delete a speech document from a named subcollection.
    pub async fn delete_speech_in(
        &self,
        uid: &str,
        collection: &str,
        speech_id: &str,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent_path = client
            .parent_path(collections::USERS, uid)
            .map_err(|e| AppError::Database(e.to_string()))?;

        client
            .fluent()
            .delete()
            .from(collection)
            .parent(&parent_path)
            .document_id(speech_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Gamification Operations ─────────────────────────────────

    /// Get a user's gamification state.
    ///
    /// `None` means "not yet initialized" (the mobile app creates it on
    /// first activity).
    pub async fn get_gamification(&self, uid: &str) -> Result<Option<Gamification>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_GAMIFICATION)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Merge-update gamification state, creating the document with
    /// defaults when it does not exist yet.
    pub async fn update_gamification(
        &self,
        uid: &str,
        update: &GamificationUpdate,
    ) -> Result<(), AppError> {
        if self.get_gamification(uid).await?.is_some() {
            return self
                .merge_update(collections::USER_GAMIFICATION, uid, update)
                .await;
        }

        let document = update.clone().into_new_document(uid);
        let _: Gamification = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::USER_GAMIFICATION)
            .document_id(uid)
            .object(&document)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a user's gamification document.
    pub async fn delete_gamification(&self, uid: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USER_GAMIFICATION)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Badge Operations ────────────────────────────────────────

    /// Get a user's badge progress.
    pub async fn get_badges(&self, uid: &str) -> Result<Option<BadgeProgress>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_BADGES)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace a user's badge sequence.
    ///
    /// The derived counts are recomputed here from the supplied sequence;
    /// callers never provide them.
    pub async fn update_badges(&self, uid: &str, badges: Vec<Badge>) -> Result<BadgeProgress, AppError> {
        let progress = BadgeProgress::from_badges(uid, badges);

        let _: BadgeProgress = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USER_BADGES)
            .document_id(uid)
            .object(&progress)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(progress)
    }

    /// Delete a user's badge progress document.
    pub async fn delete_badges(&self, uid: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USER_BADGES)
            .document_id(uid)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Helper Methods ──────────────────────────────────────────

    /// Update a document with a mask of exactly the serialized fields of
    /// the partial, leaving every other stored field untouched.
    async fn merge_update<T>(
        &self,
        collection: &'static str,
        document_id: &str,
        partial: &T,
    ) -> Result<(), AppError>
    where
        T: serde::Serialize + Sync + Send,
    {
        let value = serde_json::to_value(partial)
            .map_err(|e| AppError::Database(format!("Failed to serialize update: {}", e)))?;
        let field_mask: Vec<String> = value
            .as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default();

        if field_mask.is_empty() {
            // Nothing to write; treat as a successful no-op.
            return Ok(());
        }

        let _: serde_json::Value = self
            .get_client()?
            .fluent()
            .update()
            .fields(field_mask)
            .in_col(collection)
            .document_id(document_id)
            .object(&value)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
