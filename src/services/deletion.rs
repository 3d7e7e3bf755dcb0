// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cascading user deletion.
//!
//! Removes a user and everything that exists only because the user does,
//! children before parent:
//! 1. speech history documents
//! 2. legacy `speeches` documents (old app builds wrote both)
//! 3. gamification document
//! 4. badge progress document
//! 5. storage objects under both recording prefixes (best effort)
//! 6. the user profile document itself
//!
//! Every step is idempotent, so a partially-failed run can be retried
//! safely: document steps abort the cascade on failure and leave the
//! user intact; storage failures are logged and swallowed, leaving
//! orphaned recordings rather than a half-deleted account.

use crate::db::{collections, speech_blob_prefix, speech_history_blob_prefix};
use crate::db::{FirestoreDb, StorageClient};
use crate::error::Result;
use serde::Serialize;

/// Per-step outcome of one cascade run, for audit logging.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub speech_history_docs: usize,
    pub speech_docs: usize,
    pub gamification_deleted: bool,
    pub badges_deleted: bool,
    pub blobs_deleted: usize,
    /// True when storage cleanup failed and recordings were left behind.
    pub blob_cleanup_failed: bool,
}

impl DeletionReport {
    /// Total document-store documents removed, including the profile.
    pub fn documents_deleted(&self) -> usize {
        self.speech_history_docs
            + self.speech_docs
            + usize::from(self.gamification_deleted)
            + usize::from(self.badges_deleted)
            + 1
    }
}

/// Orchestrates ordered deletion of a user and every dependent record.
pub struct UserDeleter {
    db: FirestoreDb,
    storage: StorageClient,
}

impl UserDeleter {
    pub fn new(db: FirestoreDb, storage: StorageClient) -> Self {
        Self { db, storage }
    }

    /// Delete ALL data for a user.
    ///
    /// On success the profile and all document-store dependents are
    /// confirmed removed. Storage cleanup is attempted but never blocks
    /// the deletion; a failure there is reported in the result, not as
    /// an error.
    pub async fn delete_user(&self, uid: &str) -> Result<DeletionReport> {
        let mut report = DeletionReport::default();

        // 1-2. Drain both speech subcollections. Old app builds populated
        // `speeches` alongside `speechHistory`, and source data may hold
        // either or both.
        report.speech_history_docs = self
            .drain_speech_subcollection(uid, collections::SPEECH_HISTORY)
            .await?;
        report.speech_docs = self
            .drain_speech_subcollection(uid, collections::SPEECHES)
            .await?;

        // 3. Gamification document, if present.
        if self.db.get_gamification(uid).await?.is_some() {
            self.db.delete_gamification(uid).await?;
            report.gamification_deleted = true;
            tracing::debug!(uid, "Deleted gamification document");
        }

        // 4. Badge progress document, if present.
        if self.db.get_badges(uid).await?.is_some() {
            self.db.delete_badges(uid).await?;
            report.badges_deleted = true;
            tracing::debug!(uid, "Deleted badge progress document");
        }

        // 5. Recording files. Best effort: the document store is
        // authoritative for account existence, so an orphaned blob is a
        // logged leak, not a failed deletion.
        for prefix in [speech_blob_prefix(uid), speech_history_blob_prefix(uid)] {
            match self.storage.delete_prefix(&prefix).await {
                Ok(count) => report.blobs_deleted += count,
                Err(e) => {
                    report.blob_cleanup_failed = true;
                    tracing::warn!(
                        uid,
                        prefix = %prefix,
                        error = %e,
                        "Storage cleanup failed, recordings left behind"
                    );
                }
            }
        }

        // 6. The profile document last: once it is gone the user is gone.
        self.db.delete_user_doc(uid).await?;

        tracing::info!(
            uid,
            documents = report.documents_deleted(),
            blobs = report.blobs_deleted,
            blob_cleanup_failed = report.blob_cleanup_failed,
            "User deletion complete"
        );
        Ok(report)
    }

    /// Delete every document in one speech subcollection, one at a time
    /// in listing order, and return how many were removed.
    async fn drain_speech_subcollection(
        &self,
        uid: &str,
        collection: &'static str,
    ) -> Result<usize> {
        let speeches = self.db.list_subcollection_speeches(uid, collection).await?;
        let count = speeches.len();
        for speech in &speeches {
            self.db.delete_speech_in(uid, collection, &speech.id).await?;
        }
        tracing::debug!(uid, collection, count, "Drained speech subcollection");
        Ok(count)
    }
}
