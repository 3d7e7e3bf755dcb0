// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for dashboard statistics.
//!
//! Requires the Firestore emulator. The emulator project is shared
//! between test binaries, so assertions are invariants and lower bounds
//! over seeded data rather than exact totals.

use serde_json::json;
use stageready_admin::db::collections;
use stageready_admin::models::UserUpdate;
use stageready_admin::services::dashboard::collect_dashboard_stats;

mod common;

fn unique_uid(prefix: &str) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}-{}", prefix, nanos)
}

#[tokio::test]
async fn test_dashboard_stats_invariants_over_seeded_corpus() {
    require_emulator!();
    let db = common::test_db().await;
    let raw = common::raw_emulator_client().await;

    let speaker_uid = unique_uid("stats-speaker");
    let admin_uid = unique_uid("stats-admin");

    db.update_user(
        &speaker_uid,
        &UserUpdate {
            first_name: Some("Stats".to_string()),
            last_name: Some("Speaker".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    db.update_user(
        &admin_uid,
        &UserUpdate {
            first_name: Some("Stats".to_string()),
            last_name: Some("Admin".to_string()),
            role: Some("admin".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // One recent scored speech, one old unscored one.
    let recent = chrono::Utc::now() - chrono::Duration::hours(1);
    common::seed_speech(
        &raw,
        &speaker_uid,
        collections::SPEECH_HISTORY,
        "recent",
        json!({
            "transcript": "recent speech",
            "scores": {"overall": 3.5},
            "duration": 120.0,
            "createdAt": recent.to_rfc3339(),
        }),
    )
    .await;
    common::seed_speech(
        &raw,
        &speaker_uid,
        collections::SPEECH_HISTORY,
        "old",
        json!({
            "transcript": "old unscored speech",
            "scores": {"overall": 0.0},
            "duration": 60.0,
            "createdAt": "2020-01-01T00:00:00Z",
        }),
    )
    .await;

    let stats = collect_dashboard_stats(&db).await.unwrap();

    // Lower bounds from the seeded corpus.
    assert!(stats.total_users >= 2);
    assert!(stats.total_admins >= 1);
    assert!(stats.total_speeches >= 2);
    assert!(stats.speeches_this_week >= 1);
    assert!(stats.active_users_last7_days >= 1);
    assert!(stats.total_practice_minutes >= 3);

    // Corpus invariants.
    assert!(stats.total_admins <= stats.total_users);
    assert!(stats.active_users_last7_days <= stats.total_users);
    assert!(stats.average_overall_score >= 0.0);

    // Clean up the seeded users so repeated runs stay bounded.
    let deleter = stageready_admin::services::UserDeleter::new(
        db.clone(),
        stageready_admin::db::StorageClient::new_mock(),
    );
    deleter.delete_user(&speaker_uid).await.unwrap();
    deleter.delete_user(&admin_uid).await.unwrap();
}
