// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard statistics collection.
//!
//! A full corpus scan on every request: all users, then each user's
//! speech history. O(users x speeches-per-user), which is fine at
//! admin-console scale and avoids maintained counters entirely.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{DashboardStats, StatsAccumulator};

/// Recompute the dashboard snapshot from scratch.
pub async fn collect_dashboard_stats(db: &FirestoreDb) -> Result<DashboardStats> {
    let users = db.list_users().await?;
    let mut accumulator = StatsAccumulator::new(chrono::Utc::now());

    for user in &users {
        let speeches = db.list_user_speeches(&user.uid).await?;
        accumulator.add_user(user, &speeches);
    }

    let stats = accumulator.finish();
    tracing::debug!(
        total_users = stats.total_users,
        total_speeches = stats.total_speeches,
        "Dashboard stats computed"
    );
    Ok(stats)
}
