//! Dashboard statistics.
//!
//! `DashboardStats` is a computed snapshot, never persisted: every
//! request recomputes it from a full corpus scan (see
//! `services::dashboard`). There are no maintained counters to drift.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::models::{Speech, User};

/// Aggregate snapshot shown on the console dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: u32,
    pub total_speeches: u32,
    pub active_users_last7_days: u32,
    pub average_overall_score: f64,
    pub total_practice_minutes: i64,
    pub speeches_this_week: u32,
    pub total_admins: u32,
}

/// Order-independent fold over the (user, speeches) corpus.
///
/// Sums, counts and set membership only, so per-user contributions can
/// be accumulated in any order.
#[derive(Debug)]
pub struct StatsAccumulator {
    week_ago: DateTime<Utc>,
    total_users: u32,
    total_admins: u32,
    total_speeches: u32,
    speeches_this_week: u32,
    total_duration_secs: f64,
    overall_sum: f64,
    scored_speeches: u32,
    active_user_ids: HashSet<String>,
}

impl StatsAccumulator {
    /// `now` anchors the trailing 7x24h activity window.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            week_ago: now - Duration::days(7),
            total_users: 0,
            total_admins: 0,
            total_speeches: 0,
            speeches_this_week: 0,
            total_duration_secs: 0.0,
            overall_sum: 0.0,
            scored_speeches: 0,
            active_user_ids: HashSet::new(),
        }
    }

    /// Fold one user and their full speech list into the totals.
    pub fn add_user(&mut self, user: &User, speeches: &[Speech]) {
        self.total_users += 1;
        if user.is_admin() {
            self.total_admins += 1;
        }

        self.total_speeches += speeches.len() as u32;
        for speech in speeches {
            self.total_duration_secs += speech.duration;
            // Zero overall means "not yet scored"; excluded from the average.
            if speech.scores.overall > 0.0 {
                self.overall_sum += speech.scores.overall;
                self.scored_speeches += 1;
            }
            if speech.created_at >= self.week_ago {
                self.speeches_this_week += 1;
                self.active_user_ids.insert(user.uid.clone());
            }
        }
    }

    pub fn finish(self) -> DashboardStats {
        let average_overall_score = if self.scored_speeches > 0 {
            self.overall_sum / f64::from(self.scored_speeches)
        } else {
            0.0
        };

        DashboardStats {
            total_users: self.total_users,
            total_speeches: self.total_speeches,
            active_users_last7_days: self.active_user_ids.len() as u32,
            average_overall_score,
            total_practice_minutes: (self.total_duration_secs / 60.0).round() as i64,
            speeches_this_week: self.speeches_this_week,
            total_admins: self.total_admins,
        }
    }
}
