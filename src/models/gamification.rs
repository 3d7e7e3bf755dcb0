//! Gamification and badge progress models.
//!
//! Both are keyed 1:1 by user id in top-level collections
//! (`userGamification/{uid}`, `userBadges/{uid}`). A missing document
//! means "not yet initialized", not an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::flexible_timestamp_opt;

fn default_level() -> u32 {
    1
}

/// XP and streak state for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gamification {
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(rename = "currentXP", default)]
    pub current_xp: u64,
    #[serde(rename = "totalXP", default)]
    pub total_xp: u64,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default, with = "flexible_timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<DateTime<Utc>>,
}

/// Partial gamification update from the console's edit form.
///
/// `last_activity_date` is owned by the mobile app and not editable here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GamificationUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(rename = "currentXP", default, skip_serializing_if = "Option::is_none")]
    pub current_xp: Option<u64>,
    #[serde(rename = "totalXP", default, skip_serializing_if = "Option::is_none")]
    pub total_xp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longest_streak: Option<u32>,
}

impl GamificationUpdate {
    /// Materialize a full document for a user whose gamification record
    /// does not exist yet.
    pub fn into_new_document(self, uid: &str) -> Gamification {
        Gamification {
            user_id: uid.to_string(),
            level: self.level.unwrap_or_else(default_level),
            current_xp: self.current_xp.unwrap_or(0),
            total_xp: self.total_xp.unwrap_or(0),
            current_streak: self.current_streak.unwrap_or(0),
            longest_streak: self.longest_streak.unwrap_or(0),
            last_activity_date: None,
        }
    }
}

/// A single badge entry.
///
/// The mobile app owns the full badge shape; fields it adds beyond the
/// ones the console touches are preserved round-trip via the flattened
/// map so an admin edit never strips them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_unlocked: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Badge progress document.
///
/// `unlocked_badges` and `total_badges` are derived counts. They are
/// recomputed from `badges` on every write; caller-supplied counts are
/// never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProgress {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub total_badges: u32,
    #[serde(default)]
    pub unlocked_badges: u32,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl BadgeProgress {
    /// Build a progress document from a badge sequence, re-establishing
    /// the derived counts.
    pub fn from_badges(uid: &str, badges: Vec<Badge>) -> Self {
        let unlocked = badges.iter().filter(|b| b.is_unlocked).count() as u32;
        Self {
            user_id: uid.to_string(),
            total_badges: badges.len() as u32,
            unlocked_badges: unlocked,
            badges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn badge(id: &str, unlocked: bool) -> Badge {
        Badge {
            id: id.to_string(),
            name: format!("Badge {}", id),
            is_unlocked: unlocked,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_from_badges_recomputes_counts() {
        let progress = BadgeProgress::from_badges(
            "user-1",
            vec![badge("a", true), badge("b", false), badge("c", true)],
        );
        assert_eq!(progress.total_badges, 3);
        assert_eq!(progress.unlocked_badges, 2);
        assert_eq!(progress.user_id, "user-1");
    }

    #[test]
    fn test_from_badges_empty_sequence() {
        let progress = BadgeProgress::from_badges("user-1", vec![]);
        assert_eq!(progress.total_badges, 0);
        assert_eq!(progress.unlocked_badges, 0);
        assert!(progress.badges.is_empty());
    }

    #[test]
    fn test_badge_preserves_unknown_fields() {
        let raw = json!({
            "id": "streak-7",
            "name": "Week Warrior",
            "isUnlocked": true,
            "icon": "flame",
            "unlockedAt": "2024-03-01T08:00:00Z",
        });
        let parsed: Badge = serde_json::from_value(raw).unwrap();
        assert!(parsed.is_unlocked);

        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["icon"], "flame");
        assert_eq!(back["unlockedAt"], "2024-03-01T08:00:00Z");
    }

    #[test]
    fn test_stale_stored_counts_are_ignored_on_rewrite() {
        // A document whose stored counts have drifted from the sequence.
        let stored: BadgeProgress = serde_json::from_value(json!({
            "userId": "user-1",
            "totalBadges": 99,
            "unlockedBadges": 99,
            "badges": [{"id": "a", "name": "A", "isUnlocked": false}],
        }))
        .unwrap();

        let rewritten = BadgeProgress::from_badges(&stored.user_id, stored.badges);
        assert_eq!(rewritten.total_badges, 1);
        assert_eq!(rewritten.unlocked_badges, 0);
    }

    #[test]
    fn test_gamification_defaults() {
        let gamification: Gamification = serde_json::from_value(json!({})).unwrap();
        assert_eq!(gamification.level, 1);
        assert_eq!(gamification.current_xp, 0);
        assert!(gamification.last_activity_date.is_none());

        let doc: Gamification = serde_json::from_value(json!({
            "userId": "u", "currentXP": 120, "totalXP": 960,
        }))
        .unwrap();
        assert_eq!(doc.current_xp, 120);
        assert_eq!(doc.total_xp, 960);
    }
}
