//! Speech practice record model.
//!
//! Speeches are nested under their owner: `users/{uid}/speechHistory/{id}`
//! (with a legacy duplicate subcollection named `speeches`). The engine
//! never creates these documents; the mobile app does. `user_id` is
//! stamped from the partition a record was read from, never trusted from
//! the document itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::{flexible_timestamp, unix_epoch};

fn default_speech_type() -> String {
    "general".to_string()
}

/// A single recorded practice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Speech {
    /// Document ID
    #[serde(alias = "_firestore_id", default)]
    pub id: String,
    /// Owning user; set from the partition after every read
    #[serde(default)]
    pub user_id: String,
    /// Owner display name, decorated at multi-user read time; never stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub transcript: String,
    #[serde(default = "default_speech_type")]
    pub speech_type: String,
    #[serde(default)]
    pub scores: SpeechScores,
    /// Recording length in seconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub word_count: u32,
    /// Words per minute
    #[serde(default)]
    pub average_pace: f64,
    #[serde(with = "flexible_timestamp", default = "unix_epoch")]
    pub created_at: DateTime<Utc>,
}

/// Per-facet scoring produced by the analysis pipeline.
///
/// Facet keys are stored snake_case (the analysis service's naming).
/// A zero `overall` means "not yet scored" and is excluded from averages.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpeechScores {
    #[serde(default)]
    pub speech_pace: f64,
    #[serde(default)]
    pub pausing_fluency: f64,
    #[serde(default)]
    pub loudness_control: f64,
    #[serde(default)]
    pub pitch_variation: f64,
    #[serde(default)]
    pub articulation_clarity: f64,
    #[serde(default)]
    pub expressive_emphasis: f64,
    #[serde(default)]
    pub filler_words: f64,
    #[serde(default)]
    pub overall: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_document_maps_to_defaults() {
        let speech: Speech = serde_json::from_value(json!({
            "transcript": "Good evening everyone",
        }))
        .unwrap();
        assert_eq!(speech.speech_type, "general");
        assert_eq!(speech.scores.overall, 0.0);
        assert_eq!(speech.duration, 0.0);
        assert_eq!(speech.word_count, 0);
        assert_eq!(speech.created_at, crate::time_utils::unix_epoch());
    }

    #[test]
    fn test_partial_scores_map_to_zero() {
        let speech: Speech = serde_json::from_value(json!({
            "scores": {"overall": 3.5, "speech_pace": 2.0},
            "createdAt": "2024-01-15T10:30:00Z",
            "duration": 95.5,
        }))
        .unwrap();
        assert_eq!(speech.scores.overall, 3.5);
        assert_eq!(speech.scores.speech_pace, 2.0);
        assert_eq!(speech.scores.filler_words, 0.0);
        assert_eq!(speech.duration, 95.5);
    }

    #[test]
    fn test_garbage_timestamp_degrades_to_epoch() {
        let speech: Speech = serde_json::from_value(json!({
            "createdAt": "last tuesday",
        }))
        .unwrap();
        assert_eq!(speech.created_at, crate::time_utils::unix_epoch());
    }

    #[test]
    fn test_user_name_is_not_persisted() {
        let speech: Speech = serde_json::from_value(json!({})).unwrap();
        assert!(speech.user_name.is_none());

        let mut decorated = speech;
        decorated.user_name = Some("Alice Nguyen".to_string());
        // Serialized form keeps the decoration only for API responses;
        // the engine has no Speech write path, so it is never stored.
        let value = serde_json::to_value(&decorated).unwrap();
        assert_eq!(value["userName"], "Alice Nguyen");
    }
}
