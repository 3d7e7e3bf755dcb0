// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory speech query pipeline: filter, sort, aggregate.
//!
//! Operates purely on records already fetched from the store, so the
//! same inputs always produce the same output. Filters are conjunctive;
//! exactly one descending sort key is active; ties keep the
//! store-returned order (stable sort, no secondary key).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{Speech, User};

/// Sort key for the speech listing, always descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechSortKey {
    #[default]
    Date,
    Score,
    Duration,
    Words,
}

/// Filter and sort parameters, as supplied by the console.
///
/// Bounds arrive as raw strings; an empty or unparseable bound is
/// ignored rather than rejected, matching the form semantics.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechQuery {
    /// Case-insensitive substring over name, email, transcript and type
    pub search: String,
    /// Speech type, or "all"
    pub speech_type: String,
    /// Owning user id, or "all"
    pub user_id: String,
    /// Inclusive range start, calendar day (YYYY-MM-DD)
    pub date_from: String,
    /// Inclusive range end, calendar day (YYYY-MM-DD)
    pub date_to: String,
    /// Inclusive minimum overall score
    pub min_score: String,
    /// Inclusive maximum overall score
    pub max_score: String,
    pub sort_by: SpeechSortKey,
}

impl Default for SpeechQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            speech_type: "all".to_string(),
            user_id: "all".to_string(),
            date_from: String::new(),
            date_to: String::new(),
            min_score: String::new(),
            max_score: String::new(),
            sort_by: SpeechSortKey::Date,
        }
    }
}

/// Aggregates over the filtered set.
///
/// The score averages cover only speeches with a nonzero overall score;
/// duration covers every filtered speech.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechAggregates {
    pub total_speeches: u32,
    pub total_duration_seconds: f64,
    pub avg_overall: f64,
    pub avg_pace: f64,
    pub avg_clarity: f64,
    pub avg_fluency: f64,
    pub avg_pitch: f64,
}

/// Apply the filter and sort to a materialized speech list.
pub fn apply(speeches: &[Speech], users: &[User], query: &SpeechQuery) -> Vec<Speech> {
    let emails: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.uid.as_str(), u.email.as_str()))
        .collect();

    let mut result: Vec<Speech> = speeches
        .iter()
        .filter(|s| matches(s, &emails, query))
        .cloned()
        .collect();
    sort_speeches(&mut result, query.sort_by);
    result
}

fn matches(speech: &Speech, emails: &HashMap<&str, &str>, query: &SpeechQuery) -> bool {
    if query.speech_type != "all" && speech.speech_type != query.speech_type {
        return false;
    }
    if query.user_id != "all" && speech.user_id != query.user_id {
        return false;
    }

    if let Some(from) = parse_day(&query.date_from) {
        if speech.created_at < day_start(from) {
            return false;
        }
    }
    if let Some(to) = parse_day(&query.date_to) {
        if speech.created_at > day_end(to) {
            return false;
        }
    }

    if let Some(min) = parse_score_bound(&query.min_score) {
        if speech.scores.overall < min {
            return false;
        }
    }
    if let Some(max) = parse_score_bound(&query.max_score) {
        if speech.scores.overall > max {
            return false;
        }
    }

    let needle = query.search.trim().to_lowercase();
    if !needle.is_empty() {
        let email = emails.get(speech.user_id.as_str()).copied().unwrap_or("");
        let hit = speech
            .user_name
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
            .contains(&needle)
            || email.to_lowercase().contains(&needle)
            || speech.transcript.to_lowercase().contains(&needle)
            || speech.speech_type.to_lowercase().contains(&needle);
        if !hit {
            return false;
        }
    }

    true
}

/// An empty or unparseable bound is ignored.
fn parse_score_bound(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Start of the supplied calendar day, 00:00:00.000 UTC.
fn day_start(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// End of the supplied calendar day, 23:59:59.999 UTC.
fn day_end(day: NaiveDate) -> DateTime<Utc> {
    day_start(day + chrono::Days::new(1)) - chrono::Duration::milliseconds(1)
}

fn sort_speeches(speeches: &mut [Speech], key: SpeechSortKey) {
    match key {
        SpeechSortKey::Date => speeches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SpeechSortKey::Score => {
            speeches.sort_by(|a, b| b.scores.overall.total_cmp(&a.scores.overall));
        }
        SpeechSortKey::Duration => speeches.sort_by(|a, b| b.duration.total_cmp(&a.duration)),
        SpeechSortKey::Words => speeches.sort_by(|a, b| b.word_count.cmp(&a.word_count)),
    }
}

/// Aggregate the filtered set.
pub fn aggregate(speeches: &[Speech]) -> SpeechAggregates {
    if speeches.is_empty() {
        return SpeechAggregates::default();
    }

    let scored: Vec<&Speech> = speeches
        .iter()
        .filter(|s| s.scores.overall > 0.0)
        .collect();
    // max(count, 1) divisor: an empty scored subset averages to 0
    // without a division-by-zero branch at every facet.
    let divisor = scored.len().max(1) as f64;

    SpeechAggregates {
        total_speeches: speeches.len() as u32,
        total_duration_seconds: speeches.iter().map(|s| s.duration).sum(),
        avg_overall: scored.iter().map(|s| s.scores.overall).sum::<f64>() / divisor,
        avg_pace: scored.iter().map(|s| s.scores.speech_pace).sum::<f64>() / divisor,
        avg_clarity: scored
            .iter()
            .map(|s| s.scores.articulation_clarity)
            .sum::<f64>()
            / divisor,
        avg_fluency: scored
            .iter()
            .map(|s| s.scores.pausing_fluency)
            .sum::<f64>()
            / divisor,
        avg_pitch: scored
            .iter()
            .map(|s| s.scores.pitch_variation)
            .sum::<f64>()
            / divisor,
    }
}
