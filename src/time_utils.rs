// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.
//!
//! Stored documents carry timestamps in three historical shapes: RFC3339
//! strings (what this service writes), Firestore timestamp maps
//! (`{seconds, nanos}` from the mobile app's native writes), and epoch
//! milliseconds (the oldest records). Everything is converted to
//! `DateTime<Utc>` at the deserialization boundary; nothing above it
//! touches a raw value.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a UTC timestamp as RFC3339 with milliseconds (export format).
pub fn format_utc_iso_millis(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The zero timestamp, used as the mapper default for required date fields.
pub fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Convert a loosely-typed timestamp value to UTC.
///
/// Accepts RFC3339 strings, integer epoch milliseconds, and Firestore
/// timestamp maps (`seconds`/`nanos` or the `_seconds`/`_nanoseconds`
/// variant). Returns `None` for anything unmappable; conversion never
/// fails a whole document.
pub fn parse_flexible_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis),
        serde_json::Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))?
                .as_i64()?;
            let nanos = map
                .get("nanos")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0);
            DateTime::<Utc>::from_timestamp(seconds, nanos as u32)
        }
        _ => None,
    }
}

/// Serde adapter for required timestamp fields.
///
/// Missing or unmappable values degrade to the epoch instead of erroring.
pub mod flexible_timestamp {
    use super::*;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(parse_flexible_timestamp(&value).unwrap_or_else(unix_epoch))
    }
}

/// Serde adapter for optional timestamp fields.
pub mod flexible_timestamp_opt {
    use super::*;

    pub fn serialize<S>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(parse_flexible_timestamp))
    }
}
