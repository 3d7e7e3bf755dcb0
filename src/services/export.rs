// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV export of users and speeches.
//!
//! Every field is double-quoted with embedded quotes doubled, so
//! transcripts containing commas, quotes or newlines survive a round
//! trip through spreadsheet tools. Column order is fixed per entity
//! kind.

use chrono::NaiveDate;

use crate::models::{Speech, User};
use crate::time_utils::format_utc_iso_millis;

const USER_HEADERS: [&str; 8] = [
    "Name", "Email", "Role", "Gender", "Age", "Phone", "Bio", "Joined",
];

const SPEECH_HEADERS: [&str; 14] = [
    "Type",
    "Overall",
    "Pace",
    "Clarity",
    "Pitch",
    "Fluency",
    "Loudness",
    "Emphasis",
    "Filler Words",
    "Duration (s)",
    "Words",
    "WPM",
    "Date",
    "Transcript",
];

/// Quote a field, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<String>>()
        .join(",")
}

fn header_row(headers: &[&str]) -> String {
    headers.join(",")
}

/// Serialize users to CSV in the fixed column order.
pub fn users_csv(users: &[User]) -> String {
    let mut lines = Vec::with_capacity(users.len() + 1);
    lines.push(header_row(&USER_HEADERS));

    for user in users {
        lines.push(row([
            user.display_name(),
            user.email.clone(),
            user.role.clone(),
            user.gender.clone().unwrap_or_default(),
            user.age.map(|a| a.to_string()).unwrap_or_default(),
            user.phone_number.clone().unwrap_or_default(),
            user.bio.clone().unwrap_or_default(),
            user.created_at.map(format_utc_iso_millis).unwrap_or_default(),
        ]));
    }

    lines.join("\n")
}

/// Serialize speeches to CSV in the fixed column order.
///
/// `include_user` prepends the owner column for multi-user exports; the
/// per-user export omits it.
pub fn speeches_csv(speeches: &[Speech], include_user: bool) -> String {
    let mut lines = Vec::with_capacity(speeches.len() + 1);
    if include_user {
        let mut headers = vec!["User"];
        headers.extend(SPEECH_HEADERS);
        lines.push(header_row(&headers));
    } else {
        lines.push(header_row(&SPEECH_HEADERS));
    }

    for speech in speeches {
        let mut fields = Vec::with_capacity(SPEECH_HEADERS.len() + 1);
        if include_user {
            fields.push(
                speech
                    .user_name
                    .clone()
                    .unwrap_or_else(|| speech.user_id.clone()),
            );
        }
        fields.extend([
            speech.speech_type.clone(),
            format!("{:.2}", speech.scores.overall),
            format!("{:.2}", speech.scores.speech_pace),
            format!("{:.2}", speech.scores.articulation_clarity),
            format!("{:.2}", speech.scores.pitch_variation),
            format!("{:.2}", speech.scores.pausing_fluency),
            format!("{:.2}", speech.scores.loudness_control),
            format!("{:.2}", speech.scores.expressive_emphasis),
            format!("{:.2}", speech.scores.filler_words),
            format!("{}", speech.duration.round() as i64),
            speech.word_count.to_string(),
            format!("{:.0}", speech.average_pace),
            format_utc_iso_millis(speech.created_at),
            speech.transcript.clone(),
        ]);
        lines.push(row(fields));
    }

    lines.join("\n")
}

/// File name for a full corpus export: `stageready-{subject}-{date}.csv`.
pub fn export_filename(subject: &str, date: NaiveDate) -> String {
    format!("stageready-{}-{}.csv", subject, date.format("%Y-%m-%d"))
}

/// File name for one user's speech export, derived from the display name.
pub fn user_speeches_filename(display_name: &str, date: NaiveDate) -> String {
    format!(
        "speeches-{}-{}.csv",
        sanitize_for_filename(display_name),
        date.format("%Y-%m-%d")
    )
}

fn sanitize_for_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn speech(value: serde_json::Value) -> Speech {
        serde_json::from_value(value).unwrap()
    }

    /// Minimal RFC 4180 reader: splits one record of fully-quoted fields,
    /// undoing the quote doubling.
    fn parse_csv_record(line: &str) -> Vec<String> {
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' if in_quotes => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        current.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '"' => in_quotes = true,
                ',' if !in_quotes => {
                    fields.push(std::mem::take(&mut current));
                }
                c => current.push(c),
            }
        }
        fields.push(current);
        fields
    }

    #[test]
    fn test_quotes_and_commas_survive_round_trip() {
        let transcript = r#"She said "hello, everyone" and then, pausing, smiled"#;
        let speeches = vec![speech(json!({
            "userId": "alice",
            "userName": "Alice Nguyen",
            "transcript": transcript,
            "speechType": "presentation",
            "scores": {"overall": 3.25},
            "duration": 95.6,
            "wordCount": 250,
            "averagePace": 157.0,
            "createdAt": "2024-06-12T10:00:00Z",
        }))];

        let csv = speeches_csv(&speeches, true);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines.len(), 2);

        let fields = parse_csv_record(lines[1]);
        assert_eq!(fields.len(), 15);
        assert_eq!(fields[0], "Alice Nguyen");
        assert_eq!(fields[1], "presentation");
        assert_eq!(fields[2], "3.25");
        assert_eq!(fields[10], "96"); // duration rounded to whole seconds
        assert_eq!(fields[12], "157");
        assert_eq!(fields[14], transcript);
    }

    #[test]
    fn test_speech_header_and_user_column_toggle() {
        let csv = speeches_csv(&[], true);
        assert_eq!(
            csv,
            "User,Type,Overall,Pace,Clarity,Pitch,Fluency,Loudness,Emphasis,\
             Filler Words,Duration (s),Words,WPM,Date,Transcript"
        );

        let solo = speeches_csv(&[], false);
        assert!(solo.starts_with("Type,Overall"));
    }

    #[test]
    fn test_users_csv_round_trip() {
        let user: User = serde_json::from_value(json!({
            "_firestore_id": "u1",
            "email": "bob@example.com",
            "firstName": "Bob",
            "lastName": "O\"Shea",
            "role": "admin",
            "age": 41,
            "bio": "Speaker, coach, \"mentor\"",
            "createdAt": "2024-01-15T10:30:00Z",
        }))
        .unwrap();

        let csv = users_csv(&[user]);
        let lines: Vec<&str> = csv.split('\n').collect();
        assert_eq!(lines[0], "Name,Email,Role,Gender,Age,Phone,Bio,Joined");

        let fields = parse_csv_record(lines[1]);
        assert_eq!(fields[0], "Bob O\"Shea");
        assert_eq!(fields[2], "admin");
        assert_eq!(fields[4], "41");
        assert_eq!(fields[6], "Speaker, coach, \"mentor\"");
        assert_eq!(fields[7], "2024-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_missing_optionals_export_as_empty_fields() {
        let user: User = serde_json::from_value(json!({"email": "x@example.com"})).unwrap();
        let csv = users_csv(&[user]);
        let fields = parse_csv_record(csv.split('\n').nth(1).unwrap());
        assert_eq!(fields[3], "");
        assert_eq!(fields[4], "");
        assert_eq!(fields[7], "");
    }

    #[test]
    fn test_filenames() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        assert_eq!(
            export_filename("speeches", date),
            "stageready-speeches-2024-06-12.csv"
        );
        assert_eq!(
            user_speeches_filename("Alice Nguyen", date),
            "speeches-alice-nguyen-2024-06-12.csv"
        );
        assert_eq!(
            user_speeches_filename("bob@example.com", date),
            "speeches-bob-example-com-2024-06-12.csv"
        );
    }
}
