//! User profile model for storage and API.
//!
//! Documents live at `users/{uid}` and use the mobile app's camelCase
//! field names. Every optional field defaults at the serde boundary so
//! downstream code never branches on missing-ness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::flexible_timestamp_opt;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

fn default_role() -> String {
    ROLE_USER.to_string()
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Auth UID (also the document ID)
    #[serde(alias = "_firestore_id", default)]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    /// `user` or `admin`
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, with = "flexible_timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible_timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Display name shown in the console and export files.
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string();
        if !name.is_empty() {
            name
        } else if !self.email.is_empty() {
            self.email.clone()
        } else {
            "Unknown User".to_string()
        }
    }
}

/// Partial user update.
///
/// Only fields present in the update are written; absent fields are left
/// untouched by the update mask. `updated_at` is stamped by the
/// repository on every write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(
        default,
        with = "flexible_timestamp_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}
