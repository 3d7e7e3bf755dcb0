//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Cloud Storage bucket holding speech recordings
    pub storage_bucket: String,
    /// Admin console URL for CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());

        Ok(Self {
            // Firebase default bucket naming: {project}.appspot.com
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| format!("{}.appspot.com", gcp_project_id)),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8100".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            gcp_project_id,
        })
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            frontend_url: "http://localhost:8100".to_string(),
            port: 8080,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
