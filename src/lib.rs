// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! StageReady admin backend.
//!
//! This crate provides the admin API for the StageReady speech-coaching
//! app: browsing users, inspecting per-user speech practice history,
//! editing gamification and badge state, dashboard statistics, and full
//! account deletion.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{FirestoreDb, StorageClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub storage: StorageClient,
}
