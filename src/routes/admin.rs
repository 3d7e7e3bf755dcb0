// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin console API routes.
//!
//! Thin delegation to the repository and service layers: handlers fetch,
//! call one engine operation, and serialize the result.

use crate::error::{AppError, Result};
use crate::models::user::{ROLE_ADMIN, ROLE_USER};
use crate::models::{
    Badge, BadgeProgress, DashboardStats, Gamification, GamificationUpdate, Speech, User,
    UserUpdate,
};
use crate::services::deletion::{DeletionReport, UserDeleter};
use crate::services::{dashboard, export, query};
use crate::services::{SpeechAggregates, SpeechQuery};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::header,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/stats", get(get_dashboard_stats))
        .route("/api/users", get(list_users))
        .route("/api/users/export", get(export_users))
        .route(
            "/api/users/{uid}",
            get(get_user_detail).put(update_user).delete(delete_user),
        )
        .route("/api/users/{uid}/role", put(set_user_role))
        .route("/api/users/{uid}/gamification", put(update_gamification))
        .route("/api/users/{uid}/badges", put(update_badges))
        .route("/api/users/{uid}/speeches/export", get(export_user_speeches))
        .route("/api/users/{uid}/speeches/{speech_id}", delete(delete_speech))
        .route("/api/speeches", get(list_speeches))
        .route("/api/speeches/export", get(export_speeches))
        .route("/api/setup/status", get(setup_status))
        .route("/api/setup/admin", post(create_admin))
}

/// Generic success response for operations with no payload.
#[derive(Serialize)]
pub struct StatusResponse {
    pub success: bool,
}

// ─── Dashboard ───────────────────────────────────────────────

/// Recompute the dashboard snapshot (full corpus scan).
async fn get_dashboard_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>> {
    let stats = dashboard::collect_dashboard_stats(&state.db).await?;
    Ok(Json(stats))
}

// ─── Users ───────────────────────────────────────────────────

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.db.list_users().await?))
}

/// Everything the user detail page shows, fetched concurrently.
#[derive(Serialize)]
pub struct UserDetailResponse {
    pub user: User,
    pub speeches: Vec<Speech>,
    pub gamification: Option<Gamification>,
    pub badges: Option<BadgeProgress>,
}

async fn get_user_detail(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<UserDetailResponse>> {
    let (user, speeches, gamification, badges) = tokio::try_join!(
        state.db.get_user(&uid),
        state.db.list_user_speeches(&uid),
        state.db.get_gamification(&uid),
        state.db.get_badges(&uid),
    )?;

    let user = user.ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
    Ok(Json(UserDetailResponse {
        user,
        speeches,
        gamification,
        badges,
    }))
}

fn validate_role(role: &str) -> Result<()> {
    if role == ROLE_USER || role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Unknown role: {}", role)))
    }
}

/// Merge-update a user profile and return the fresh document.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>> {
    if let Some(role) = &update.role {
        validate_role(role)?;
    }

    state.db.update_user(&uid, &update).await?;
    let user = state
        .db
        .get_user(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct RoleUpdateRequest {
    pub role: String,
}

async fn set_user_role(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(request): Json<RoleUpdateRequest>,
) -> Result<Json<StatusResponse>> {
    validate_role(&request.role)?;
    state.db.set_user_role(&uid, &request.role).await?;

    tracing::info!(uid, role = %request.role, "User role updated");
    Ok(Json(StatusResponse { success: true }))
}

/// Delete a user and every dependent record and recording.
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<Json<DeletionReport>> {
    tracing::info!(uid, "Admin-initiated user deletion");
    let deleter = UserDeleter::new(state.db.clone(), state.storage.clone());
    let report = deleter.delete_user(&uid).await?;
    Ok(Json(report))
}

// ─── Gamification & Badges ───────────────────────────────────

async fn update_gamification(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(update): Json<GamificationUpdate>,
) -> Result<Json<Option<Gamification>>> {
    state.db.update_gamification(&uid, &update).await?;
    Ok(Json(state.db.get_gamification(&uid).await?))
}

#[derive(Deserialize)]
pub struct BadgeUpdateRequest {
    pub badges: Vec<Badge>,
}

/// Replace the badge sequence; derived counts are recomputed server-side.
async fn update_badges(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
    Json(request): Json<BadgeUpdateRequest>,
) -> Result<Json<BadgeProgress>> {
    let progress = state.db.update_badges(&uid, request.badges).await?;
    Ok(Json(progress))
}

// ─── Speeches ────────────────────────────────────────────────

async fn delete_speech(
    State(state): State<Arc<AppState>>,
    Path((uid, speech_id)): Path<(String, String)>,
) -> Result<Json<StatusResponse>> {
    state.db.delete_speech(&uid, &speech_id).await?;
    tracing::info!(uid, speech_id, "Speech deleted");
    Ok(Json(StatusResponse { success: true }))
}

#[derive(Serialize)]
pub struct SpeechListResponse {
    pub speeches: Vec<Speech>,
    pub aggregates: SpeechAggregates,
}

/// Browse all speeches through the filter/sort/aggregate pipeline.
async fn list_speeches(
    State(state): State<Arc<AppState>>,
    Query(speech_query): Query<SpeechQuery>,
) -> Result<Json<SpeechListResponse>> {
    let users = state.db.list_users().await?;
    let all = state.db.list_all_speeches(&users).await?;

    let speeches = query::apply(&all, &users, &speech_query);
    let aggregates = query::aggregate(&speeches);
    Ok(Json(SpeechListResponse {
        speeches,
        aggregates,
    }))
}

// ─── Exports ─────────────────────────────────────────────────

type CsvResponse = ([(header::HeaderName, String); 2], String);

fn csv_response(filename: String, csv: String) -> CsvResponse {
    (
        [
            (
                header::CONTENT_TYPE,
                "text/csv; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        csv,
    )
}

async fn export_users(State(state): State<Arc<AppState>>) -> Result<CsvResponse> {
    let users = state.db.list_users().await?;
    let csv = export::users_csv(&users);
    let filename = export::export_filename("users", chrono::Utc::now().date_naive());
    Ok(csv_response(filename, csv))
}

/// Export the filtered speech set across all users.
async fn export_speeches(
    State(state): State<Arc<AppState>>,
    Query(speech_query): Query<SpeechQuery>,
) -> Result<CsvResponse> {
    let users = state.db.list_users().await?;
    let all = state.db.list_all_speeches(&users).await?;

    let speeches = query::apply(&all, &users, &speech_query);
    let csv = export::speeches_csv(&speeches, true);
    let filename = export::export_filename("speeches", chrono::Utc::now().date_naive());
    Ok(csv_response(filename, csv))
}

/// Export one user's full speech history (no owner column).
async fn export_user_speeches(
    State(state): State<Arc<AppState>>,
    Path(uid): Path<String>,
) -> Result<CsvResponse> {
    let user = state
        .db
        .get_user(&uid)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", uid)))?;
    let speeches = state.db.list_user_speeches(&uid).await?;

    let csv = export::speeches_csv(&speeches, false);
    let filename =
        export::user_speeches_filename(&user.display_name(), chrono::Utc::now().date_naive());
    Ok(csv_response(filename, csv))
}

// ─── Admin Setup Bootstrap ───────────────────────────────────

#[derive(Serialize)]
pub struct SetupStatusResponse {
    pub has_admin: bool,
}

/// Whether any admin account exists yet.
async fn setup_status(State(state): State<Arc<AppState>>) -> Result<Json<SetupStatusResponse>> {
    Ok(Json(SetupStatusResponse {
        has_admin: state.db.has_any_admin().await?,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub uid: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Write the first admin profile document. The auth account itself is
/// created by the signup flow; this only bootstraps the role document.
async fn create_admin(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateAdminRequest>,
) -> Result<Json<User>> {
    if state.db.has_any_admin().await? {
        return Err(AppError::BadRequest(
            "An admin account already exists".to_string(),
        ));
    }

    let user = state
        .db
        .create_admin_user(
            &request.uid,
            &request.email,
            &request.first_name,
            &request.last_name,
        )
        .await?;
    tracing::info!(uid = %request.uid, "Admin account bootstrapped");
    Ok(Json(user))
}
