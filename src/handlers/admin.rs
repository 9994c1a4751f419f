// src/handlers/admin.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{popup::CreatePopupRequest, profile::SimulateRequest},
    services::{
        backup, directory::DirectoryStore, popups::PopupStore, questions::QuestionStore,
        session::SessionStore,
    },
};

/// Lists all profiles in the directory.
/// Admin only.
pub async fn list_users(
    State(directory): State<Arc<DirectoryStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(directory.list_profiles().await))
}

/// Bans a user by removing the profile.
///
/// There is one process-wide session and it belongs to the admin while this
/// runs, so the identity flag only lands when the admin bans their own
/// profile. For any other user a ban removes the profile exactly like delete.
/// Admin only.
pub async fn ban_user(
    State(directory): State<Arc<DirectoryStore>>,
    State(sessions): State<Arc<SessionStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let removed = directory.remove_profile(&id).await?;
    let flagged = sessions.mark_banned(&removed.owner_id).await?;
    tracing::warn!(
        "Banned user {} (profile {}), session flagged: {}",
        removed.owner_id,
        removed.id,
        flagged
    );

    Ok(Json(json!({ "banned": removed.id })))
}

/// Deletes a profile by ID.
/// Admin only. Questions authored by the user are kept.
pub async fn delete_user(
    State(directory): State<Arc<DirectoryStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    directory.remove_profile(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Bulk-generates simulated profiles in a province.
/// Admin only.
pub async fn simulate_users(
    State(directory): State<Arc<DirectoryStore>>,
    Json(payload): Json<SimulateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = directory
        .simulate_profiles(payload.count, &payload.province)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Every question including rejected ones, for moderation review.
/// Admin only.
pub async fn list_questions(
    State(questions): State<Arc<QuestionStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(questions.list_all().await))
}

pub async fn list_popups(
    State(popups): State<Arc<PopupStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(popups.list().await))
}

/// Creates a popup. New popups start active.
/// Admin only.
pub async fn create_popup(
    State(popups): State<Arc<PopupStore>>,
    Json(payload): Json<CreatePopupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let popup = popups.create(payload).await?;
    Ok((StatusCode::CREATED, Json(popup)))
}

pub async fn toggle_popup(
    State(popups): State<Arc<PopupStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(popups.toggle_active(&id).await?))
}

pub async fn delete_popup(
    State(popups): State<Arc<PopupStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    popups.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Downloads every collection as one JSON document.
/// Admin only.
pub async fn download_backup(
    State(directory): State<Arc<DirectoryStore>>,
    State(questions): State<Arc<QuestionStore>>,
    State(popups): State<Arc<PopupStore>>,
    State(config): State<Config>,
) -> Result<impl IntoResponse, AppError> {
    let backup = backup::export(&directory, &questions, &popups).await;
    let disposition = format!("attachment; filename=\"{}\"", backup.file_name(&config.app_name));
    let body = serde_json::to_string_pretty(&backup)?;

    tracing::info!(
        "Backup exported: {} profiles, {} questions, {} popups",
        backup.profiles.len(),
        backup.questions.len(),
        backup.popups.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
