// src/handlers/auth.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::{
    error::AppError,
    models::identity::{LoginRequest, RegisterRequest},
    services::{
        directory::DirectoryStore,
        popups::PopupStore,
        session::{SessionState, SessionStore},
    },
};

/// Signs in.
///
/// The configured admin pair yields the admin identity; any other
/// email-shaped string yields a user identity derived from the email.
/// Responds with the identity, the attached profile and the popup to show.
pub async fn login(
    State(sessions): State<Arc<SessionStore>>,
    State(directory): State<Arc<DirectoryStore>>,
    State(popups): State<Arc<PopupStore>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = sessions
        .login(&payload.email, &payload.password, payload.remember, &directory)
        .await?;
    let profile = sessions.current_profile().await;

    Ok(Json(json!({
        "identity": identity,
        "profile": profile,
        "popup": popups.select_active_for_session().await,
    })))
}

/// Registers a new identity and signs it in. Returns 201 Created.
pub async fn register(
    State(sessions): State<Arc<SessionStore>>,
    State(popups): State<Arc<PopupStore>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let identity = sessions
        .register(&payload.email, &payload.password, &payload.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "identity": identity,
            "popup": popups.select_active_for_session().await,
        })),
    ))
}

pub async fn logout(
    State(sessions): State<Arc<SessionStore>>,
) -> Result<impl IntoResponse, AppError> {
    sessions.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current identity and profile, 401 when anonymous.
pub async fn me(
    State(sessions): State<Arc<SessionStore>>,
) -> Result<impl IntoResponse, AppError> {
    match sessions.state().await {
        SessionState::Authenticated { identity, profile } => Ok(Json(json!({
            "identity": identity,
            "profile": profile,
        }))),
        SessionState::Anonymous => Err(AppError::Unauthenticated("Not logged in".to_string())),
    }
}
