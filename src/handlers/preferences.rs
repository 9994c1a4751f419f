use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    services::{popups::PopupStore, preferences::{PreferenceStore, UiTheme}},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ThemePreference {
    pub theme: UiTheme,
}

pub async fn get_theme(
    State(preferences): State<Arc<PreferenceStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(ThemePreference {
        theme: preferences.theme().await?,
    }))
}

pub async fn set_theme(
    State(preferences): State<Arc<PreferenceStore>>,
    Json(payload): Json<ThemePreference>,
) -> Result<impl IntoResponse, AppError> {
    preferences.set_theme(payload.theme).await?;
    Ok(Json(payload))
}

/// The popup to show this session, `null` when none is active.
pub async fn active_popup(
    State(popups): State<Arc<PopupStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(popups.select_active_for_session().await))
}
