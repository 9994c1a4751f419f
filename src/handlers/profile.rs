// src/handlers/profile.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    models::{
        identity::Identity,
        profile::{Profile, SaveProfileRequest},
    },
    services::{
        directory::{DirectoryStore, share_link},
        session::SessionStore,
        stylist,
    },
    utils::photo,
};

/// A profile together with its shareable link.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub share_link: String,
}

impl ProfileView {
    fn new(profile: Profile, config: &Config) -> Self {
        let share_link = share_link(&config.public_origin, &profile.username);
        Self {
            profile,
            share_link,
        }
    }
}

/// List the whole directory.
pub async fn list_profiles(
    State(directory): State<Arc<DirectoryStore>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(directory.list_profiles().await))
}

/// Public page lookup by username.
pub async fn get_public_profile(
    State(directory): State<Arc<DirectoryStore>>,
    State(config): State<Config>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let profile = directory.find_by_username(&username).await?;
    Ok(Json(ProfileView::new(profile, &config)))
}

/// Add a like. Anyone may like, any number of times.
pub async fn like_profile(
    State(directory): State<Arc<DirectoryStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let likes = directory.like(&id).await?;
    Ok(Json(json!({ "likeCount": likes })))
}

pub async fn view_profile(
    State(directory): State<Arc<DirectoryStore>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let views = directory.record_view(&id).await?;
    Ok(Json(json!({ "viewCount": views })))
}

pub async fn click_link(
    State(directory): State<Arc<DirectoryStore>>,
    Path((id, link_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let clicks = directory.record_click(&id, &link_id).await?;
    Ok(Json(json!({ "clickCount": clicks })))
}

/// The session owner's profile.
pub async fn get_my_profile(
    State(directory): State<Arc<DirectoryStore>>,
    State(config): State<Config>,
    Extension(identity): Extension<Identity>,
) -> Result<impl IntoResponse, AppError> {
    let profile = directory
        .find_by_owner(&identity.id)
        .await
        .ok_or(AppError::NotFound("Profile not created yet".to_string()))?;

    Ok(Json(ProfileView::new(profile, &config)))
}

/// Save the session owner's profile.
/// Requires a photo and a complete location.
pub async fn save_my_profile(
    State(directory): State<Arc<DirectoryStore>>,
    State(sessions): State<Arc<SessionStore>>,
    State(config): State<Config>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<SaveProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let profile = directory.save_for_owner(&identity, payload).await?;
    sessions.attach_profile(profile.clone()).await?;

    Ok(Json(ProfileView::new(profile, &config)))
}

/// Accept a raw image upload and return it as a photo reference.
pub async fn upload_photo(body: Bytes) -> Result<impl IntoResponse, AppError> {
    let photo_ref = photo::encode_upload(&body)?;
    Ok(Json(json!({ "photoRef": photo_ref })))
}

/// Suggest a theme from the preset palettes.
pub async fn auto_style() -> Result<impl IntoResponse, AppError> {
    Ok(Json(stylist::auto_style()))
}
