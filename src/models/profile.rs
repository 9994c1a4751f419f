// src/models/profile.rs

use std::{collections::BTreeSet, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

use crate::utils::photo::MAX_PHOTO_BYTES;

/// Characters allowed in a username; it becomes the `/#/<username>` path segment.
pub static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid username regex"));

/// A user's public page and its directory metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,

    /// Back-reference to the owning identity.
    pub owner_id: String,

    /// Sequential display code. `022026<n>` for real accounts, `0<n>` for simulated ones.
    #[serde(default)]
    pub uid: String,

    /// Unique across the directory, immutable after the first save.
    pub username: String,

    pub display_name: String,

    pub photo_ref: String,

    #[serde(default)]
    pub bio: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    // Location
    pub region: String,
    pub province: String,
    pub district: String,
    pub sub_district: String,
    /// Derived from the province, never user-entered.
    pub postal_code: String,

    /// Online subset membership: eligible for the explore map.
    pub visible_on_map: bool,

    #[serde(default)]
    pub like_count: u64,

    #[serde(default)]
    pub view_count: u64,

    #[serde(default)]
    pub theme: Theme,

    /// Display order is significant.
    #[serde(default)]
    pub links: Vec<Link>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub click_count: u64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Minimal,
    Modern,
    Creative,
    Glass,
}

/// Visual styling of the public page. Always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[validate(length(min = 1, max = 32))]
    pub background_color: String,
    #[validate(length(min = 1, max = 32))]
    pub text_color: String,
    #[validate(length(min = 1, max = 32))]
    pub button_color: String,
    #[validate(length(min = 1, max = 64))]
    pub font_family: String,
    pub layout: Layout,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = validate_url_string))]
    pub background_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glass_effect_enabled: Option<bool>,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background_color: "#ffffff".to_string(),
            text_color: "#000000".to_string(),
            button_color: "#000000".to_string(),
            font_family: "Prompt".to_string(),
            layout: Layout::Minimal,
            background_image_url: None,
            glass_effect_enabled: None,
        }
    }
}

/// DTO for saving the current user's profile from the dashboard.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveProfileRequest {
    #[validate(
        length(min = 1, max = 50, message = "Username length must be between 1 and 50 characters."),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits, '_', '.' and '-'.")
    )]
    pub username: String,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub display_name: String,

    /// URL or data URL. Required before the profile can be published.
    #[validate(custom(function = validate_photo_ref))]
    #[serde(default)]
    pub photo_ref: String,

    #[validate(length(max = 2000))]
    #[serde(default)]
    pub bio: String,

    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub province: String,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub district: String,

    #[validate(length(max = 100))]
    #[serde(default)]
    pub sub_district: String,

    #[serde(default)]
    pub visible_on_map: bool,

    #[validate(nested)]
    pub theme: Option<Theme>,

    #[validate(nested)]
    #[serde(default)]
    pub links: Vec<LinkInput>,
}

/// A link as edited on the dashboard. Existing links keep their id and counters.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LinkInput {
    pub id: Option<String>,
    #[validate(length(max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub url: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Validates that a string is a correctly formatted URL.
pub fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

/// Longest accepted photo reference: a full-size upload as a base64 data URL.
pub const MAX_PHOTO_REF_LEN: usize = MAX_PHOTO_BYTES.div_ceil(3) * 4 + 64;

/// Accepts an `http(s)` URL or a `data:image/...;base64,` payload.
/// Empty passes here; presence is checked when the profile is saved.
pub fn validate_photo_ref(photo_ref: &str) -> Result<(), validator::ValidationError> {
    if photo_ref.is_empty() {
        return Ok(());
    }
    if photo_ref.len() > MAX_PHOTO_REF_LEN {
        return Err(validator::ValidationError::new("photo_ref_too_long"));
    }

    if let Some(rest) = photo_ref.strip_prefix("data:image/") {
        return match rest.split_once(',') {
            Some((header, payload)) if header.ends_with(";base64") && !payload.is_empty() => Ok(()),
            _ => Err(validator::ValidationError::new("invalid_photo_data")),
        };
    }

    match Url::parse(photo_ref) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_photo_url")),
    }
}

/// Query parameters for the explore feed.
#[derive(Debug, Deserialize)]
pub struct ExploreParams {
    /// Province to prefer; defaults to the session owner's province.
    pub province: Option<String>,
    pub limit: Option<usize>,
}

/// DTO for admin bulk generation of simulated profiles.
#[derive(Debug, Deserialize, Validate)]
pub struct SimulateRequest {
    #[validate(range(min = 1, max = 500))]
    pub count: usize,
    #[validate(length(min = 1))]
    pub province: String,
}
