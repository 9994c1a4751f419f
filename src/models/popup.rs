// src/models/popup.rs

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::profile::validate_url_string;

/// How often a popup should be shown. Stored, not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Always,
    OnceDaily,
    OnceEver,
}

/// An admin-managed announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Popup {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub frequency: Frequency,
}

/// DTO for creating a popup. New popups start active.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePopupRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub link_url: Option<String>,
    #[serde(default)]
    pub frequency: Frequency,
}

/// Admin forms send `""` for fields left blank.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
