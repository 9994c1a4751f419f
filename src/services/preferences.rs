use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    storage::{KvStore, keys},
};

/// Light or dark UI, remembered across restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiTheme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for UiTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiTheme::Light => write!(f, "light"),
            UiTheme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for UiTheme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(UiTheme::Light),
            "dark" => Ok(UiTheme::Dark),
            other => Err(AppError::Validation(format!("Unknown theme '{}'", other))),
        }
    }
}

pub struct PreferenceStore {
    kv: Arc<dyn KvStore>,
}

impl PreferenceStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Stored as the bare string, not JSON. Unreadable values fall back to light.
    pub async fn theme(&self) -> Result<UiTheme, AppError> {
        Ok(self
            .kv
            .get(keys::THEME)
            .await?
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default())
    }

    pub async fn set_theme(&self, theme: UiTheme) -> Result<(), AppError> {
        self.kv.set(keys::THEME, theme.to_string()).await
    }
}
