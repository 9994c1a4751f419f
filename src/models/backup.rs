use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{popup::Popup, profile::Profile, question::Question};

/// Full export of the persisted collections.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub profiles: Vec<Profile>,
    pub questions: Vec<Question>,
    pub popups: Vec<Popup>,
    pub exported_at: DateTime<Utc>,
}

impl Backup {
    /// `<product>-backup-<YYYY-MM-DD>.json`
    pub fn file_name(&self, product: &str) -> String {
        format!("{}-backup-{}.json", product, self.exported_at.format("%Y-%m-%d"))
    }
}
