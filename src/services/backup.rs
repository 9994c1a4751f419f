use chrono::Utc;

use crate::{
    models::backup::Backup,
    services::{directory::DirectoryStore, popups::PopupStore, questions::QuestionStore},
};

/// Snapshot of every collection, taken one store at a time.
pub async fn export(
    directory: &DirectoryStore,
    questions: &QuestionStore,
    popups: &PopupStore,
) -> Backup {
    Backup {
        profiles: directory.list_profiles().await,
        questions: questions.list_all().await,
        popups: popups.list().await,
        exported_at: Utc::now(),
    }
}
