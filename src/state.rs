use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    error::AppError,
    services::{
        directory::DirectoryStore,
        markers::{AvatarSource, MarkerReconciler},
        popups::PopupStore,
        preferences::PreferenceStore,
        questions::QuestionStore,
        session::{AdminCredentials, SessionStore},
    },
    storage::KvStore,
};

/// Every store, constructed once at startup and shared by reference.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub directory: Arc<DirectoryStore>,
    pub sessions: Arc<SessionStore>,
    pub questions: Arc<QuestionStore>,
    pub popups: Arc<PopupStore>,
    pub preferences: Arc<PreferenceStore>,
    pub markers: Arc<MarkerReconciler>,
}

impl AppState {
    /// Loads every collection from `kv` and restores the persisted session.
    pub async fn build(
        config: Config,
        kv: Arc<dyn KvStore>,
        avatars: Arc<dyn AvatarSource>,
    ) -> Result<Self, AppError> {
        let admin = match (&config.admin_email, &config.admin_password) {
            (Some(email), Some(password)) => Some(AdminCredentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        let directory = Arc::new(DirectoryStore::load(Arc::clone(&kv)).await?);
        let sessions = Arc::new(SessionStore::restore(Arc::clone(&kv), admin).await?);
        let questions = Arc::new(QuestionStore::load(Arc::clone(&kv)).await?);
        let popups = Arc::new(PopupStore::load(Arc::clone(&kv)).await?);
        let preferences = Arc::new(PreferenceStore::new(Arc::clone(&kv)));
        let markers = Arc::new(MarkerReconciler::new(avatars, config.marker_jitter));

        Ok(Self {
            config,
            directory,
            sessions,
            questions,
            popups,
            preferences,
            markers,
        })
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<DirectoryStore> {
    fn from_ref(state: &AppState) -> Self {
        state.directory.clone()
    }
}

impl FromRef<AppState> for Arc<SessionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Arc<QuestionStore> {
    fn from_ref(state: &AppState) -> Self {
        state.questions.clone()
    }
}

impl FromRef<AppState> for Arc<PopupStore> {
    fn from_ref(state: &AppState) -> Self {
        state.popups.clone()
    }
}

impl FromRef<AppState> for Arc<PreferenceStore> {
    fn from_ref(state: &AppState) -> Self {
        state.preferences.clone()
    }
}

impl FromRef<AppState> for Arc<MarkerReconciler> {
    fn from_ref(state: &AppState) -> Self {
        state.markers.clone()
    }
}
