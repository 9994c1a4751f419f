// src/services/popups.rs

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::popup::{CreatePopupRequest, Popup},
    storage::{KvStore, keys, load_json, save_json},
};

/// Admin-managed announcements.
///
/// `frequency` is stored and returned but never consulted: every active
/// popup is eligible on every session.
pub struct PopupStore {
    kv: Arc<dyn KvStore>,
    popups: RwLock<Vec<Popup>>,
}

impl PopupStore {
    pub async fn load(kv: Arc<dyn KvStore>) -> Result<Self, AppError> {
        let popups = load_json::<Vec<Popup>>(kv.as_ref(), keys::POPUPS)
            .await?
            .unwrap_or_default();

        Ok(Self {
            kv,
            popups: RwLock::new(popups),
        })
    }

    async fn commit(&self, current: &mut Vec<Popup>, next: Vec<Popup>) -> Result<(), AppError> {
        save_json(self.kv.as_ref(), keys::POPUPS, &next).await?;
        *current = next;
        Ok(())
    }

    pub async fn list(&self) -> Vec<Popup> {
        self.popups.read().await.clone()
    }

    pub async fn create(&self, payload: CreatePopupRequest) -> Result<Popup, AppError> {
        payload.validate()?;

        let popup = Popup {
            id: Uuid::new_v4().to_string(),
            title: payload.title,
            image_url: payload.image_url,
            link_url: payload.link_url,
            is_active: true,
            frequency: payload.frequency,
        };

        let mut popups = self.popups.write().await;
        let mut next = popups.clone();
        next.push(popup.clone());
        self.commit(&mut popups, next).await?;

        tracing::info!("Created popup {} '{}'", popup.id, popup.title);
        Ok(popup)
    }

    pub async fn toggle_active(&self, id: &str) -> Result<Popup, AppError> {
        let mut popups = self.popups.write().await;

        let mut next = popups.clone();
        let popup = next
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Popup '{}' not found", id)))?;
        popup.is_active = !popup.is_active;
        let toggled = popup.clone();

        self.commit(&mut popups, next).await?;
        Ok(toggled)
    }

    pub async fn delete(&self, id: &str) -> Result<Popup, AppError> {
        let mut popups = self.popups.write().await;

        let removed = popups
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Popup '{}' not found", id)))?;
        let next = popups.iter().filter(|p| p.id != id).cloned().collect();

        self.commit(&mut popups, next).await?;
        Ok(removed)
    }

    /// First active popup in collection order.
    pub async fn select_active_for_session(&self) -> Option<Popup> {
        self.popups
            .read()
            .await
            .iter()
            .find(|p| p.is_active)
            .cloned()
    }
}
