// src/services/session.rs

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Utc;
use tokio::sync::RwLock;
use url::Url;

use crate::{
    error::AppError,
    models::{
        identity::{Identity, Role},
        profile::Profile,
    },
    services::directory::DirectoryStore,
    storage::{KvStore, keys, load_json, save_json},
};

const ADMIN_ID: &str = "admin-001";
const AVATAR_PLACEHOLDER_BASE: &str = "https://ui-avatars.com/api/";

/// The reserved credential pair that resolves to the admin identity.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticated {
        identity: Identity,
        profile: Option<Profile>,
    },
}

/// Owns the current identity of this process.
///
/// Login is a mock boundary: regular users are accepted on the shape of their
/// email alone. Only the configured admin pair is compared.
pub struct SessionStore {
    kv: Arc<dyn KvStore>,
    admin: Option<AdminCredentials>,
    state: RwLock<SessionState>,
}

/// Same email, same id.
pub fn identity_id_for(email: &str) -> String {
    STANDARD.encode(email.as_bytes())
}

fn placeholder_avatar(name: &str) -> String {
    Url::parse_with_params(AVATAR_PLACEHOLDER_BASE, &[("name", name)])
        .map(String::from)
        .unwrap_or_else(|_| AVATAR_PLACEHOLDER_BASE.to_string())
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

impl SessionStore {
    /// Reloads the persisted identity and profile. A banned identity is
    /// rejected and both records are purged.
    pub async fn restore(
        kv: Arc<dyn KvStore>,
        admin: Option<AdminCredentials>,
    ) -> Result<Self, AppError> {
        let state = match load_json::<Identity>(kv.as_ref(), keys::IDENTITY).await? {
            Some(identity) if identity.is_banned => {
                tracing::warn!("Persisted identity {} is banned, purging session", identity.id);
                kv.remove(keys::IDENTITY).await?;
                kv.remove(keys::PROFILE).await?;
                SessionState::Anonymous
            }
            Some(identity) => {
                let profile = match load_json::<Profile>(kv.as_ref(), keys::PROFILE).await? {
                    Some(profile) if profile.owner_id != identity.id => {
                        tracing::warn!(
                            "Persisted profile {} belongs to {}, not {}; dropping it",
                            profile.id,
                            profile.owner_id,
                            identity.id
                        );
                        kv.remove(keys::PROFILE).await?;
                        None
                    }
                    profile => profile,
                };
                tracing::info!("Restored session for {}", identity.email);
                SessionState::Authenticated { identity, profile }
            }
            None => SessionState::Anonymous,
        };

        Ok(Self {
            kv,
            admin,
            state: RwLock::new(state),
        })
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn current(&self) -> Option<Identity> {
        match &*self.state.read().await {
            SessionState::Authenticated { identity, .. } => Some(identity.clone()),
            SessionState::Anonymous => None,
        }
    }

    pub async fn current_profile(&self) -> Option<Profile> {
        match &*self.state.read().await {
            SessionState::Authenticated { profile, .. } => profile.clone(),
            SessionState::Anonymous => None,
        }
    }

    fn is_admin_pair(&self, email: &str, password: &str) -> bool {
        self.admin
            .as_ref()
            .is_some_and(|admin| admin.email == email && admin.password == password)
    }

    /// Signs in. Fails only when `email` has no `@` and is not the admin pair.
    ///
    /// Attaches the user's existing profile from the directory. Records are
    /// persisted only when `remember` is set; otherwise any stored session is
    /// cleared.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember: bool,
        directory: &DirectoryStore,
    ) -> Result<Identity, AppError> {
        let now = Some(Utc::now());

        let (identity, profile) = if self.is_admin_pair(email, password) {
            let identity = Identity {
                id: ADMIN_ID.to_string(),
                email: email.to_string(),
                display_name: "Admin".to_string(),
                photo_ref: placeholder_avatar("Admin"),
                role: Role::Admin,
                is_banned: false,
                last_login_at: now,
            };
            (identity, None)
        } else if email.contains('@') {
            let name = local_part(email);
            let identity = Identity {
                id: identity_id_for(email),
                email: email.to_string(),
                display_name: name.to_string(),
                photo_ref: placeholder_avatar(name),
                role: Role::User,
                is_banned: false,
                last_login_at: now,
            };
            let profile = directory.find_by_owner(&identity.id).await;
            (identity, profile)
        } else {
            return Err(AppError::Unauthenticated(
                "Invalid email or password".to_string(),
            ));
        };

        let mut state = self.state.write().await;
        if remember {
            save_json(self.kv.as_ref(), keys::IDENTITY, &identity).await?;
            match &profile {
                Some(profile) => save_json(self.kv.as_ref(), keys::PROFILE, profile).await?,
                None => self.kv.remove(keys::PROFILE).await?,
            }
        } else {
            // A session that is not remembered must not resurrect an older one.
            self.kv.remove(keys::IDENTITY).await?;
            self.kv.remove(keys::PROFILE).await?;
        }
        *state = SessionState::Authenticated {
            identity: identity.clone(),
            profile,
        };

        tracing::info!("Login: {} as {:?}", identity.email, identity.role);
        Ok(identity)
    }

    /// Always succeeds. Does not look for an earlier registration of the same email.
    pub async fn register(
        &self,
        email: &str,
        _password: &str,
        name: &str,
    ) -> Result<Identity, AppError> {
        let display_name = if name.trim().is_empty() {
            local_part(email)
        } else {
            name
        };

        let identity = Identity {
            id: identity_id_for(email),
            email: email.to_string(),
            display_name: display_name.to_string(),
            photo_ref: placeholder_avatar(display_name),
            role: Role::User,
            is_banned: false,
            last_login_at: Some(Utc::now()),
        };

        let mut state = self.state.write().await;
        save_json(self.kv.as_ref(), keys::IDENTITY, &identity).await?;
        self.kv.remove(keys::PROFILE).await?;
        *state = SessionState::Authenticated {
            identity: identity.clone(),
            profile: None,
        };

        tracing::info!("Registered {}", identity.email);
        Ok(identity)
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        self.kv.remove(keys::IDENTITY).await?;
        self.kv.remove(keys::PROFILE).await?;
        *state = SessionState::Anonymous;
        Ok(())
    }

    /// Records the owner's freshly saved profile on the session.
    pub async fn attach_profile(&self, profile: Profile) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        match &mut *state {
            SessionState::Authenticated {
                identity,
                profile: current,
            } if identity.id == profile.owner_id => {
                save_json(self.kv.as_ref(), keys::PROFILE, &profile).await?;
                *current = Some(profile);
                Ok(())
            }
            _ => Err(AppError::Unauthenticated(
                "No session owns this profile".to_string(),
            )),
        }
    }

    /// Flags the session identity as banned when it matches `identity_id`.
    /// Returns whether it matched. Identities other than the current one are
    /// never stored, so they cannot be flagged.
    pub async fn mark_banned(&self, identity_id: &str) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let SessionState::Authenticated { identity, .. } = &mut *state else {
            return Ok(false);
        };
        if identity.id != identity_id {
            return Ok(false);
        }

        identity.is_banned = true;
        if self.kv.get(keys::IDENTITY).await?.is_some() {
            save_json(self.kv.as_ref(), keys::IDENTITY, &*identity).await?;
        }
        tracing::warn!("Session identity {} flagged as banned", identity_id);
        Ok(true)
    }
}
