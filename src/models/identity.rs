// src/models/identity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// The authenticated person behind a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Derived from the email for regular users, so the same email
    /// always yields the same id.
    pub id: String,

    pub email: String,

    pub display_name: String,

    pub photo_ref: String,

    /// Fixed at creation.
    pub role: Role,

    /// Set by moderation. A banned identity is purged on the next restore.
    #[serde(default)]
    pub is_banned: bool,

    pub last_login_at: Option<DateTime<Utc>>,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// DTO for login. No password check happens for regular users.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// DTO for registration. Accepted as-is.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}
