// src/config.rs

use std::env;
use dotenvy::dotenv;

use crate::services::markers::JitterMode;

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite URL for the key-value store. In-memory storage when unset.
    pub database_url: Option<String>,
    pub rust_log: String,
    pub bind_addr: String,
    /// The reserved credential pair that resolves to the admin identity.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Base for share links (`<origin>/#/<username>`).
    pub public_origin: String,
    /// Product name used for backup file names.
    pub app_name: String,
    pub marker_jitter: JitterMode,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let admin_email = env::var("ADMIN_EMAIL").ok();
        let admin_password = env::var("ADMIN_PASSWORD").ok();

        let public_origin = env::var("PUBLIC_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let app_name = env::var("APP_NAME")
            .unwrap_or_else(|_| "zeelink".to_string());

        let marker_jitter = match env::var("MARKER_JITTER").as_deref() {
            Ok("random") => JitterMode::Random,
            _ => JitterMode::Stable,
        };

        Self {
            database_url,
            rust_log,
            bind_addr,
            admin_email,
            admin_password,
            public_origin,
            app_name,
            marker_jitter,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            rust_log: "info".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
            admin_email: None,
            admin_password: None,
            public_origin: "http://localhost:3000".to_string(),
            app_name: "zeelink".to_string(),
            marker_jitter: JitterMode::Stable,
        }
    }
}
