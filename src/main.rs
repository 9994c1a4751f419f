// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use zeelink::config::Config;
use zeelink::routes;
use zeelink::services::markers::{AvatarSource, HttpAvatarSource};
use zeelink::state::AppState;
use zeelink::storage::{KvStore, MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let kv: Arc<dyn KvStore> = match &config.database_url {
        Some(url) => {
            let store = SqliteStore::connect(url).await?;
            tracing::info!("Key-value store opened at {}", url);
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, data lives in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let avatars: Arc<dyn AvatarSource> = Arc::new(HttpAvatarSource::new()?);
    let state = AppState::build(config.clone(), kv, avatars).await?;

    // Keeps the map markers in step with the directory
    let _watcher = state.markers.clone().watch(state.directory.clone());

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("{} listening on {}", config.app_name, listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
