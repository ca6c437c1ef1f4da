use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classroom::api::router;
use classroom::auth::cookie_key;
use classroom::config::Config;
use classroom::db;
use classroom::services::AliasGenerator;
use classroom::state::AppState;
use classroom::storage::LocalBlobStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "classroom=debug,tower_http=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    db::migrate(&pool).await.context("failed to run migrations")?;

    let blobs = LocalBlobStore::new(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create {}", config.upload_dir.display()))?;

    let state = AppState {
        db: pool,
        blobs: Arc::new(blobs),
        cookie_key: cookie_key(config.session_secret.as_deref())?,
        aliases: AliasGenerator::default(),
    };

    let app = router(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http());

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
