use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::SqlitePool;

use crate::services::AliasGenerator;
use crate::storage::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub blobs: Arc<dyn BlobStore>,
    pub cookie_key: Key,
    pub aliases: AliasGenerator,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
