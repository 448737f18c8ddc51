use std::sync::Arc;

use guestbook_db::Database;

use crate::config::Config;
use crate::error::ApiError;
use crate::gate::AdminGate;
use crate::notify::Notifier;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: Config,
    pub gate: AdminGate,
    pub notifier: Notifier,
}

impl AppStateInner {
    pub fn new(config: Config, db: Database, notifier: Notifier) -> anyhow::Result<AppState> {
        let gate = AdminGate::new(&config.admin_token)?;
        Ok(Arc::new(Self {
            db,
            config,
            gate,
            notifier,
        }))
    }
}

/// Run a blocking database call off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            tracing::error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::Internal)
}
