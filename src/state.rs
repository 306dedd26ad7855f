use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{Database, PgDatabase};
use crate::images::PreviewRegistry;
use crate::storage::{Storage, StorageClient};
use crate::views::Views;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn Database>,
    pub storage: Arc<dyn StorageClient>,
    pub config: Arc<AppConfig>,
    pub previews: PreviewRegistry,
    pub views: Arc<Views>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgDatabase::connect(&config.database_url).await?;
        if let Err(e) = db.migrate().await {
            tracing::warn!(error = ?e, "migration failed; continuing");
        }

        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;

        Ok(Self::from_parts(
            Arc::new(db),
            storage,
            config.clone(),
            PreviewRegistry::with_limit(config.preview_max_bytes),
            Arc::new(Views::new()?),
        ))
    }

    pub fn from_parts(
        db: Arc<dyn Database>,
        storage: Arc<dyn StorageClient>,
        config: Arc<AppConfig>,
        previews: PreviewRegistry,
        views: Arc<Views>,
    ) -> Self {
        Self {
            db,
            storage,
            config,
            previews,
            views,
        }
    }
}
