use std::sync::Arc;

use crate::{api::storage::LocalStorage, config::AppConfig, db::DbPool, events::EventPublisher};

/// Shared by every handler; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub config: Arc<AppConfig>,
    pub events: EventPublisher,
    pub storage: LocalStorage,
}

impl AppState {
    pub fn new(db_pool: DbPool, config: AppConfig, events: EventPublisher) -> Self {
        let storage = LocalStorage::new(
            config.uploads.dir.clone(),
            config.server.public_base_url.clone(),
        );
        Self {
            db_pool,
            config: Arc::new(config),
            events,
            storage,
        }
    }
}
