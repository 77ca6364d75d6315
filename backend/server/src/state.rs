use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::{
    config::{Config, StorageBackend},
    database::{RedisStore, init_redis},
    memory::MemoryStore,
    sample::sample,
    store::Store,
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Arc<Self>> {
        let store: Arc<dyn Store> = match config.storage {
            StorageBackend::Memory if config.seed_sample_data => {
                info!("Loading sample catalog into memory");
                Arc::new(MemoryStore::with_sample(sample(Utc::now())))
            }
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Redis => {
                let connection = init_redis(&config.redis_url).await?;
                Arc::new(RedisStore::new(connection))
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Arc<Self> {
        info!("Using {} storage", store.backend());

        Arc::new(Self { config, store })
    }
}
