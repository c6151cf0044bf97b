use std::sync::Arc;

use sqlx::{Pool, Postgres};

use crate::{config::Config, storage::MediaStorage};

pub struct AppState {
    pub pool: Pool<Postgres>,
    pub config: Config,
    pub storage: MediaStorage,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(pool: Pool<Postgres>, config: Config) -> SharedState {
        let storage = MediaStorage::new(config.media_root.clone(), config.media_url.clone());
        Arc::new(Self {
            pool,
            config,
            storage,
        })
    }
}
