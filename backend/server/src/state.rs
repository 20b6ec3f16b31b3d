use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use tokio::sync::Mutex;

use super::{
    config::Config,
    database::{Db, RedisStore, Store},
    error::AppError,
    realtime::Hub,
    utils::local_now,
};

pub struct State {
    pub config: Config,
    pub db: Db,
    pub hub: Hub,
    /// Held from the slot check until the appointment is written.
    pub booking: Mutex<()>,
    /// Held from reading an item's quantity until its new level and movement are written.
    pub stock: Mutex<()>,
    offset: FixedOffset,
}

impl State {
    pub async fn new(config: Config) -> Result<Arc<Self>, AppError> {
        let store = RedisStore::connect(&config.redis_url, &config.db_name).await?;

        Self::with_store(config, Arc::new(store))
    }

    pub fn with_store(config: Config, store: Arc<dyn Store>) -> Result<Arc<Self>, AppError> {
        let offset = config.offset()?;

        Ok(Arc::new(Self {
            config,
            db: Db::new(store),
            hub: Hub::new(),
            booking: Mutex::new(()),
            stock: Mutex::new(()),
            offset,
        }))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current time on the clinic's wall clock.
    pub fn now(&self) -> DateTime<FixedOffset> {
        local_now(self.offset)
    }
}
