use std::sync::Arc;

use sqlx::SqlitePool;

use crate::ai_analysis::Dispatcher;
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub dispatcher: Dispatcher,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, dispatcher: Dispatcher, config: AppConfig) -> Self {
        Self {
            pool,
            dispatcher,
            config: Arc::new(config),
        }
    }
}
