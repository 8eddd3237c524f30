use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, Result as DbResult};
use crate::leetcode::LeetCodeClient;

/// Shared per-process state: configuration, the record store, and the
/// outbound stats client. The only mutable state lives behind the store's
/// connection pool.
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseManager,
    pub leetcode: LeetCodeClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> DbResult<Arc<Self>> {
        let db = DatabaseManager::connect(&config)?;
        let leetcode = LeetCodeClient::new(config.leetcode_api_base.clone());
        Ok(Arc::new(AppState {
            config,
            db,
            leetcode,
        }))
    }
}
