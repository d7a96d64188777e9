use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    services::notification_service::Notifier,
};

/// Handles built once in `main` and injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, config: AppConfig) -> Self {
        let notifier = Notifier::new(config.notify.clone());
        Self {
            pool,
            orm,
            config: Arc::new(config),
            notifier,
        }
    }
}
