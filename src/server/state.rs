use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::dispatch::EmailDispatcher;
use crate::postgres::PostgresPool;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<EmailDispatcher>,
    /// Present only when a database is configured
    pub postgres: Option<PostgresPool>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        dispatcher: Arc<EmailDispatcher>,
        postgres: Option<PostgresPool>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            dispatcher,
            postgres,
            started_at: Utc::now(),
        }
    }
}
