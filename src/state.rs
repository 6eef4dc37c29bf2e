use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::middleware::Credential;
use crate::types::{CollectionError, CollectionRegistry};

/// Process-wide state built once at startup and shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub credential: Arc<Credential>,
    pub collections: Arc<CollectionRegistry>,
    pub max_limit: u64,
    pub store_timeout: Duration,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, CollectionError> {
        let collections = CollectionRegistry::from_names(config.api.collections.iter().cloned())?;
        Ok(Self {
            store,
            credential: Arc::new(Credential::new(
                config.security.username.clone(),
                config.security.password.clone(),
                config.security.realm.clone(),
            )),
            collections: Arc::new(collections),
            max_limit: config.api.max_limit,
            store_timeout: Duration::from_millis(config.store.timeout_ms),
            started_at: Instant::now(),
        })
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
