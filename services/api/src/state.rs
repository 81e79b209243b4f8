//! Application state shared across handlers

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::session::SessionManager;
use crate::storage::Storage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub sessions: SessionManager,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: ServerConfig) -> Self {
        let sessions = SessionManager::new(storage.clone(), config.session_ttl_secs);
        Self {
            storage,
            sessions,
            config: Arc::new(config),
        }
    }
}
