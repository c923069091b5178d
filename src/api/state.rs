use std::sync::Arc;

use tokio::sync::RwLock;

use crate::services::{InMemoryCatalog, SessionManager};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Regional catalog; read-mostly, written by the seeding endpoints
    pub catalog: Arc<RwLock<InMemoryCatalog>>,
    /// One feed engine per session, looked up by session key
    pub sessions: Arc<SessionManager>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Creates state with an empty catalog
    pub fn new() -> Self {
        Self::with_catalog(InMemoryCatalog::new())
    }

    /// Creates state around a pre-loaded catalog
    pub fn with_catalog(catalog: InMemoryCatalog) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(catalog)),
            sessions: Arc::new(SessionManager::new()),
        }
    }
}
