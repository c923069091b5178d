use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::services::feed_engine::FeedEngine;

/// Per-session engine registry
///
/// One engine is owned exclusively by one session; handlers look an engine
/// up by session key and serialize access through its own mutex, so queue
/// mutation and history eviction never race. Engines are never shared
/// across sessions.
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, Arc<Mutex<FeedEngine>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an engine and returns its session key
    pub async fn insert(&self, engine: FeedEngine) -> Uuid {
        let session_id = Uuid::new_v4();
        self.sessions
            .write()
            .await
            .insert(session_id, Arc::new(Mutex::new(engine)));
        session_id
    }

    /// Looks up a session's engine
    pub async fn get(&self, session_id: &Uuid) -> Option<Arc<Mutex<FeedEngine>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Drops a session; its queue and history are rebuildable, only the
    /// profile and swipe sets need durable storage elsewhere
    pub async fn remove(&self, session_id: &Uuid) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}
