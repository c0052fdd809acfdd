use chrono::Duration;
use std::sync::Arc;

use crate::cache::CachedStore;
use crate::config::Config;
use crate::session::SessionStore;
use crate::storage::Storage;

/// The server's shared state, built once and injected into every handler.
#[derive(Clone)]
pub struct AppState {
    /// The in-memory session table.
    pub sessions: Arc<SessionStore>,
    /// The cached envelope store in front of the durable backend.
    pub store: CachedStore,
    /// The server's configuration.
    pub config: Config,
}

impl AppState {
    /// Wires the state around any [`Storage`] backend.
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Self {
        let sessions = Arc::new(SessionStore::new(Duration::hours(config.session_ttl_hours)));
        let store = CachedStore::new(storage, config.persist_workers);
        Self {
            sessions,
            store,
            config,
        }
    }
}
