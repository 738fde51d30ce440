//! Shared application state for all routes. The namespace is immutable once loaded.

use crate::config::NamespaceTree;
use crate::session::SessionStore;
use crate::settings::Settings;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub namespace: Arc<NamespaceTree>,
    pub sessions: SessionStore,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(pool: SqlitePool, namespace: NamespaceTree, settings: Settings) -> Self {
        let sessions = SessionStore::new(
            pool.clone(),
            settings.session_hours,
            settings.default_roles.clone(),
        );
        AppState {
            pool,
            namespace: Arc::new(namespace),
            sessions,
            settings: Arc::new(settings),
        }
    }
}
