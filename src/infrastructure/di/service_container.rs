//! Service container for dependency injection
//!
//! Wires up the menu service with its store.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::MenuService;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::infrastructure::sqlite::SqliteNodeStore;
use crate::infrastructure::traits::NodeStore;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Node storage backend
    pub store: Arc<dyn NodeStore>,

    pub menus: MenuService,
}

impl ServiceContainer {
    /// Create a new service container backed by the configured SQLite database.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        let store = SqliteNodeStore::open(&settings.database, settings.busy_timeout())?;
        Ok(Self::with_store(settings, Arc::new(store)))
    }

    /// Create a service container with a custom store (for testing).
    pub fn with_store(settings: Settings, store: Arc<dyn NodeStore>) -> Self {
        debug!("wiring {} store", store.backend());
        let menus = MenuService::new(Arc::clone(&store))
            .with_conflict_retries(settings.max_conflict_retries);
        Self {
            settings: Arc::new(settings),
            store,
            menus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{MemoryNodeStore, NodeReader};

    #[test]
    fn given_memory_store_when_wiring_then_service_uses_it() {
        let container =
            ServiceContainer::with_store(Settings::default(), Arc::new(MemoryNodeStore::new()));
        container.menus.create("Dashboard", None).unwrap();

        assert_eq!(container.store.backend(), "memory");
        assert_eq!(container.store.fetch_all().unwrap().len(), 1);
    }
}
