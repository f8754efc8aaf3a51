use std::sync::Arc;

use crate::{
    config::PipelineSettings,
    db::{
        AccountStore, CatalogRepository, MemoryAccountStore, MemoryCatalogRepository,
        MemoryProfileStore, ProfileStore,
    },
    services::{
        catalog::SharedCatalog,
        gateway::{CatalogGateway, TagIndexGateway},
    },
};

/// Shared application state
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub accounts: Arc<dyn AccountStore>,
    pub catalog_repository: Arc<dyn CatalogRepository>,
    /// Current catalog snapshot, swapped on import
    pub catalog: SharedCatalog,
    pub gateway: Arc<dyn CatalogGateway>,
    pub settings: PipelineSettings,
    /// Required for catalog import over HTTP; `None` disables the route
    pub admin_token: Option<String>,
}

impl AppState {
    /// State backed by in-memory stores and the tag index, for tests and local runs
    pub fn in_memory() -> Self {
        Self {
            profiles: Arc::new(MemoryProfileStore::new()),
            accounts: Arc::new(MemoryAccountStore::new()),
            catalog_repository: Arc::new(MemoryCatalogRepository::new()),
            catalog: SharedCatalog::default(),
            gateway: Arc::new(TagIndexGateway::new()),
            settings: PipelineSettings::default(),
            admin_token: None,
        }
    }
}
