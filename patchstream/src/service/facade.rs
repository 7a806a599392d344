//! Service facade implementation.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::cache::TileCache;
use crate::catalog::Catalog;
use crate::config::ServiceConfig;
use crate::controller::{ControllerError, MapState, MapUpdateController, RenderTileFactory};
use crate::source::{
    AsyncReqwestClient, LocalSource, MemorySource, PatchSource, SourceError, SourceRegistry,
    StaticSource,
};
use crate::store::PatchStore;

/// Errors surfaced by the service facade.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Source construction or persistence failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Viewport handling failed.
    #[error(transparent)]
    Controller(#[from] ControllerError),
}

/// Facade over catalog, sources, pipeline and controller.
pub struct PatchService<F: RenderTileFactory> {
    store: PatchStore<AsyncReqwestClient>,
    controller: MapUpdateController<F, AsyncReqwestClient>,
}

impl<F: RenderTileFactory> PatchService<F> {
    /// Assemble the standard stack from configuration.
    ///
    /// Sources are registered in priority order: local store, in-memory
    /// store, then the remote static provider when a data URL is
    /// configured.
    pub fn new(config: ServiceConfig, factory: F) -> Result<Self, ServiceError> {
        let mut registry = SourceRegistry::new();

        let data_dir = config
            .data_dir
            .clone()
            .unwrap_or_else(LocalSource::default_dir);
        registry.push(PatchSource::Local(LocalSource::new(data_dir)));
        registry.push(PatchSource::Memory(MemorySource::new()));

        if let Some(url) = &config.data_url {
            let client = AsyncReqwestClient::with_timeout(config.http_timeout_secs)?;
            registry.push(PatchSource::Static(StaticSource::new(client, url.clone())));
        }

        let mut catalog = Catalog::new();
        catalog.add_site(crate::catalog::Site::new(&config.primary_site));
        catalog.select_site(&config.primary_site);

        let store = PatchStore::new(registry, Arc::new(Mutex::new(catalog)));
        let controller = MapUpdateController::new(
            store.clone(),
            factory,
            TileCache::new(config.cache_capacity),
        );

        Ok(Self { store, controller })
    }

    /// The load pipeline.
    pub fn store(&self) -> &PatchStore<AsyncReqwestClient> {
        &self.store
    }

    /// The map update controller.
    pub fn controller(&self) -> &MapUpdateController<F, AsyncReqwestClient> {
        &self.controller
    }

    /// Shared catalog handle.
    pub fn catalog(&self) -> Arc<Mutex<Catalog>> {
        self.store.catalog()
    }

    /// Subscribe to patch arrivals.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    /// Restore persisted layer display metadata, then run the preload
    /// and load passes over every source.
    pub async fn init(&self) {
        for source in self.store.sources().sources() {
            match source.layer_records().await {
                Ok(records) => {
                    if records.is_empty() {
                        continue;
                    }
                    info!(
                        source = source.name(),
                        count = records.len(),
                        "restoring layer records"
                    );
                    let catalog = self.store.catalog();
                    let mut catalog = catalog.lock().expect("catalog lock poisoned");
                    for record in &records {
                        catalog.apply_layer_record(record);
                    }
                }
                Err(error) => {
                    tracing::warn!(source = source.name(), %error, "layer records unavailable")
                }
            }
        }

        self.store.init().await;
    }

    /// Feed a new viewport state to the controller.
    pub fn on_viewport(&mut self, state: &MapState) -> Result<(), ServiceError> {
        self.controller.update(state)?;
        Ok(())
    }

    /// Persist layer display metadata to the first writable source.
    pub async fn save_layers(&self) -> Result<(), ServiceError> {
        let records = {
            let catalog = self.store.catalog();
            let catalog = catalog.lock().expect("catalog lock poisoned");
            catalog.layer_records()
        };

        let writable = self.store.sources().writable_local().await?;
        writable.store_layers(&records).await?;
        Ok(())
    }

    /// Persist one data-bearing patch to the first writable source.
    pub async fn save_patch(&self, id: &str) -> Result<(), ServiceError> {
        let patch = {
            let catalog = self.store.catalog();
            let catalog = catalog.lock().expect("catalog lock poisoned");
            let found = catalog
                .layers()
                .find_map(|(_, layer)| layer.tree.find(id).cloned());
            found
        };

        let Some(patch) = patch else {
            return Err(ServiceError::Source(SourceError::Store(format!(
                "unknown patch {}",
                id
            ))));
        };

        let writable = self.store.sources().writable_local().await?;
        writable.store_patch(&patch).await?;
        Ok(())
    }
}
