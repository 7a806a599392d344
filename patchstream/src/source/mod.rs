//! Patch sources.
//!
//! Patches arrive from a closed set of source kinds: a remote static
//! file provider, a directory-backed local persistent store, and a
//! transient in-memory store. [`PatchSource`] is the capability surface
//! over the set; a [`SourceRegistry`] lists the active sources in
//! priority order and resolves them by name.

mod error;
mod http;
mod local;
mod memory;
mod static_remote;

pub use error::SourceError;
pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use local::LocalSource;
pub use memory::MemorySource;
pub use static_remote::StaticSource;

#[cfg(test)]
pub use http::tests::MockHttpClient;

use crate::catalog::LayerRecord;
use crate::patch::{Patch, PatchInfo};

/// Registry name of the remote static provider.
pub const STATIC_SOURCE_NAME: &str = "static";
/// Registry name of the local persistent store.
pub const LOCAL_SOURCE_NAME: &str = "local";
/// Registry name of the in-memory store.
pub const MEMORY_SOURCE_NAME: &str = "memory";

/// One of the known patch source kinds.
///
/// A closed enum rather than a trait object: the set of source kinds is
/// part of the design, and enum dispatch keeps the async methods plain.
pub enum PatchSource<C: AsyncHttpClient = AsyncReqwestClient> {
    /// Remote static file provider.
    Static(StaticSource<C>),
    /// Directory-backed persistent store.
    Local(LocalSource),
    /// Transient in-memory store.
    Memory(MemorySource),
}

impl<C: AsyncHttpClient> PatchSource<C> {
    /// Stable name used for registry lookup and patch attribution.
    pub fn name(&self) -> &'static str {
        match self {
            PatchSource::Static(_) => STATIC_SOURCE_NAME,
            PatchSource::Local(_) => LOCAL_SOURCE_NAME,
            PatchSource::Memory(_) => MEMORY_SOURCE_NAME,
        }
    }

    /// Whether this source can currently serve requests.
    pub async fn is_available(&self) -> bool {
        match self {
            PatchSource::Static(source) => source.is_available().await,
            PatchSource::Local(source) => source.is_available().await,
            PatchSource::Memory(source) => source.is_available().await,
        }
    }

    /// Descriptors of every patch this source can supply.
    pub async fn available_patches(&self) -> Result<Vec<PatchInfo>, SourceError> {
        match self {
            PatchSource::Static(source) => source.available_patches().await,
            PatchSource::Local(source) => source.available_patches().await,
            PatchSource::Memory(source) => source.available_patches().await,
        }
    }

    /// Fetch one patch; `Ok(None)` when the source does not have it.
    pub async fn get_patch(
        &self,
        info: &PatchInfo,
        include_data: bool,
    ) -> Result<Option<Patch>, SourceError> {
        match self {
            PatchSource::Static(source) => source.get_patch(info, include_data).await,
            PatchSource::Local(source) => source.get_patch(info, include_data).await,
            PatchSource::Memory(source) => source.get_patch(info, include_data).await,
        }
    }

    /// Whether this source accepts writes.
    pub fn is_writable(&self) -> bool {
        !matches!(self, PatchSource::Static(_))
    }

    /// Persist a data-bearing patch.
    pub async fn store_patch(&self, patch: &Patch) -> Result<(), SourceError> {
        match self {
            PatchSource::Static(_) => {
                Err(SourceError::Store("static source is read-only".to_string()))
            }
            PatchSource::Local(source) => source.store_patch(patch).await,
            PatchSource::Memory(source) => source.store_patch(patch).await,
        }
    }

    /// Persist layer display metadata.
    pub async fn store_layers(&self, records: &[LayerRecord]) -> Result<(), SourceError> {
        match self {
            PatchSource::Static(_) => {
                Err(SourceError::Store("static source is read-only".to_string()))
            }
            PatchSource::Local(source) => source.store_layers(records).await,
            PatchSource::Memory(source) => source.store_layers(records).await,
        }
    }

    /// Read persisted layer display metadata.
    pub async fn layer_records(&self) -> Result<Vec<LayerRecord>, SourceError> {
        match self {
            PatchSource::Static(_) => Ok(Vec::new()),
            PatchSource::Local(source) => source.layer_records().await,
            PatchSource::Memory(source) => source.layer_records().await,
        }
    }
}

/// Active sources in priority order.
pub struct SourceRegistry<C: AsyncHttpClient = AsyncReqwestClient> {
    sources: Vec<PatchSource<C>>,
}

impl<C: AsyncHttpClient> SourceRegistry<C> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Append a source; earlier sources take priority.
    pub fn push(&mut self, source: PatchSource<C>) {
        self.sources.push(source);
    }

    /// All registered sources, in priority order.
    pub fn sources(&self) -> &[PatchSource<C>] {
        &self.sources
    }

    /// Look up a source by registry name.
    pub fn by_name(&self, name: &str) -> Option<&PatchSource<C>> {
        self.sources.iter().find(|source| source.name() == name)
    }

    /// First writable source that is currently available.
    ///
    /// Errors with [`SourceError::NoSourceAvailable`] when persistence is
    /// requested and nothing writable responds.
    pub async fn writable_local(&self) -> Result<&PatchSource<C>, SourceError> {
        for source in &self.sources {
            if source.is_writable() && source.is_available().await {
                return Ok(source);
            }
        }
        Err(SourceError::NoSourceAvailable)
    }
}

impl<C: AsyncHttpClient> Default for SourceRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}
