//! Transient in-memory patch store.
//!
//! Holds imported patches for the lifetime of the process: the landing
//! spot for ad-hoc imports that were never persisted. Also the natural
//! test double for pipeline tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::catalog::LayerRecord;
use crate::patch::{Patch, PatchInfo};

use super::error::SourceError;

/// Patch source keeping everything in memory, keyed by filename.
#[derive(Default)]
pub struct MemorySource {
    patches: Mutex<HashMap<String, Patch>>,
    layers: Mutex<Vec<LayerRecord>>,
}

impl MemorySource {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always available.
    pub async fn is_available(&self) -> bool {
        true
    }

    /// Descriptors of every stored patch.
    pub async fn available_patches(&self) -> Result<Vec<PatchInfo>, SourceError> {
        let patches = self.patches.lock().expect("memory source lock poisoned");
        Ok(patches.values().map(|patch| patch.info.clone()).collect())
    }

    /// Look up a stored patch by filename.
    ///
    /// Without `include_data` the returned patch is stripped to its
    /// descriptor and bounds, matching the other sources' preload form.
    pub async fn get_patch(
        &self,
        info: &PatchInfo,
        include_data: bool,
    ) -> Result<Option<Patch>, SourceError> {
        let patches = self.patches.lock().expect("memory source lock poisoned");
        Ok(patches.get(&info.filename).map(|patch| {
            let mut patch = patch.clone();
            if !include_data {
                patch.data = None;
            }
            patch
        }))
    }

    /// Keep a patch, replacing any previous one with the same filename.
    pub async fn store_patch(&self, patch: &Patch) -> Result<(), SourceError> {
        let mut stored = patch.clone();
        stored.source = Some(super::MEMORY_SOURCE_NAME.to_string());

        let mut patches = self.patches.lock().expect("memory source lock poisoned");
        patches.insert(stored.info.filename.clone(), stored);
        Ok(())
    }

    /// Replace the stored layer records.
    pub async fn store_layers(&self, records: &[LayerRecord]) -> Result<(), SourceError> {
        let mut layers = self.layers.lock().expect("memory source lock poisoned");
        *layers = records.to_vec();
        Ok(())
    }

    /// The stored layer records.
    pub async fn layer_records(&self) -> Result<Vec<LayerRecord>, SourceError> {
        let layers = self.layers.lock().expect("memory source lock poisoned");
        Ok(layers.clone())
    }
}
