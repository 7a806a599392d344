//! Directory-backed local persistent store.
//!
//! Patches are kept as individual `.bin` files named exactly as their
//! source filename; layer display metadata is a single `layers.json`
//! beside them. Everything goes through `tokio::fs`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use crate::catalog::LayerRecord;
use crate::grid;
use crate::patch::{parse_info, Patch, PatchInfo};

use super::error::SourceError;

/// Filename for persisted layer display metadata.
const LAYERS_FILE: &str = "layers.json";

/// Patch source backed by a local directory.
pub struct LocalSource {
    dir: PathBuf,
}

impl LocalSource {
    /// Create a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory for the default store location.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("patchstream")
    }

    /// Directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Available when the store directory exists or can be created.
    pub async fn is_available(&self) -> bool {
        tokio::fs::create_dir_all(&self.dir).await.is_ok()
    }

    /// List stored patches by scanning for `.bin` files.
    ///
    /// Filenames that do not parse are skipped with a warning.
    pub async fn available_patches(&self) -> Result<Vec<PatchInfo>, SourceError> {
        let mut infos = Vec::new();

        if !self.dir.exists() {
            return Ok(infos);
        }

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(".bin") {
                continue;
            }
            match parse_info(name) {
                Ok(info) => infos.push(info),
                Err(error) => warn!(%error, "skipping stored file"),
            }
        }

        Ok(infos)
    }

    /// Read and decode one stored patch.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub async fn get_patch(
        &self,
        info: &PatchInfo,
        include_data: bool,
    ) -> Result<Option<Patch>, SourceError> {
        let path = self.dir.join(&info.filename);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        let grid = grid::decode(&bytes, include_data)?;

        let mut patch = Patch::new(info.clone()).with_source(super::LOCAL_SOURCE_NAME);
        patch.bounds = Some(grid.bounds);
        if include_data {
            patch.data = Some(Arc::new(grid));
        }

        Ok(Some(patch))
    }

    /// Encode and write a data-bearing patch.
    pub async fn store_patch(&self, patch: &Patch) -> Result<(), SourceError> {
        let Some(data) = &patch.data else {
            return Err(SourceError::Store(format!(
                "patch {} has no data to store",
                patch.id()
            )));
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(&patch.info.filename);
        tokio::fs::write(&path, grid::encode(data)).await?;
        Ok(())
    }

    /// Persist layer display metadata, replacing any previous set.
    pub async fn store_layers(&self, records: &[LayerRecord]) -> Result<(), SourceError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_vec_pretty(records)
            .map_err(|e| SourceError::Store(format!("layer records: {}", e)))?;
        tokio::fs::write(self.dir.join(LAYERS_FILE), json).await?;
        Ok(())
    }

    /// Read persisted layer display metadata; absent file is an empty set.
    pub async fn layer_records(&self) -> Result<Vec<LayerRecord>, SourceError> {
        let path = self.dir.join(LAYERS_FILE);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(error.into()),
        };

        serde_json::from_slice(&bytes)
            .map_err(|e| SourceError::Store(format!("layer records: {}", e)))
    }
}
