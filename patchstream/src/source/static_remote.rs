//! Remote static file provider.
//!
//! Serves patches from a static HTTP file tree: a `manifest.json` at the
//! base URL lists relative patch paths (`SITE/FILENAME`), and each patch
//! is fetched from `{base}/{site}/{filename}` and decoded.

use std::sync::Arc;

use tracing::warn;

use crate::grid;
use crate::patch::{parse_info, Patch, PatchInfo};

use super::error::SourceError;
use super::http::AsyncHttpClient;

/// Manifest filename served beside the patch files.
const MANIFEST_FILE: &str = "manifest.json";

/// Patch source backed by a remote static file tree.
pub struct StaticSource<C> {
    client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> StaticSource<C> {
    /// Create a source rooted at `base_url` (no trailing slash needed).
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Static file trees are assumed reachable; failures surface per
    /// request.
    pub async fn is_available(&self) -> bool {
        true
    }

    /// Fetch and parse the manifest into patch descriptors.
    ///
    /// Malformed entries are skipped with a warning; a malformed name is
    /// never fatal to the batch.
    pub async fn available_patches(&self) -> Result<Vec<PatchInfo>, SourceError> {
        let url = format!("{}/{}", self.base_url, MANIFEST_FILE);
        let body = self.client.get(&url).await?;

        let paths: Vec<String> = serde_json::from_slice(&body)
            .map_err(|e| SourceError::Manifest(format!("{}: {}", url, e)))?;

        let mut infos = Vec::new();
        for path in paths {
            let filename = path.rsplit('/').next().unwrap_or(&path);
            match parse_info(filename) {
                Ok(info) => infos.push(info),
                Err(error) => warn!(%error, "skipping manifest entry"),
            }
        }

        Ok(infos)
    }

    /// Fetch one patch, decoding the payload only when requested.
    pub async fn get_patch(
        &self,
        info: &PatchInfo,
        include_data: bool,
    ) -> Result<Option<Patch>, SourceError> {
        let url = format!("{}/{}/{}", self.base_url, info.site, info.filename);
        let bytes = self.client.get(&url).await?;

        let grid = grid::decode(&bytes, include_data)?;

        let mut patch = Patch::new(info.clone()).with_source(super::STATIC_SOURCE_NAME);
        patch.bounds = Some(grid.bounds);
        if include_data {
            patch.data = Some(Arc::new(grid));
        }

        Ok(Some(patch))
    }
}
