//! Patch data model.
//!
//! A patch is one tile of raster data at a fixed level-of-detail and
//! spatial index. Patches are described by an immutable [`PatchInfo`]
//! (parsed from their source filename) and may or may not carry decoded
//! grid data: the load pipeline first registers data-less patches to
//! establish the spatial index, then fills in payloads as fetches
//! complete.

mod info;
mod level;

pub use info::{parse_info, ParseError, PatchInfo};
pub use level::{PatchLevel, CHILDREN_PER_LEVEL, LEVEL_ZOOM_RANGES};

use std::sync::Arc;

use crate::coord::AreaBounds;
use crate::grid::GridData;

/// Identity of a patch across the index, caches and sources.
pub type PatchId = String;

/// One tile of raster data at a fixed level and spatial index.
///
/// The grid payload is reference-counted so that queries, caches and the
/// renderer can share it without copying the value array.
#[derive(Debug, Clone)]
pub struct Patch {
    /// Immutable descriptor.
    pub info: PatchInfo,
    /// Decoded grid payload; absent until the full fetch completes, and
    /// may be dropped again to reclaim memory.
    pub data: Option<Arc<GridData>>,
    /// Geographic extent; set once data or metadata establishes it.
    pub bounds: Option<AreaBounds>,
    /// Name of the source that can (re)supply the payload.
    pub source: Option<String>,
}

impl Patch {
    /// Create a data-less patch from its descriptor.
    pub fn new(info: PatchInfo) -> Self {
        Self {
            info,
            data: None,
            bounds: None,
            source: None,
        }
    }

    /// Attach the name of the supplying source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Global identity, see [`PatchInfo::id`].
    pub fn id(&self) -> PatchId {
        self.info.id()
    }

    /// Whether the grid payload is currently attached.
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> PatchInfo {
        PatchInfo {
            level: PatchLevel::D,
            name: "Cropland".to_string(),
            site: "World".to_string(),
            index: 7,
            filename: "Cropland_D_World@7_20200101.bin".to_string(),
            date: 20200101,
        }
    }

    #[test]
    fn new_patch_is_empty() {
        let patch = Patch::new(info());

        assert!(!patch.has_data());
        assert!(patch.bounds.is_none());
        assert!(patch.source.is_none());
    }

    #[test]
    fn with_source_attaches_name() {
        let patch = Patch::new(info()).with_source("static");
        assert_eq!(patch.source.as_deref(), Some("static"));
    }

    #[test]
    fn id_matches_info_id() {
        let patch = Patch::new(info());
        assert_eq!(patch.id(), patch.info.id());
    }
}
