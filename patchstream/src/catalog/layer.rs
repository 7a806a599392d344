//! Data layers and their display state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::index::PatchTree;
use crate::patch::Patch;

use super::site::Site;

/// Fixed palette cycled through as layers are created.
///
/// Deterministic stand-in for per-layer random tints: repeated runs over
/// the same data produce the same colors.
const TINT_PALETTE: [Tint; 8] = [
    Tint { r: 0xE6, g: 0x7E, b: 0x22 },
    Tint { r: 0x2E, g: 0x86, b: 0xC1 },
    Tint { r: 0x27, g: 0xAE, b: 0x60 },
    Tint { r: 0x8E, g: 0x44, b: 0xAD },
    Tint { r: 0xC0, g: 0x39, b: 0x2B },
    Tint { r: 0xF1, g: 0xC4, b: 0x0F },
    Tint { r: 0x16, g: 0xA0, b: 0x85 },
    Tint { r: 0x7F, g: 0x8C, b: 0x8D },
];

/// Display tint applied to a layer's rendered patches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Tint {
    /// Create a tint from RGB components.
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Palette entry for the `n`-th layer created.
    pub fn palette(n: usize) -> Self {
        TINT_PALETTE[n % TINT_PALETTE.len()]
    }
}

/// Human-readable layer metadata shown beside the map.
///
/// Refreshed from the most recently pushed data-bearing patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerDisplay {
    /// Measurement units (from grid metadata).
    pub units: Option<String>,
    /// Name of the source that supplied the last data push.
    pub source: Option<String>,
    /// Date stamp of the last data push, ISO-formatted when parseable.
    pub date: Option<String>,
    /// Extent string derived from the patch bounds.
    pub extent: Option<String>,
}

impl LayerDisplay {
    /// Build display metadata from a data-bearing patch.
    pub fn from_patch(patch: &Patch) -> Self {
        let units = patch
            .data
            .as_ref()
            .and_then(|data| data.units().map(str::to_string));

        let date = format_date(patch.info.date);

        let extent = patch.bounds.map(|bounds| {
            format!(
                "{:.2}°N {:.2}°E {:.2}°S {:.2}°W",
                bounds.north, bounds.east, bounds.south, bounds.west
            )
        });

        Self {
            units,
            source: patch.source.clone(),
            date: Some(date),
            extent,
        }
    }
}

/// Render the `YYYYMMDD` filename stamp as an ISO date, falling back to
/// the raw number for stamps that do not parse.
fn format_date(stamp: i64) -> String {
    NaiveDate::parse_from_str(&stamp.to_string(), "%Y%m%d")
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| stamp.to_string())
}

/// Persistable layer display metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRecord {
    /// Owning site name.
    pub site: String,
    /// Layer name.
    pub name: String,
    /// Display tint.
    pub tint: Tint,
    /// Display filter range.
    pub filter: (f32, f32),
}

/// One named raster series scoped to a site.
pub struct DataLayer {
    /// Owning site name.
    pub site: String,
    /// Layer name (e.g. "Cropland").
    pub name: String,
    /// Display tint.
    pub tint: Tint,
    /// Spatial/LOD index over this layer's patches.
    pub tree: PatchTree,
    /// Aggregate (min, max) over all patches with data.
    pub value_range: Option<(f32, f32)>,
    /// Display filter range, normalized 0..1.
    pub filter: (f32, f32),
    /// Selection toggle.
    pub selected: bool,
    /// Display metadata from the most recent data push.
    pub display: LayerDisplay,
}

impl DataLayer {
    /// Create an empty, unselected layer.
    pub fn new(site: impl Into<String>, name: impl Into<String>, tint: Tint) -> Self {
        Self {
            site: site.into(),
            name: name.into(),
            tint,
            tree: PatchTree::new(),
            value_range: None,
            filter: (0.0, 1.0),
            selected: false,
            display: LayerDisplay::default(),
        }
    }

    /// A layer is active when both it and its owning site are selected.
    pub fn active(&self, site: &Site) -> bool {
        self.selected && site.selected
    }

    /// Recompute the aggregate value range over patches with data.
    ///
    /// Linear scan over the tree; patch counts per layer are small.
    pub fn recompute_stats(&mut self) {
        let mut range: Option<(f32, f32)> = None;

        for patch in self.tree.values() {
            let Some(data) = &patch.data else { continue };
            range = Some(match range {
                Some((min, max)) => (min.min(data.min_value), max.max(data.max_value)),
                None => (data.min_value, data.max_value),
            });
        }

        self.value_range = range;
    }

    /// A layer is fully loaded once every known patch has bounds.
    pub fn is_fully_loaded(&self) -> bool {
        self.tree
            .values()
            .iter()
            .all(|patch| patch.bounds.is_some())
    }

    /// Persistable display-metadata record.
    pub fn to_record(&self) -> LayerRecord {
        LayerRecord {
            site: self.site.clone(),
            name: self.name.clone(),
            tint: self.tint,
            filter: self.filter,
        }
    }
}
