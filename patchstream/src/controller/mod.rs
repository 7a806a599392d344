//! Map update controller.
//!
//! Bridges viewport state to the rest of the system: translates zoom
//! into a level-of-detail, asks each active layer's index for the
//! patches intersecting the viewport, requests missing payloads through
//! the load pipeline, and keeps the set of materialized render tiles in
//! sync: building new ones, reviving cached ones, and demoting tiles
//! that fell out of view into the render-tile cache.

mod render;
mod update;

pub use render::{RenderTile, RenderTileFactory};
pub use update::MapUpdateController;

use thiserror::Error;

use crate::coord::AreaBounds;
use crate::patch::{PatchLevel, LEVEL_ZOOM_RANGES};

/// Current viewport: zoom plus visible bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct MapState {
    /// Viewport zoom.
    pub zoom: f64,
    /// Visible geographic bounds.
    pub bounds: AreaBounds,
}

impl MapState {
    /// Create a viewport state.
    pub fn new(zoom: f64, bounds: AreaBounds) -> Self {
        Self { zoom, bounds }
    }
}

/// Controller errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    /// Zoom outside the level table; a range-table bug, escalated.
    #[error("zoom {zoom} outside the level table")]
    ZoomOutOfRange {
        /// The out-of-range zoom value.
        zoom: f64,
    },
}

/// Map a viewport zoom onto a level-of-detail.
///
/// Uses the ordered `[min, max)` ranges of [`LEVEL_ZOOM_RANGES`]; zoom
/// below the first minimum or at/above the last maximum is
/// [`ControllerError::ZoomOutOfRange`].
pub fn level_for_zoom(zoom: f64) -> Result<PatchLevel, ControllerError> {
    PatchLevel::ALL
        .iter()
        .zip(LEVEL_ZOOM_RANGES)
        .find(|(_, (min, max))| zoom >= *min && zoom < *max)
        .map(|(level, _)| *level)
        .ok_or(ControllerError::ZoomOutOfRange { zoom })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_maps_to_levels() {
        assert_eq!(level_for_zoom(0.0).unwrap(), PatchLevel::A);
        assert_eq!(level_for_zoom(2.9).unwrap(), PatchLevel::A);
        assert_eq!(level_for_zoom(3.0).unwrap(), PatchLevel::B);
        assert_eq!(level_for_zoom(10.0).unwrap(), PatchLevel::C);
        assert_eq!(level_for_zoom(12.0).unwrap(), PatchLevel::D);
        assert_eq!(level_for_zoom(19.9).unwrap(), PatchLevel::E);
        assert_eq!(level_for_zoom(24.9).unwrap(), PatchLevel::F);
    }

    #[test]
    fn out_of_range_zoom_is_an_error() {
        assert_eq!(
            level_for_zoom(-0.1),
            Err(ControllerError::ZoomOutOfRange { zoom: -0.1 })
        );
        assert_eq!(
            level_for_zoom(25.0),
            Err(ControllerError::ZoomOutOfRange { zoom: 25.0 })
        );
    }

    #[test]
    fn range_edges_belong_to_the_finer_level() {
        assert_eq!(level_for_zoom(16.0).unwrap(), PatchLevel::E);
        assert_eq!(level_for_zoom(15.999).unwrap(), PatchLevel::D);
    }
}
