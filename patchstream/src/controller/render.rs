//! Render-tile seams.
//!
//! The on-screen representation of a patch is an external collaborator:
//! the controller only needs to build one from a data-bearing patch,
//! toggle its visibility, and hand it to the cache when it leaves the
//! viewport. GPU resources, shaders and draw calls live behind these
//! traits.

use crate::catalog::DataLayer;
use crate::patch::Patch;

/// A renderer-owned representation built from a data-bearing patch.
pub trait RenderTile: Send {
    /// Toggle whether the tile is part of the active scene.
    fn set_active(&mut self, active: bool);
}

/// Builds render tiles from patches.
pub trait RenderTileFactory: Send {
    /// The tile type this factory produces.
    type Tile: RenderTile;

    /// Build a tile for a data-bearing patch of `layer`.
    fn build(&mut self, layer: &DataLayer, patch: &Patch) -> Self::Tile;
}
