//! Viewport-driven reconciliation of render tiles.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::cache::TileCache;
use crate::catalog::{DataLayer, Site};
use crate::patch::{Patch, PatchId};
use crate::source::AsyncHttpClient;
use crate::store::PatchStore;

use super::render::{RenderTile, RenderTileFactory};
use super::{level_for_zoom, ControllerError, MapState};

/// Reconciles the materialized render tiles with the viewport.
///
/// On each viewport change, [`update`](MapUpdateController::update)
/// queries every active layer at the level the zoom maps to, issues
/// fire-and-forget fetches for patches still missing data, and settles
/// every data-bearing visible patch on a render tile: reusing the one
/// already visible, reviving one from the cache, or building a new one.
/// Tiles no longer visible are deactivated and demoted into the cache
/// instead of being dropped.
pub struct MapUpdateController<F, C>
where
    F: RenderTileFactory,
    C: AsyncHttpClient + 'static,
{
    store: PatchStore<C>,
    factory: F,
    visible: HashMap<PatchId, F::Tile>,
    cache: TileCache<F::Tile>,
}

impl<F, C> MapUpdateController<F, C>
where
    F: RenderTileFactory,
    C: AsyncHttpClient + 'static,
{
    /// Create a controller over `store`, caching demoted tiles in `cache`.
    pub fn new(store: PatchStore<C>, factory: F, cache: TileCache<F::Tile>) -> Self {
        Self {
            store,
            factory,
            visible: HashMap::new(),
            cache,
        }
    }

    /// Identities of the currently materialized tiles.
    pub fn visible_ids(&self) -> impl Iterator<Item = &PatchId> {
        self.visible.keys()
    }

    /// Number of currently materialized tiles.
    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    /// The demotion cache.
    pub fn cache(&self) -> &TileCache<F::Tile> {
        &self.cache
    }

    /// Reconcile tiles with a new viewport state.
    ///
    /// Escalates only [`ControllerError::ZoomOutOfRange`]; everything
    /// per-patch (missing data, fetch failures) is fire-and-forget.
    pub fn update(&mut self, state: &MapState) -> Result<(), ControllerError> {
        let level = level_for_zoom(state.zoom)?;
        trace!(zoom = state.zoom, level = %level, "map update");

        let catalog = self.store.catalog();
        let catalog = catalog.lock().expect("catalog lock poisoned");

        // Visible, data-bearing patches across all active layers; patches
        // without data are requested instead of materialized.
        let mut wanted: Vec<(&DataLayer, &Patch)> = Vec::new();
        for (_, layer) in catalog.active_layers() {
            for patch in layer.tree.query_area(&state.bounds, level) {
                if !patch.has_data() {
                    if let Some(source) = &patch.source {
                        self.store.request(source, &patch.info);
                    }
                    continue;
                }
                wanted.push((layer, patch));
            }
        }

        let wanted_ids: HashSet<PatchId> =
            wanted.iter().map(|(_, patch)| patch.id()).collect();

        // Demote tiles that fell out of view into the cache
        let demoted: Vec<PatchId> = self
            .visible
            .keys()
            .filter(|id| !wanted_ids.contains(*id))
            .cloned()
            .collect();
        for id in demoted {
            if let Some(mut tile) = self.visible.remove(&id) {
                debug!(patch = %id, "demoting render tile to cache");
                tile.set_active(false);
                self.cache.insert(id, tile);
            }
        }

        // Materialize every visible patch: keep, revive, or build
        for (layer, patch) in wanted {
            let id = patch.id();

            if let Some(tile) = self.visible.get_mut(&id) {
                tile.set_active(true);
                continue;
            }

            let mut tile = match self.cache.take(&id) {
                Some(tile) => {
                    debug!(patch = %id, "reviving render tile from cache");
                    tile
                }
                None => {
                    debug!(patch = %id, "building render tile");
                    self.factory.build(layer, patch)
                }
            };
            tile.set_active(true);
            self.visible.insert(id, tile);
        }

        Ok(())
    }

    /// Whether a layer is fully loaded for the given viewport.
    ///
    /// Every patch known to the layer must have bounds; when the layer is
    /// active, every visible patch must also be materialized as a tile.
    pub fn layer_ready(
        &self,
        state: &MapState,
        site: &Site,
        layer: &DataLayer,
    ) -> Result<bool, ControllerError> {
        if !layer.is_fully_loaded() {
            return Ok(false);
        }
        if !layer.active(site) {
            return Ok(true);
        }

        let level = level_for_zoom(state.zoom)?;
        Ok(layer
            .tree
            .query_area(&state.bounds, level)
            .iter()
            .all(|patch| self.visible.contains_key(&patch.id())))
    }
}
