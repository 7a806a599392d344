//! Site / data-layer catalog.
//!
//! The catalog owns the data model: sites group named data layers, each
//! layer owns one [`PatchTree`](crate::index::PatchTree). Patches may
//! arrive in any order from any source: [`Catalog::push_patch`] lazily
//! creates the owning site and layer on first reference, inserts into the
//! layer's tree, and keeps aggregate statistics, display metadata and
//! site bounds current.

mod layer;
mod site;

pub use layer::{DataLayer, LayerDisplay, LayerRecord, Tint};
pub use site::Site;

use tracing::{debug, warn};

use crate::patch::{Patch, PatchInfo};

/// The root of the data model: every site and layer known to the system.
#[derive(Default)]
pub struct Catalog {
    sites: Vec<Site>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// All sites, in creation order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Look up a site by name.
    pub fn site(&self, name: &str) -> Option<&Site> {
        self.sites.iter().find(|site| site.name == name)
    }

    /// Add a site.
    pub fn add_site(&mut self, site: Site) {
        self.sites.push(site);
    }

    /// Select `name` as the primary site, clearing every other selection.
    ///
    /// Single selection is offered but not enforced by the model; callers
    /// that mutate sites directly can hold several selected.
    pub fn select_site(&mut self, name: &str) {
        for site in &mut self.sites {
            site.selected = site.name == name;
        }
    }

    /// Iterate every layer with its owning site.
    pub fn layers(&self) -> impl Iterator<Item = (&Site, &DataLayer)> {
        self.sites
            .iter()
            .flat_map(|site| site.layers.iter().map(move |layer| (site, layer)))
    }

    /// Iterate layers that are currently active (layer and site selected).
    pub fn active_layers(&self) -> impl Iterator<Item = (&Site, &DataLayer)> {
        self.layers().filter(|(site, layer)| layer.active(site))
    }

    /// Resolve the layer owning `info`, creating site and layer lazily.
    pub fn get_or_create_layer(&mut self, info: &PatchInfo) -> &mut DataLayer {
        let (site_index, layer_index) = self.ensure_layer(info);
        &mut self.sites[site_index].layers[layer_index]
    }

    fn ensure_layer(&mut self, info: &PatchInfo) -> (usize, usize) {
        let site_index = match self.sites.iter().position(|site| site.name == info.site) {
            Some(index) => index,
            None => {
                debug!(site = %info.site, "creating site on first reference");
                self.sites.push(Site::new(&info.site));
                self.sites.len() - 1
            }
        };

        let total_layers = self.layer_count();
        let site = &mut self.sites[site_index];
        let layer_index = match site.layers.iter().position(|layer| layer.name == info.name) {
            Some(index) => index,
            None => {
                debug!(site = %info.site, layer = %info.name, "creating layer on first reference");
                let tint = Tint::palette(total_layers);
                site.layers.push(DataLayer::new(&info.site, &info.name, tint));
                site.layers.len() - 1
            }
        };

        (site_index, layer_index)
    }

    fn layer_count(&self) -> usize {
        self.sites.iter().map(|site| site.layers.len()).sum()
    }

    /// Insert a patch into its layer's index and refresh derived state.
    ///
    /// A slot conflict (two identities addressing the same tree slot) is
    /// logged and dropped, keeping the occupant. When the patch carries
    /// data, layer statistics and display metadata are recomputed from
    /// the stored patches; when it carries bounds, the site bounds grow
    /// to include them.
    pub fn push_patch(&mut self, patch: Patch) {
        let bounds = patch.bounds;
        let has_data = patch.has_data();
        let display = has_data.then(|| LayerDisplay::from_patch(&patch));

        let (site_index, layer_index) = self.ensure_layer(&patch.info);
        let site = &mut self.sites[site_index];
        let layer = &mut site.layers[layer_index];

        if let Err(conflict) = layer.tree.insert(patch) {
            warn!(error = %conflict, layer = %layer.name, "dropping conflicting patch insert");
            return;
        }

        if let Some(display) = display {
            layer.recompute_stats();
            layer.display = display;
        }

        if let Some(bounds) = bounds {
            site.bounds.add(&bounds);
        }
    }

    /// Drop the decoded grid data of one patch, keeping its index entry
    /// and bounds.
    ///
    /// This is the explicit memory-reclaim policy: evicting a render
    /// object never drops grid data implicitly. Returns whether any data
    /// was attached.
    pub fn reclaim_data(&mut self, id: &str) -> bool {
        for site in &mut self.sites {
            for layer in &mut site.layers {
                if let Some(patch) = layer.tree.find_mut(id) {
                    let had_data = patch.data.take().is_some();
                    if had_data {
                        debug!(patch = id, layer = %layer.name, "reclaimed grid data");
                    }
                    return had_data;
                }
            }
        }
        false
    }

    /// Persistable records for every layer's display metadata.
    pub fn layer_records(&self) -> Vec<LayerRecord> {
        self.layers().map(|(_, layer)| layer.to_record()).collect()
    }

    /// Apply a persisted layer record, creating site and layer lazily.
    pub fn apply_layer_record(&mut self, record: &LayerRecord) {
        let probe = PatchInfo {
            level: crate::patch::PatchLevel::A,
            name: record.name.clone(),
            site: record.site.clone(),
            index: 0,
            filename: String::new(),
            date: 0,
        };
        let layer = self.get_or_create_layer(&probe);
        layer.tint = record.tint;
        layer.filter = record.filter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::AreaBounds;
    use crate::grid::GridData;
    use crate::patch::{parse_info, PatchLevel};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn grid(min: f32, max: f32, bounds: AreaBounds) -> Arc<GridData> {
        let mut metadata = HashMap::new();
        metadata.insert("units".to_string(), "t/ha".to_string());
        Arc::new(GridData {
            metadata,
            bounds,
            values: vec![min, max],
            no_data: None,
            count_x: 2,
            count_y: 1,
            min_value: min,
            max_value: max,
        })
    }

    fn data_patch(filename: &str, min: f32, max: f32, bounds: AreaBounds) -> Patch {
        let info = parse_info(filename).unwrap();
        let mut patch = Patch::new(info);
        patch.bounds = Some(bounds);
        patch.data = Some(grid(min, max, bounds));
        patch
    }

    fn stub_patch(filename: &str) -> Patch {
        Patch::new(parse_info(filename).unwrap())
    }

    fn bounds_a() -> AreaBounds {
        AreaBounds::new(10.0, 10.0, 0.0, 0.0)
    }

    fn bounds_b() -> AreaBounds {
        AreaBounds::new(30.0, 40.0, 20.0, 20.0)
    }

    #[test]
    fn push_creates_site_and_layer_lazily() {
        let mut catalog = Catalog::new();
        catalog.push_patch(stub_patch("Cropland_A_World@0_20200101.bin"));

        assert_eq!(catalog.sites().len(), 1);
        let site = catalog.site("World").unwrap();
        assert_eq!(site.layers.len(), 1);
        assert_eq!(site.layers[0].name, "Cropland");
    }

    #[test]
    fn layers_arrive_in_any_order() {
        let mut catalog = Catalog::new();
        catalog.push_patch(stub_patch("Cropland_D_World@7_20200101.bin"));
        catalog.push_patch(stub_patch("Cropland_A_World@0_20200101.bin"));
        catalog.push_patch(stub_patch("TreeCover_A_Alps@0_20200101.bin"));

        assert_eq!(catalog.sites().len(), 2);
        assert_eq!(catalog.layers().count(), 2);
        let world = catalog.site("World").unwrap();
        assert_eq!(world.layers[0].tree.len(), 2);
    }

    #[test]
    fn data_push_recomputes_stats() {
        let mut catalog = Catalog::new();
        catalog.push_patch(data_patch(
            "Cropland_A_World@0_20200101.bin",
            1.0,
            5.0,
            bounds_a(),
        ));
        catalog.push_patch(data_patch(
            "Cropland_B_World@1_20200101.bin",
            -2.0,
            3.0,
            bounds_b(),
        ));

        let (_, layer) = catalog.layers().next().unwrap();
        assert_eq!(layer.value_range, Some((-2.0, 5.0)));
    }

    #[test]
    fn data_push_refreshes_display_metadata() {
        let mut catalog = Catalog::new();
        catalog.push_patch(data_patch(
            "Cropland_A_World@0_20200101.bin",
            1.0,
            5.0,
            bounds_a(),
        ));

        let (_, layer) = catalog.layers().next().unwrap();
        assert_eq!(layer.display.units.as_deref(), Some("t/ha"));
        assert!(layer.display.extent.is_some());
        assert_eq!(layer.display.date.as_deref(), Some("2020-01-01"));
    }

    #[test]
    fn site_bounds_union_all_pushed_patches() {
        let mut catalog = Catalog::new();
        catalog.push_patch(data_patch(
            "Cropland_A_World@0_20200101.bin",
            1.0,
            5.0,
            bounds_a(),
        ));
        catalog.push_patch(data_patch(
            "TreeCover_A_World@0_20200101.bin",
            0.0,
            1.0,
            bounds_b(),
        ));

        let site = catalog.site("World").unwrap();
        assert_eq!(site.bounds, AreaBounds::new(30.0, 40.0, 0.0, 0.0));
    }

    #[test]
    fn stub_push_leaves_stats_and_site_bounds_alone() {
        let mut catalog = Catalog::new();
        catalog.push_patch(stub_patch("Cropland_A_World@0_20200101.bin"));

        let site = catalog.site("World").unwrap();
        assert!(!site.bounds.is_valid());
        assert_eq!(site.layers[0].value_range, None);
    }

    #[test]
    fn refetched_patch_overwrites_its_stub() {
        let mut catalog = Catalog::new();
        catalog.push_patch(stub_patch("Cropland_A_World@0_20200101.bin"));
        catalog.push_patch(data_patch(
            "Cropland_A_World@0_20200101.bin",
            1.0,
            5.0,
            bounds_a(),
        ));

        let (_, layer) = catalog.layers().next().unwrap();
        assert_eq!(layer.tree.len(), 1);
        assert!(layer.tree.values()[0].has_data());
    }

    #[test]
    fn same_slot_different_date_overwrites() {
        // The date stamp is not part of the identity, so a re-exported
        // file lands in the same slot.
        let mut catalog = Catalog::new();
        catalog.push_patch(data_patch(
            "Cropland_A_World@0_20200101.bin",
            1.0,
            5.0,
            bounds_a(),
        ));
        catalog.push_patch(data_patch(
            "Cropland_A_World@0_20210101.bin",
            2.0,
            6.0,
            bounds_a(),
        ));

        let (_, layer) = catalog.layers().next().unwrap();
        assert_eq!(layer.tree.len(), 1);
        assert_eq!(layer.tree.values()[0].info.date, 20210101);
        assert_eq!(layer.value_range, Some((2.0, 6.0)));
    }

    #[test]
    fn select_site_clears_other_selections() {
        let mut catalog = Catalog::new();
        catalog.push_patch(stub_patch("Cropland_A_World@0_20200101.bin"));
        catalog.push_patch(stub_patch("Cropland_A_Alps@0_20200101.bin"));

        catalog.select_site("World");
        assert!(catalog.site("World").unwrap().selected);
        assert!(!catalog.site("Alps").unwrap().selected);

        catalog.select_site("Alps");
        assert!(!catalog.site("World").unwrap().selected);
        assert!(catalog.site("Alps").unwrap().selected);
    }

    #[test]
    fn active_requires_layer_and_site_selection() {
        let mut catalog = Catalog::new();
        catalog.push_patch(stub_patch("Cropland_A_World@0_20200101.bin"));

        assert_eq!(catalog.active_layers().count(), 0);

        catalog.select_site("World");
        assert_eq!(catalog.active_layers().count(), 0);

        let probe = parse_info("Cropland_A_World@0_20200101.bin").unwrap();
        catalog.get_or_create_layer(&probe).selected = true;
        assert_eq!(catalog.active_layers().count(), 1);
    }

    #[test]
    fn reclaim_drops_data_but_keeps_index_entry() {
        let mut catalog = Catalog::new();
        let patch = data_patch("Cropland_A_World@0_20200101.bin", 1.0, 5.0, bounds_a());
        let id = patch.id();
        catalog.push_patch(patch);

        assert!(catalog.reclaim_data(&id));

        let (_, layer) = catalog.layers().next().unwrap();
        let stored = layer.tree.find(&id).unwrap();
        assert!(!stored.has_data());
        assert_eq!(stored.bounds, Some(bounds_a()));

        // Second reclaim is a no-op
        assert!(!catalog.reclaim_data(&id));
    }

    #[test]
    fn reclaim_unknown_id_is_false() {
        let mut catalog = Catalog::new();
        assert!(!catalog.reclaim_data("nope"));
    }

    #[test]
    fn layer_records_round_trip() {
        let mut catalog = Catalog::new();
        catalog.push_patch(stub_patch("Cropland_A_World@0_20200101.bin"));
        let probe = parse_info("Cropland_A_World@0_20200101.bin").unwrap();
        {
            let layer = catalog.get_or_create_layer(&probe);
            layer.filter = (0.25, 0.75);
            layer.tint = Tint::new(10, 20, 30);
        }

        let records = catalog.layer_records();
        assert_eq!(records.len(), 1);

        let mut restored = Catalog::new();
        restored.apply_layer_record(&records[0]);

        let (_, layer) = restored.layers().next().unwrap();
        assert_eq!(layer.name, "Cropland");
        assert_eq!(layer.filter, (0.25, 0.75));
        assert_eq!(layer.tint, Tint::new(10, 20, 30));
    }
}
