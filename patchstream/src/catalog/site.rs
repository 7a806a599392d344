//! Geographic site grouping.

use crate::coord::AreaBounds;

use super::layer::DataLayer;

/// A named geographic grouping of data layers.
///
/// The site's bounds accumulate the union of every patch ever pushed to
/// any of its layers, which is what viewport fitting zooms to.
pub struct Site {
    /// Site name (e.g. "World").
    pub name: String,
    /// Union of all pushed patch bounds.
    pub bounds: AreaBounds,
    /// Layers scoped to this site.
    pub layers: Vec<DataLayer>,
    /// Whether this site is the primary selection target.
    pub selected: bool,
}

impl Site {
    /// Create an empty, unselected site.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: AreaBounds::empty(),
            layers: Vec::new(),
            selected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_site_has_empty_bounds() {
        let site = Site::new("World");
        assert_eq!(site.name, "World");
        assert!(!site.bounds.is_valid());
        assert!(site.layers.is_empty());
        assert!(!site.selected);
    }
}
