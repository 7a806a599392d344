//! Decoded grid record.

use std::collections::HashMap;

use crate::coord::AreaBounds;

/// A decoded grid of `count_x` × `count_y` cells in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct GridData {
    /// String-keyed metadata from the file, including `"units"`.
    pub metadata: HashMap<String, String>,
    /// Geographic extent of the grid.
    pub bounds: AreaBounds,
    /// Cell values, row-major; empty when decoded without payload.
    pub values: Vec<f32>,
    /// No-data sentinel present in `values` when the file carried a mask.
    pub no_data: Option<f32>,
    /// Cells per row.
    pub count_x: u32,
    /// Rows.
    pub count_y: u32,
    /// Minimum value declared by the header.
    pub min_value: f32,
    /// Maximum value declared by the header.
    pub max_value: f32,
}

impl GridData {
    /// Number of cells the payload declares.
    pub fn cell_count(&self) -> usize {
        self.count_x as usize * self.count_y as usize
    }

    /// Units string, if the file declared one.
    pub fn units(&self) -> Option<&str> {
        self.metadata.get("units").map(String::as_str)
    }
}
