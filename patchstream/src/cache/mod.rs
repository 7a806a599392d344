//! Render-tile cache.
//!
//! Holds recently-visible render objects that fell out of the current
//! viewport or level so they can be restored cheaply when the viewport
//! returns, instead of being rebuilt from decoded grid data.

mod tile_cache;

pub use tile_cache::{TileCache, DEFAULT_CAPACITY};
