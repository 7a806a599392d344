//! Geographic coordinate types.
//!
//! Provides [`AreaBounds`], the lat/lon bounding box used throughout the
//! library for patch extents, index node accumulation and viewport queries.

mod bounds;

pub use bounds::AreaBounds;
