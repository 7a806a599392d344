//! Binary grid format.
//!
//! Patches travel as a compact little-endian binary format: a fixed
//! header (magic token, version, bounds, value range, cell counts), a
//! string table section (units, metadata, categories) and an optional
//! payload section (row-major f32 values, a cell mask and a distribution
//! table). [`decode`] turns those bytes into a [`GridData`] record;
//! [`encode`] writes one back out for the local persistent store.
//!
//! Masked-out cells are rewritten to a no-data sentinel chosen strictly
//! below the header minimum (`floor(min) - 1`) so the renderer can
//! discriminate them without a separate mask array.

mod codec;
mod data;
mod error;
mod reader;
mod writer;

pub use codec::{decode, encode, GRID_TOKEN, GRID_VERSION};
pub use data::GridData;
pub use error::DecodeError;
pub use reader::BinaryReader;
pub use writer::BinaryWriter;
