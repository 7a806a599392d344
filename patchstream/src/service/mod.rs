//! High-level service facade.
//!
//! Wires the standard component stack together: a source registry
//! (local store, in-memory store, optional remote static provider), the
//! shared catalog, the load pipeline and the map update controller.
//! Embedders that need a different wiring can assemble the parts
//! directly; the facade covers the common case.

mod facade;

pub use facade::{PatchService, ServiceError};
