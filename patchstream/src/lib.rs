//! Patchstream - geospatial raster patch streaming.
//!
//! Ingests gridded raster "patches" from multiple heterogeneous sources,
//! indexes them spatially and by level-of-detail, decodes the compact
//! binary grid format, and serves level-appropriate subsets to a
//! renderer on demand, caching and evicting render-ready objects under
//! memory pressure.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified
//! facade:
//!
//! ```ignore
//! use patchstream::config::ServiceConfig;
//! use patchstream::controller::MapState;
//! use patchstream::service::PatchService;
//!
//! let config = ServiceConfig::new().with_data_url("https://example.org/data");
//! let service = PatchService::new(config, renderer_factory)?;
//! service.init().await;
//! service.on_viewport(&MapState::new(zoom, bounds))?;
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod coord;
pub mod grid;
pub mod index;
pub mod logging;
pub mod patch;
pub mod service;
pub mod source;
pub mod store;

/// Version of the patchstream library and CLI.
///
/// Synchronized across the workspace; defined in `Cargo.toml` and
/// injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
