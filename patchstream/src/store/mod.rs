//! Patch load pipeline.
//!
//! Orchestrates fetches from the registered sources into the catalog.
//! Startup runs two passes over every source: a lightweight preload
//! (`include_data = false`) that registers bounds-only patches so the
//! spatial index exists before any payload arrives, then a full load.
//! Both passes run concurrently across sources; within a single source,
//! requests are issued sequentially to avoid overwhelming it.
//!
//! On-demand fetches triggered by the viewport are deduplicated per
//! filename: repeated requests while one is in flight are no-ops, which
//! keeps viewport panning from multiplying identical downloads. An
//! in-flight fetch always runs to completion; there is no cancellation
//! and no retry. Failures are logged and the marker cleared, so a later
//! viewport revisit simply re-attempts.

mod patch_store;

pub use patch_store::PatchStore;
