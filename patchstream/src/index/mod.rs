//! Hierarchical spatial/LOD patch index.
//!
//! One [`PatchTree`] per data layer. The tree is a 32-ary decomposition
//! rooted at level `A`: each node covers one cell of its level and holds
//! at most one patch, plus the accumulated bounds union of everything
//! inserted beneath it, so a whole subtree can be skipped during a
//! bounded-area query with a single intersection test.

mod tree;

pub use tree::{InsertError, PatchTree};
