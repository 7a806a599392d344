//! 32-ary level/spatial tree.

use thiserror::Error;

use crate::coord::AreaBounds;
use crate::patch::{Patch, PatchId, PatchLevel, CHILDREN_PER_LEVEL};

/// Two different patch identities claimed the same tree slot.
///
/// The existing occupant is kept and the insert is dropped; callers log
/// the conflict rather than abort.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tree slot at level {level} held by {occupant}, rejected insert of {rejected}")]
pub struct InsertError {
    /// Level of the contested slot.
    pub level: PatchLevel,
    /// Identity already bound to the slot.
    pub occupant: PatchId,
    /// Identity whose insert was dropped.
    pub rejected: PatchId,
}

struct PatchNode {
    level: PatchLevel,
    patch: Option<Patch>,
    /// Union of every bounds inserted at or beneath this node.
    bounds: AreaBounds,
    children: [Option<Box<PatchNode>>; CHILDREN_PER_LEVEL as usize],
}

impl PatchNode {
    fn new(level: PatchLevel) -> Self {
        Self {
            level,
            patch: None,
            bounds: AreaBounds::empty(),
            children: std::array::from_fn(|_| None),
        }
    }

    /// Child slot for a patch at `level`/`index` beneath this node.
    ///
    /// Direct address decomposition: the ancestor of the patch at this
    /// node's child level has level-global index `index / 32^(Δ-1)`;
    /// `mod 32` selects its slot among this node's children.
    fn child_slot(&self, level: PatchLevel, index: u32) -> usize {
        let delta = u32::from(level.ordinal() - self.level.ordinal());
        let divisor = CHILDREN_PER_LEVEL.pow(delta - 1);
        ((index / divisor) % CHILDREN_PER_LEVEL) as usize
    }
}

/// Per-layer spatial index over patches, keyed by level and patch index.
///
/// Supports insertion and bounded-area queries with level fallback; there
/// is no delete operation, and accumulated node bounds only ever grow.
pub struct PatchTree {
    root: PatchNode,
}

impl PatchTree {
    /// Create an empty tree rooted at level `A`.
    pub fn new() -> Self {
        Self {
            root: PatchNode::new(PatchLevel::A),
        }
    }

    /// Insert a patch at the slot addressed by its level and index.
    ///
    /// Re-inserting the same identity overwrites the slot (the usual path
    /// when a data-less patch is replaced by its fetched form); bounds
    /// accumulated on the path only grow. A different identity in the
    /// slot is a [`InsertError`] and leaves the tree untouched.
    pub fn insert(&mut self, patch: Patch) -> Result<(), InsertError> {
        let level = patch.info.level;
        let index = patch.info.index;

        // Conflict check before any bounds are unioned, so a rejected
        // insert cannot widen ancestor bounds.
        if let Some(existing) = self.slot(level, index) {
            if existing.id() != patch.id() {
                return Err(InsertError {
                    level,
                    occupant: existing.id(),
                    rejected: patch.id(),
                });
            }
        }

        let mut node = &mut self.root;
        loop {
            if let Some(bounds) = &patch.bounds {
                node.bounds.add(bounds);
            }

            if node.level == level {
                node.patch = Some(patch);
                return Ok(());
            }

            let slot = node.child_slot(level, index);
            let child_level = node
                .level
                .finer()
                .expect("nodes coarser than the patch level have a finer level");
            node = node.children[slot]
                .get_or_insert_with(|| Box::new(PatchNode::new(child_level)));
        }
    }

    /// The patch currently bound at the slot for `level`/`index`, if any.
    fn slot(&self, level: PatchLevel, index: u32) -> Option<&Patch> {
        let mut node = &self.root;
        while node.level != level {
            let slot = node.child_slot(level, index);
            node = node.children[slot].as_deref()?;
        }
        node.patch.as_ref()
    }

    /// All patches intersecting `bounds`, preferring the requested level.
    ///
    /// Depth-first over nodes whose accumulated bounds intersect the
    /// query. A node at or finer than the requested level holding an
    /// intersecting patch emits that patch and ends its subtree, so at
    /// most one patch per occupied slot is visited. When the traversal yields
    /// nothing and a coarser level exists, the query retries one level
    /// coarser: render something rather than nothing when fine data is
    /// missing. Empty only when no bounds intersect at any level.
    pub fn query_area(&self, bounds: &AreaBounds, level: PatchLevel) -> Vec<&Patch> {
        let mut found = Vec::new();
        collect_area(&self.root, bounds, level, &mut found);

        if found.is_empty() {
            if let Some(coarser) = level.coarser() {
                return self.query_area(bounds, coarser);
            }
        }

        found
    }

    /// Every patch bound anywhere in the tree.
    ///
    /// Used for aggregate statistics and loaded-state checks.
    pub fn values(&self) -> Vec<&Patch> {
        let mut found = Vec::new();
        collect_all(&self.root, &mut found);
        found
    }

    /// Number of patches bound in the tree.
    pub fn len(&self) -> usize {
        self.values().len()
    }

    /// Whether the tree holds no patches.
    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    /// Find a patch by identity.
    pub fn find(&self, id: &str) -> Option<&Patch> {
        self.values().into_iter().find(|patch| patch.id() == id)
    }

    /// Find a patch by identity for in-place mutation (data reclaim).
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Patch> {
        find_node_mut(&mut self.root, id).and_then(|node| node.patch.as_mut())
    }
}

impl Default for PatchTree {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_area<'a>(
    node: &'a PatchNode,
    bounds: &AreaBounds,
    level: PatchLevel,
    out: &mut Vec<&'a Patch>,
) {
    if !node.bounds.intersects(bounds) {
        return;
    }

    if node.level >= level {
        if let Some(patch) = &node.patch {
            let intersects = patch
                .bounds
                .as_ref()
                .is_some_and(|patch_bounds| patch_bounds.intersects(bounds));
            if intersects {
                out.push(patch);
                return;
            }
        }
    }

    for child in node.children.iter().flatten() {
        collect_area(child, bounds, level, out);
    }
}

fn collect_all<'a>(node: &'a PatchNode, out: &mut Vec<&'a Patch>) {
    if let Some(patch) = &node.patch {
        out.push(patch);
    }
    for child in node.children.iter().flatten() {
        collect_all(child, out);
    }
}

fn find_node_mut<'a>(node: &'a mut PatchNode, id: &str) -> Option<&'a mut PatchNode> {
    if node
        .patch
        .as_ref()
        .is_some_and(|patch| patch.id() == id)
    {
        return Some(node);
    }
    for child in node.children.iter_mut().flatten() {
        if let Some(found) = find_node_mut(child, id) {
            return Some(found);
        }
    }
    None
}
