//! Fixed-capacity LRU cache keyed by patch identity.

use std::collections::HashMap;

use tracing::debug;

use crate::patch::PatchId;

/// Default number of render objects retained.
pub const DEFAULT_CAPACITY: usize = 100;

/// Disposal callback invoked with each evicted entry.
///
/// Releasing whatever the render object holds (GPU buffers, textures) is
/// the caller's responsibility; the cache only reports the eviction.
type DisposeFn<T> = Box<dyn FnMut(&PatchId, &T) + Send>;

struct Entry<T> {
    value: T,
    last_used: u64,
}

/// Bounded least-recently-used cache for render objects.
///
/// Capacity is fixed at construction. Inserting beyond capacity evicts
/// the least-recently-touched entry and invokes the disposal callback;
/// `get` and `insert` both count as touches.
pub struct TileCache<T> {
    capacity: usize,
    entries: HashMap<PatchId, Entry<T>>,
    tick: u64,
    dispose: Option<DisposeFn<T>>,
}

impl<T> TileCache<T> {
    /// Create a cache holding up to `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            tick: 0,
            dispose: None,
        }
    }

    /// Create a cache with the default capacity.
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Attach a disposal callback invoked for every evicted entry.
    pub fn with_dispose(mut self, dispose: impl FnMut(&PatchId, &T) + Send + 'static) -> Self {
        self.dispose = Some(Box::new(dispose));
        self
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `id` is cached. Does not touch recency.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Look up an entry, marking it most recently used.
    pub fn get(&mut self, id: &str) -> Option<&T> {
        self.tick += 1;
        let tick = self.tick;
        self.entries.get_mut(id).map(|entry| {
            entry.last_used = tick;
            &entry.value
        })
    }

    /// Remove and return an entry without invoking disposal.
    ///
    /// Used to promote a cached render object back into the visible set.
    pub fn take(&mut self, id: &str) -> Option<T> {
        self.entries.remove(id).map(|entry| entry.value)
    }

    /// Insert an entry, marking it most recently used.
    ///
    /// Replacing an existing key never evicts. Growing past capacity
    /// evicts exactly one entry, the least-recently-touched, and hands
    /// it to the disposal callback.
    pub fn insert(&mut self, id: PatchId, value: T) {
        self.tick += 1;
        let tick = self.tick;

        if let Some(entry) = self.entries.get_mut(&id) {
            entry.value = value;
            entry.last_used = tick;
            return;
        }

        if self.entries.len() >= self.capacity {
            self.evict_lru();
        }

        self.entries.insert(
            id,
            Entry {
                value,
                last_used: tick,
            },
        );
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(id, _)| id.clone());

        if let Some(id) = oldest {
            if let Some(entry) = self.entries.remove(&id) {
                debug!(patch = %id, "evicting render object");
                if let Some(dispose) = &mut self.dispose {
                    dispose(&id, &entry.value);
                }
            }
        }
    }
}
