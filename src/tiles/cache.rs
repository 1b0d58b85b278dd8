//! Decoded-tile cache with plan-protected eviction and cross-level
//! fallback lookup.

use crate::prelude::{HashMap, HashSet};
use crate::pyramid::{LevelId, Pyramid};
use crate::tiles::source::TilePixels;
use crate::tiles::types::TileId;
use crate::tiles::TileKey;
use std::collections::VecDeque;
use std::sync::Arc;

/// Keyed store of decoded tiles.
///
/// Capacity is a soft bound: eviction removes the oldest inserted entries
/// first but never touches a key protected by the current plan, so the
/// cache can exceed capacity while an oversized plan is active.
#[derive(Debug)]
pub struct TileCache {
    entries: HashMap<TileKey, Arc<TilePixels>>,
    insertion_order: VecDeque<TileKey>,
    protected: HashSet<TileKey>,
    capacity: usize,
}

impl TileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::default(),
            insertion_order: VecDeque::new(),
            protected: HashSet::default(),
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &TileKey) -> Option<Arc<TilePixels>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: TileKey, pixels: TilePixels) {
        if self.entries.insert(key, Arc::new(pixels)).is_none() {
            self.insertion_order.push_back(key);
        }
        self.evict_excess();
    }

    /// Replace the protected set with the given keys. Protected keys are
    /// exempt from eviction until the next plan replaces them.
    pub fn protect(&mut self, keys: impl IntoIterator<Item = TileKey>) {
        self.protected.clear();
        self.protected.extend(keys);
    }

    /// A cached stand-in for `tile` from another level, searched in the
    /// pyramid's fixed preference order.
    pub fn fallback(
        &self,
        tile: TileId,
        selected: LevelId,
        pyramid: &Pyramid,
    ) -> Option<(LevelId, Arc<TilePixels>)> {
        pyramid.fallback_order(selected).find_map(|level| {
            self.entries
                .get(&(level, tile))
                .map(|pixels| (level, pixels.clone()))
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
        self.protected.clear();
    }

    fn evict_excess(&mut self) {
        while self.entries.len() > self.capacity {
            let mut evicted = false;
            let mut index = 0;
            while index < self.insertion_order.len() {
                let key = self.insertion_order[index];
                if !self.entries.contains_key(&key) {
                    // Stale order entry from a replaced key.
                    self.insertion_order.remove(index);
                    continue;
                }
                if self.protected.contains(&key) {
                    index += 1;
                    continue;
                }
                self.insertion_order.remove(index);
                self.entries.remove(&key);
                evicted = true;
                break;
            }
            if !evicted {
                // Everything is protected by the current plan.
                break;
            }
        }
    }
}
