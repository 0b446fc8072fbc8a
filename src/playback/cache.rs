use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::assets::decode::DecodedImage;
use crate::foundation::core::FrameIndex;

/// Cache shared between the playback loop and in-flight prefetch batches.
pub type SharedCache = Arc<Mutex<FrameCache>>;

/// Decoded frames keyed by index.
///
/// Lookups never load anything; filling the cache is the prefetcher's job.
#[derive(Debug, Default)]
pub struct FrameCache {
    frames: BTreeMap<FrameIndex, DecodedImage>,
}

impl FrameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh cache wrapped for sharing with prefetch tasks.
    pub fn shared() -> SharedCache {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn has(&self, index: FrameIndex) -> bool {
        self.frames.contains_key(&index)
    }

    pub fn get(&self, index: FrameIndex) -> Option<&DecodedImage> {
        self.frames.get(&index)
    }

    /// Insert `image` for `index`. An already cached frame is kept as is; returns whether the
    /// image was inserted.
    pub fn put(&mut self, index: FrameIndex, image: DecodedImage) -> bool {
        match self.frames.entry(index) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(image);
                true
            }
        }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Cached indices in ascending order.
    pub fn indices(&self) -> Vec<FrameIndex> {
        self.frames.keys().copied().collect()
    }
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
