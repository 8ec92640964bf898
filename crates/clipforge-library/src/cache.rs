//! Thumbnail cache keyed by asset locator.

use crate::acquire::Thumbnail;
use std::collections::HashMap;

/// Rendered thumbnails by source locator. Absence means not generated yet.
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: HashMap<String, Thumbnail>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, locator: &str) -> Option<&Thumbnail> {
        self.entries.get(locator)
    }

    pub fn contains(&self, locator: &str) -> bool {
        self.entries.contains_key(locator)
    }

    /// Insert or replace the entry for `locator`.
    pub fn insert(&mut self, locator: impl Into<String>, thumbnail: Thumbnail) {
        self.entries.insert(locator.into(), thumbnail);
    }

    /// Remove the entry for `locator`, returning it.
    pub fn evict(&mut self, locator: &str) -> Option<Thumbnail> {
        self.entries.remove(locator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
