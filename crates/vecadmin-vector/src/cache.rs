//! Collection name -> id mapping
//!
//! Collections are addressed by name but every content call needs the
//! server-side id. Entries live as long as the owning client and have no
//! TTL: a collection renamed or recreated out-of-band stays stale until it
//! is invalidated, the cache is refreshed, or the client is dropped.

use std::collections::HashMap;

/// Per-client mapping from collection name to opaque id
///
/// Not synchronized; each session owns its client and therefore its cache.
#[derive(Debug, Clone, Default)]
pub struct CollectionIdCache {
    ids: HashMap<String, String>,
}

impl CollectionIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached id for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }

    /// Remember (or overwrite) the id for `name`
    pub fn insert(&mut self, name: impl Into<String>, id: impl Into<String>) {
        self.ids.insert(name.into(), id.into());
    }

    /// Forget `name`; returns the evicted id
    pub fn invalidate(&mut self, name: &str) -> Option<String> {
        self.ids.remove(name)
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Replace the whole mapping with a fresh listing
    pub fn replace_all<I, N, D>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<String>,
    {
        self.ids = entries
            .into_iter()
            .map(|(name, id)| (name.into(), id.into()))
            .collect();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
