//! Stable integer ids for live host objects.
//!
//! Each registry owns both directions of the mapping and mints ids from a
//! counter. A registry created with a root handle reserves [`ROOT_ID`] for
//! it; the root is answered without a map lookup. `reset` drops every entry
//! and starts a new generation. The counter is not rewound, so ids from
//! before the reset never resolve to an object of a later generation.

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

/// Id reserved for the root document.
pub const ROOT_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no host object to identify")]
    InvalidReference,
    #[error("unknown id {0}")]
    UnknownId(u32),
}

#[derive(Debug, Clone)]
pub struct IdentityRegistry<H> {
    by_handle: FxHashMap<H, u32>,
    by_id: FxHashMap<u32, H>,
    root: Option<H>,
    next_id: u32,
    generation: u64,
}

impl<H> Default for IdentityRegistry<H>
where
    H: Copy + Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H> IdentityRegistry<H>
where
    H: Copy + Eq + Hash + fmt::Debug,
{
    /// Registry without a reserved root; ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_handle: FxHashMap::default(),
            by_id: FxHashMap::default(),
            root: None,
            next_id: 1,
            generation: 0,
        }
    }

    /// Registry whose `root` always resolves to [`ROOT_ID`].
    #[must_use]
    pub fn with_root(root: H) -> Self {
        Self {
            root: Some(root),
            next_id: ROOT_ID + 1,
            ..Self::new()
        }
    }

    /// Id for `handle`, minting one on first sight.
    pub fn id_for(&mut self, handle: Option<H>) -> Result<u32, RegistryError> {
        let handle = handle.ok_or(RegistryError::InvalidReference)?;
        if self.root == Some(handle) {
            return Ok(ROOT_ID);
        }
        if let Some(id) = self.by_handle.get(&handle) {
            return Ok(*id);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.by_handle.insert(handle, id);
        self.by_id.insert(id, handle);
        debug!(id, ?handle, generation = self.generation, "minted id");
        Ok(id)
    }

    /// Existing id for `handle` without minting.
    #[must_use]
    pub fn get(&self, handle: H) -> Option<u32> {
        if self.root == Some(handle) {
            return Some(ROOT_ID);
        }
        self.by_handle.get(&handle).copied()
    }

    pub fn resolve(&self, id: u32) -> Result<H, RegistryError> {
        if id == ROOT_ID {
            if let Some(root) = self.root {
                return Ok(root);
            }
        }
        self.by_id
            .get(&id)
            .copied()
            .ok_or(RegistryError::UnknownId(id))
    }

    #[must_use]
    pub fn contains_handle(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    /// Forget every entry and start a new generation. Minting continues
    /// from the next free id.
    pub fn reset(&mut self) {
        debug!(
            generation = self.generation,
            entries = self.by_id.len(),
            next_id = self.next_id,
            "registry reset"
        );
        self.by_handle.clear();
        self.by_id.clear();
        self.generation += 1;
    }

    /// Reset and install a new root handle.
    pub fn reset_with_root(&mut self, root: H) {
        self.reset();
        self.root = Some(root);
    }

    /// Minted ids in ascending order, the root first when present.
    #[cfg(test)]
    pub(crate) fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        if self.root.is_some() {
            ids.insert(0, ROOT_ID);
        }
        ids
    }

    /// Minted `(id, handle)` pairs in ascending id order, root excluded.
    #[must_use]
    pub fn entries(&self) -> Vec<(u32, H)> {
        let mut entries: Vec<(u32, H)> = self.by_id.iter().map(|(id, h)| (*id, *h)).collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        entries
    }

    /// Drop entries whose handle fails `is_live`; returns the dropped ids.
    pub fn retain_live(&mut self, mut is_live: impl FnMut(H) -> bool) -> Vec<u32> {
        let dead: Vec<u32> = self
            .entries()
            .into_iter()
            .filter(|(_, handle)| !is_live(*handle))
            .map(|(id, _)| id)
            .collect();
        for id in &dead {
            if let Some(handle) = self.by_id.remove(id) {
                self.by_handle.remove(&handle);
            }
        }
        dead
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len() + usize::from(self.root.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
