// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element sparse property storage.
//!
//! [`PropertyStore`] holds the layers an element owns outright: local values,
//! modifier overrides, and (on inheritance boundaries) the cached inherited
//! values. Resolution across the tree lives in [`ElementTree`](crate::ElementTree).
//!
//! # Implementation
//!
//! Each layer is a vector sorted by [`PropertyId`] and searched with binary
//! search. Elements usually carry a handful of local values, so the local
//! layer is a `SmallVec` stored inline; the other layers are empty on most
//! elements and live out of line.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::entry::{EffectiveValueEntry, ValueSource};
use crate::id::PropertyId;
use crate::value::ErasedValue;

const INLINE_CAPACITY: usize = 8;

#[derive(Clone, Debug)]
struct LocalValue {
    value: ErasedValue,
    coerced: bool,
}

#[inline]
fn find<V>(entries: &[(PropertyId, V)], id: PropertyId) -> Result<usize, usize> {
    entries.binary_search_by_key(&id, |(pid, _)| *pid)
}

/// Sparse storage for the values one element owns.
#[derive(Clone, Debug, Default)]
pub struct PropertyStore {
    local: SmallVec<[(PropertyId, LocalValue); INLINE_CAPACITY]>,
    modified: Vec<(PropertyId, ErasedValue)>,
    inherited_cache: Vec<(PropertyId, EffectiveValueEntry)>,
}

impl PropertyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the element owns no local or modified values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local.is_empty() && self.modified.is_empty()
    }

    /// Returns the ids that carry a local or modified value, sorted and deduplicated.
    #[must_use]
    pub fn property_ids(&self) -> Vec<PropertyId> {
        let mut ids: Vec<_> = self
            .local
            .iter()
            .map(|(id, _)| *id)
            .chain(self.modified.iter().map(|(id, _)| *id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Returns the local value for `id`.
    #[must_use]
    pub fn local(&self, id: PropertyId) -> Option<&ErasedValue> {
        find(&self.local, id).ok().map(|idx| &self.local[idx].1.value)
    }

    /// Stores a local value. `coerced` records whether coercion changed it.
    pub fn set_local(&mut self, id: PropertyId, value: ErasedValue, coerced: bool) {
        let slot = LocalValue { value, coerced };
        match find(&self.local, id) {
            Ok(idx) => self.local[idx].1 = slot,
            Err(idx) => self.local.insert(idx, (id, slot)),
        }
    }

    /// Removes the local value. Returns `true` if one was present.
    pub fn clear_local(&mut self, id: PropertyId) -> bool {
        if let Ok(idx) = find(&self.local, id) {
            self.local.remove(idx);
            true
        } else {
            false
        }
    }

    /// Returns the modifier override for `id`.
    #[must_use]
    pub fn modified(&self, id: PropertyId) -> Option<&ErasedValue> {
        find(&self.modified, id)
            .ok()
            .map(|idx| &self.modified[idx].1)
    }

    /// Stores a modifier override.
    pub fn set_modified(&mut self, id: PropertyId, value: ErasedValue) {
        match find(&self.modified, id) {
            Ok(idx) => self.modified[idx].1 = value,
            Err(idx) => self.modified.insert(idx, (id, value)),
        }
    }

    /// Removes the modifier override. Returns `true` if one was present.
    pub fn clear_modified(&mut self, id: PropertyId) -> bool {
        if let Ok(idx) = find(&self.modified, id) {
            self.modified.remove(idx);
            true
        } else {
            false
        }
    }

    /// Returns `true` if the element has a local or modified value for `id`.
    #[must_use]
    pub fn has_own_value(&self, id: PropertyId) -> bool {
        find(&self.modified, id).is_ok() || find(&self.local, id).is_ok()
    }

    /// Returns the entry produced by the element's own layers, if any.
    ///
    /// Modified values win over local ones.
    #[must_use]
    pub fn own_entry(&self, id: PropertyId) -> Option<EffectiveValueEntry> {
        if let Some(value) = self.modified(id) {
            return Some(
                EffectiveValueEntry::new(id, value.clone(), ValueSource::Modified)
                    .with_modifiers(true),
            );
        }
        let idx = find(&self.local, id).ok()?;
        let LocalValue { value, coerced } = &self.local[idx].1;
        Some(EffectiveValueEntry::new(id, value.clone(), ValueSource::Local).with_modifiers(*coerced))
    }

    /// Returns the cached inherited entry for `id`.
    ///
    /// Only inheritance boundaries populate this cache.
    #[must_use]
    pub fn cached_inherited(&self, id: PropertyId) -> Option<&EffectiveValueEntry> {
        find(&self.inherited_cache, id)
            .ok()
            .map(|idx| &self.inherited_cache[idx].1)
    }

    /// Replaces the cached inherited entry for `id`. `None` removes it.
    pub fn set_cached_inherited(&mut self, id: PropertyId, entry: Option<EffectiveValueEntry>) {
        match (find(&self.inherited_cache, id), entry) {
            (Ok(idx), Some(entry)) => self.inherited_cache[idx].1 = entry,
            (Err(idx), Some(entry)) => self.inherited_cache.insert(idx, (id, entry)),
            (Ok(idx), None) => {
                self.inherited_cache.remove(idx);
            }
            (Err(_), None) => {}
        }
    }

    /// Drops every cached inherited entry.
    pub fn clear_inherited_cache(&mut self) {
        self.inherited_cache.clear();
    }
}
