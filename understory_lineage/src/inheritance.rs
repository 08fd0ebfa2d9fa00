// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inheritance context: which element supplies an element's inherited values.
//!
//! An element is a *self-inheritance parent* when it is a root or when an
//! [`InheritanceBehavior`](crate::InheritanceBehavior) boundary separates it
//! from its parent. Such an element keeps its inherited values in its own
//! store: nothing for ordinary properties, and the parent's current value for
//! properties flagged `OVERRIDES_INHERITANCE_BEHAVIOR`. Every other element
//! links to its nearest self-inheritance-parent ancestor and reads through it.

use crate::element::ElementId;
use crate::entry::EffectiveValueEntry;
use crate::id::PropertyId;
use crate::tree::ElementTree;

impl ElementTree {
    /// Returns `true` if a boundary stops `id` from inheriting from its parent.
    ///
    /// That is the case when `id` itself skips its parent (`*Next`) or its
    /// parent hides itself from its children (`*Now`). Roots are never blocked.
    #[must_use]
    pub fn is_inheritance_blocked(&self, id: ElementId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        let Some(parent) = element.parent.and_then(|p| self.element(p)) else {
            return false;
        };
        element.flags.inheritance_behavior.skips_next()
            || parent.flags.inheritance_behavior.skips_now()
    }

    /// Returns `true` if `id` caches its inheritable values itself.
    #[must_use]
    pub fn is_self_inheritance_parent(&self, id: ElementId) -> bool {
        self.element(id)
            .is_some_and(|e| e.flags.is_self_inheritance_parent)
    }

    /// Returns the nearest self-inheritance-parent ancestor `id` reads through.
    ///
    /// `None` for self-inheritance parents themselves.
    #[must_use]
    pub fn inheritance_parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id)?.inheritance_parent
    }

    /// Decides whether `id` is a boundary and refreshes what it inherits from.
    ///
    /// A boundary snapshots the values it may still receive from its parent;
    /// any other element drops its cache and links to the nearest boundary
    /// above it.
    pub(crate) fn synchronize_inheritance_parent(&mut self, id: ElementId) {
        let Some(element) = self.element(id) else {
            return;
        };
        let parent = element.parent;
        let boundary = parent.is_none() || self.is_inheritance_blocked(id);

        let link = if boundary {
            None
        } else {
            let mut current = parent;
            while let Some(ancestor) = current
                && let Some(e) = self.element(ancestor)
                && !e.flags.is_self_inheritance_parent
            {
                current = e.parent;
            }
            current
        };

        let registry = self.registry.clone();
        let mut cache = alloc::vec::Vec::new();
        if boundary && let Some(parent) = parent {
            for descriptor in registry
                .inheritable()
                .iter()
                .filter_map(|p| registry.descriptor(*p))
                .filter(|d| d.overrides_inheritance_behavior())
            {
                cache.push((descriptor.id(), self.inherited_from(parent, descriptor.id())));
            }
        }

        let Some(element) = self.element_mut(id) else {
            return;
        };
        element.flags.is_self_inheritance_parent = boundary;
        element.inheritance_parent = link;
        element.store.clear_inherited_cache();
        for (property, entry) in cache {
            element.store.set_cached_inherited(property, entry);
        }
    }

    /// Returns what `id` inherits for `property`, or `None` for the default.
    pub(crate) fn inherited_entry(
        &self,
        id: ElementId,
        property: PropertyId,
    ) -> Option<EffectiveValueEntry> {
        let element = self.element(id)?;
        if element.flags.is_self_inheritance_parent {
            return element.store.cached_inherited(property).cloned();
        }
        self.inherited_from(element.parent?, property)
    }

    /// Returns what a child of `parent` sees for `property`, ignoring boundaries
    /// between `parent` and that child.
    pub(crate) fn inherited_from(
        &self,
        parent: ElementId,
        property: PropertyId,
    ) -> Option<EffectiveValueEntry> {
        let mut current = parent;
        loop {
            let element = self.element(current)?;
            if let Some(own) = element.store.own_entry(property) {
                return Some(own.as_inherited());
            }
            if element.flags.is_self_inheritance_parent {
                return element.store.cached_inherited(property).cloned();
            }
            current = element.parent?;
        }
    }
}
