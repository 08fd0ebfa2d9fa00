// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree walks that keep inherited values current.
//!
//! Two walks exist:
//!
//! - The **ancestor-change walk** runs when an element's parent (or its
//!   inheritance behavior) changes. It visits the element and its
//!   descendants in pre-order. Each visited element recomputes only the
//!   inheritable properties its parent reported as changed, then hands its
//!   own changes to its children through a stack of frames.
//! - The **property-change walk** runs when an inheritable property changes
//!   on one element. It descends only through children that inherit the
//!   property and whose effective value actually changed.
//!
//! Walks requested while another walk is running (from a change callback or
//! a hook) are queued and run before the outermost call returns. A queued
//! walk compares each element against the entry it was last notified with
//! in the same outermost walk, so no element hears a change twice.

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::element::ElementId;
use crate::entry::EffectiveValueEntry;
use crate::id::PropertyId;
use crate::tree::ElementTree;

/// An inheritable property whose effective value changed on one element.
#[derive(Clone, Debug, PartialEq)]
pub struct InheritablePropertyChange {
    /// The property that changed.
    pub property: PropertyId,
    /// The entry before the change.
    pub old: EffectiveValueEntry,
    /// The entry after the change.
    pub new: EffectiveValueEntry,
}

#[derive(Debug)]
pub(crate) struct PendingPropagation {
    element: ElementId,
    change: InheritablePropertyChange,
    include_start_node: bool,
}

/// State for one ancestor-change walk.
#[derive(Debug)]
struct TreeChangeInfo {
    root: ElementId,
    is_add_operation: bool,
    topmost_collapsed_parent_node: Option<ElementId>,
    inheritable_properties_stack: Vec<Vec<InheritablePropertyChange>>,
}

type Snapshot = Vec<(PropertyId, EffectiveValueEntry)>;

impl ElementTree {
    /// Captures the inheritable values of `id` that come from outside it.
    ///
    /// Properties with an own value are left out since a tree change cannot
    /// affect them.
    pub(crate) fn inheritable_snapshot(&self, id: ElementId) -> Snapshot {
        let Some(element) = self.element(id) else {
            return Vec::new();
        };
        self.registry
            .inheritable()
            .iter()
            .filter(|p| !element.store.has_own_value(**p))
            .filter_map(|p| self.registry.descriptor(*p))
            .map(|d| (d.id(), self.effective_entry(id, d)))
            .collect()
    }

    /// Re-runs the ancestor-change walk for `id` without changing the tree.
    ///
    /// Hooks and listeners fire as for a real change; inherited values that
    /// are already current produce no notifications.
    pub fn invalidate_on_tree_change(&mut self, id: ElementId) {
        if !self.contains(id) {
            return;
        }
        let snapshot = self.inheritable_snapshot(id);
        let is_add = self.parent(id).is_some();
        self.run_tree_change(id, snapshot, is_add);
    }

    /// Runs the ancestor-change walk rooted at `root`.
    ///
    /// `snapshot` holds `root`'s inheritable values from before the change.
    pub(crate) fn run_tree_change(&mut self, root: ElementId, snapshot: Snapshot, is_add: bool) {
        let topmost_collapsed_parent_node = self.topmost_collapsed_ancestor(root);
        let mut info = TreeChangeInfo {
            root,
            is_add_operation: is_add,
            topmost_collapsed_parent_node,
            inheritable_properties_stack: Vec::new(),
        };
        tracing::debug!(
            %root,
            is_add,
            collapsed = topmost_collapsed_parent_node.is_some(),
            "ancestor-change walk"
        );

        let in_collapsed = info.topmost_collapsed_parent_node.is_some();
        self.walk_depth += 1;
        self.on_ancestor_changed_internal(root, &mut info, Some(snapshot), in_collapsed);
        self.walk_depth -= 1;
        self.drain_pending();
    }

    fn topmost_collapsed_ancestor(&self, id: ElementId) -> Option<ElementId> {
        let mut topmost = None;
        let mut current = self.parent(id);
        while let Some(ancestor) = current {
            let Some(element) = self.element(ancestor) else {
                break;
            };
            if element.flags.collapsed {
                topmost = Some(ancestor);
            }
            current = element.parent;
        }
        topmost
    }

    fn on_ancestor_changed_internal(
        &mut self,
        id: ElementId,
        info: &mut TreeChangeInfo,
        root_snapshot: Option<Snapshot>,
        in_collapsed: bool,
    ) {
        let Some(element) = self.element(id) else {
            return;
        };
        let in_progress = element.flags.ancestor_change_in_progress;
        debug_assert!(!in_progress, "re-entrant ancestor-change walk on {id}");
        if in_progress {
            tracing::warn!(%id, "ancestor-change walk re-entered an element mid-walk; skipping");
            return;
        }

        let was_self_inheritance_parent = element.flags.is_self_inheritance_parent;
        let parent = element.parent;
        let behavior = element.flags.inheritance_behavior;
        let in_collapsed = in_collapsed || element.flags.collapsed;

        if info.is_add_operation
            && let Some(parent) = parent
            && self
                .element(parent)
                .is_some_and(|p| p.flags.should_lookup_implicit_styles)
            && let Some(element) = self.element_mut(id)
        {
            element.flags.should_lookup_implicit_styles = true;
        }

        let frame = self.invalidate_tree_dependent_properties(id, info, root_snapshot, in_collapsed);
        tracing::trace!(
            %id,
            was_self_inheritance_parent,
            is_self_inheritance_parent = self.is_self_inheritance_parent(id),
            changed = frame.len(),
            "visited"
        );

        if let Some(hooks) = self.element(id).and_then(|e| e.hooks.clone()) {
            hooks.on_ancestor_changed(self, id);
        }
        for mentee in self.live_mentees(id) {
            mentee.resources_changed(id);
        }

        if id != info.root && behavior.skips_next() && frame.is_empty() {
            return;
        }

        let children: SmallVec<[ElementId; 8]> = SmallVec::from_slice(self.children(id));
        info.inheritable_properties_stack.push(frame);
        for child in children {
            if self.parent(child) == Some(id) {
                self.on_ancestor_changed_internal(child, info, None, in_collapsed);
            }
        }
        info.inheritable_properties_stack.pop();
    }

    /// Brings `id`'s inheritable values up to date and notifies the ones
    /// that changed. Returns the changes for `id`'s children.
    fn invalidate_tree_dependent_properties(
        &mut self,
        id: ElementId,
        info: &TreeChangeInfo,
        root_snapshot: Option<Snapshot>,
        in_collapsed: bool,
    ) -> Vec<InheritablePropertyChange> {
        if let Some(element) = self.element_mut(id) {
            element.flags.ancestor_change_in_progress = true;
            element.flags.in_visibility_collapsed_tree = in_collapsed;
        }
        self.synchronize_inheritance_parent(id);

        let registry = self.registry.clone();
        let candidates: Snapshot = match root_snapshot {
            Some(snapshot) => snapshot,
            None => {
                let is_boundary = self.is_self_inheritance_parent(id);
                info.inheritable_properties_stack
                    .last()
                    .into_iter()
                    .flatten()
                    .filter(|change| !self.has_own_value(id, change.property))
                    .filter(|change| {
                        !is_boundary
                            || registry
                                .descriptor(change.property)
                                .is_some_and(|d| d.overrides_inheritance_behavior())
                    })
                    .map(|change| (change.property, self.previous_entry(id, change)))
                    .collect()
            }
        };

        let mut changes = Vec::new();
        for (property, old) in candidates {
            let Some(descriptor) = registry.descriptor(property) else {
                continue;
            };
            let new = self.effective_entry(id, descriptor);
            if old != new {
                changes.push(InheritablePropertyChange { property, old, new });
            }
        }
        for change in &changes {
            self.notify_property_changed(id, change);
        }

        if let Some(element) = self.element_mut(id) {
            element.flags.ancestor_change_in_progress = false;
            // Not tracked outside a walk; consumers recompute it lazily.
            element.flags.in_visibility_collapsed_tree = false;
        }
        changes
    }

    /// Pushes an inheritable property change from `id` down to its descendants.
    ///
    /// With `include_start_node`, `id` itself is notified first. If a walk is
    /// already running the propagation is queued and runs once it finishes.
    pub fn invalidate_on_inheritable_property_change(
        &mut self,
        id: ElementId,
        change: InheritablePropertyChange,
        include_start_node: bool,
    ) {
        if self.walk_depth > 0 {
            tracing::trace!(%id, property = %change.property, "queued propagation");
            self.pending.push_back(PendingPropagation {
                element: id,
                change,
                include_start_node,
            });
            return;
        }
        self.walk_depth += 1;
        self.propagate(id, &change, include_start_node);
        self.walk_depth -= 1;
        self.drain_pending();
    }

    fn drain_pending(&mut self) {
        if self.walk_depth > 0 {
            return;
        }
        while let Some(pending) = self.pending.pop_front() {
            self.walk_depth += 1;
            self.propagate(pending.element, &pending.change, pending.include_start_node);
            self.walk_depth -= 1;
        }
        self.delivered.clear();
    }

    /// Returns the entry `id` last held for `change.property`: the one it was
    /// notified with earlier in this walk, or else its parent's old value.
    fn previous_entry(&self, id: ElementId, change: &InheritablePropertyChange) -> EffectiveValueEntry {
        self.delivered
            .get(&(id, change.property))
            .cloned()
            .unwrap_or_else(|| change.old.as_inherited())
    }

    fn propagate(&mut self, id: ElementId, change: &InheritablePropertyChange, include_start_node: bool) {
        if !self.contains(id) {
            return;
        }
        tracing::debug!(%id, property = %change.property, "propagating inherited change");
        if include_start_node {
            self.notify_property_changed(id, change);
        }
        self.propagate_to_children(id, change);
    }

    fn propagate_to_children(&mut self, parent: ElementId, change: &InheritablePropertyChange) {
        let registry = self.registry.clone();
        let Some(descriptor) = registry.descriptor(change.property) else {
            return;
        };
        let property = change.property;
        let children: SmallVec<[ElementId; 8]> = SmallVec::from_slice(self.children(parent));
        for child in children {
            let Some(element) = self.element(child) else {
                continue;
            };
            if element.parent != Some(parent) {
                continue;
            }
            // A boundary's cache tracks its parent even under a local value.
            if element.flags.is_self_inheritance_parent {
                if !descriptor.overrides_inheritance_behavior() {
                    continue;
                }
                let cached = self.inherited_from(parent, property);
                if let Some(element) = self.element_mut(child) {
                    element.store.set_cached_inherited(property, cached);
                }
            }
            if self.has_own_value(child, property) {
                continue;
            }

            let old = self.previous_entry(child, change);
            let new = self.effective_entry(child, descriptor);
            if old == new {
                continue;
            }
            let child_change = InheritablePropertyChange { property, old, new };
            self.notify_property_changed(child, &child_change);
            self.propagate_to_children(child, &child_change);
        }
    }

    /// Dispatches one effective-value change on `id`.
    ///
    /// Records layout/paint work (unless `id` is mid-walk inside a collapsed
    /// subtree), tells listeners about inheritable changes, then runs the
    /// property's change callback.
    pub(crate) fn notify_property_changed(&mut self, id: ElementId, change: &InheritablePropertyChange) {
        let registry = self.registry.clone();
        let Some(descriptor) = registry.descriptor(change.property) else {
            return;
        };
        let Some(element) = self.element(id) else {
            return;
        };
        tracing::trace!(%id, property = descriptor.name(), old = ?change.old, new = ?change.new, "property changed");

        let suppressed =
            element.flags.ancestor_change_in_progress && element.flags.in_visibility_collapsed_tree;
        if !suppressed {
            self.request_invalidation(id, descriptor.flags().invalidation());
        }
        if self.walk_depth > 0 {
            self.delivered.insert((id, change.property), change.new.clone());
        }
        if descriptor.inherits() {
            for mentee in self.live_mentees(id) {
                mentee.inherited_property_changed(id, change);
            }
        }
        if let Some(callback) = &descriptor.changed_callback {
            callback(self, id, &change.old, &change.new);
        }
    }
}
