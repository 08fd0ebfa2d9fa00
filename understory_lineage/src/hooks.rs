// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Capability interfaces elements can plug into the tree.
//!
//! [`ElementHooks`] replaces per-type overrides: an element created with
//! [`ElementTree::create_element_with_hooks`](crate::ElementTree::create_element_with_hooks)
//! receives these callbacks. [`MenteeListener`]s are weak observers, typically
//! resource or binding consumers, that want to hear about changes to an
//! element without owning it.

use crate::element::ElementId;
use crate::tree::ElementTree;
use crate::walker::InheritablePropertyChange;

/// Optional callbacks an element type may implement.
///
/// Every method has a no-op default.
pub trait ElementHooks {
    /// Called after `element`'s logical parent changed from `old` to `new`.
    ///
    /// Runs after the link is updated and before the ancestor-change walk.
    fn on_new_parent(
        &self,
        tree: &ElementTree,
        element: ElementId,
        old: Option<ElementId>,
        new: Option<ElementId>,
    ) {
        let _ = (tree, element, old, new);
    }

    /// Called once per element visited by an ancestor-change walk, after its
    /// inheritable properties were brought up to date.
    ///
    /// The tree may be mutated. Inheritance propagation caused by such writes
    /// is queued until the walk completes.
    fn on_ancestor_changed(&self, tree: &mut ElementTree, element: ElementId) {
        let _ = (tree, element);
    }

    /// Returns the event source to use when a route merges back into a
    /// logical subtree it left at a recorded branch.
    ///
    /// `element` is the merge node: the logical ancestor of the branch node
    /// the route reaches next, not the branch node itself. `source` is the
    /// source recorded with the branch.
    fn adjust_branch_source(&self, element: ElementId, source: ElementId) -> ElementId {
        let _ = element;
        source
    }
}

/// A weak observer of one element.
///
/// Subscribe with [`ElementTree::subscribe_mentee`](crate::ElementTree::subscribe_mentee).
/// The tree only holds a `Weak` reference; dropped listeners are pruned the
/// next time the element notifies.
pub trait MenteeListener {
    /// The element's ancestry changed, so resources it resolves may differ.
    fn resources_changed(&self, element: ElementId) {
        let _ = element;
    }

    /// An inheritable property changed its effective value on the element.
    fn inherited_property_changed(&self, element: ElementId, change: &InheritablePropertyChange) {
        let _ = (element, change);
    }
}
