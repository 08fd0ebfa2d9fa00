// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route building over an `understory_lineage` element tree.
//!
//! ## Feature
//!
//! Enable with `element_tree_adapter`.
//!
//! ## Notes
//!
//! The logical relation is [`ElementTree::parent`]. The route relation is the
//! element's route parent when one is set
//! ([`ElementTree::set_route_parent`]), otherwise its logical parent.
//! Branch sources pass through each element's
//! [`ElementHooks::adjust_branch_source`](understory_lineage::ElementHooks::adjust_branch_source).

use understory_lineage::{ElementId, ElementTree};

use crate::builder::{RouteTree, build_route};
use crate::route::EventRoute;

impl RouteTree for ElementTree {
    type Node = ElementId;

    fn logical_parent(&self, node: ElementId) -> Option<ElementId> {
        self.parent(node)
    }

    fn route_parent(&self, node: ElementId) -> Option<ElementId> {
        Self::route_parent(self, node).or_else(|| self.parent(node))
    }

    fn has_logical_children(&self, node: ElementId) -> bool {
        !self.children(node).is_empty()
    }

    fn is_logical_descendant(&self, node: ElementId, ancestor: ElementId) -> bool {
        Self::is_logical_descendant(self, node, ancestor)
    }

    fn adjust_branch_source(&self, node: ElementId, source: ElementId) -> ElementId {
        Self::adjust_branch_source(self, node, source)
    }
}

/// Build the route for an event raised on `leaf`.
///
/// Stale ids produce a single-entry route.
pub fn route_for(tree: &ElementTree, leaf: ElementId) -> EventRoute<ElementId> {
    build_route(tree, leaf)
}
