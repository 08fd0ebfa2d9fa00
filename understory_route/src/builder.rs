// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Route building over a logical tree with an alternate routing relation.
//!
//! Events travel upward through each node's *route parent*. That is usually
//! the logical parent, but a node may be hosted somewhere else (a popup under
//! its placement target, a template part under its container). Listeners
//! still expect to see a source from their own logical tree, so the builder
//! tracks the apparent source as it goes:
//!
//! - Entering a logical tree from outside resets the source to the node
//!   being entered.
//! - Leaving a logical parent through the route relation pushes a branch
//!   marker with the current source.
//! - Reaching a logical ancestor of the most recent branch node restores the
//!   source recorded with that branch. Logical ancestors of the branch node
//!   that the detour skipped are added to the route first.
//!
//! ## Minimal example
//!
//! ```
//! use understory_route::builder::{build_route, RouteTree};
//! use understory_route::types::RouteEntry;
//!
//! // 1 -> 2 -> 3, logical parent is n - 1.
//! struct Chain;
//! impl RouteTree for Chain {
//!     type Node = u32;
//!     fn logical_parent(&self, node: u32) -> Option<u32> {
//!         (node > 1).then(|| node - 1)
//!     }
//!     fn has_logical_children(&self, node: u32) -> bool {
//!         node < 3
//!     }
//! }
//!
//! let route = build_route(&Chain, 3);
//! assert_eq!(
//!     route.entries(),
//!     &[RouteEntry::new(3, 3), RouteEntry::new(2, 3), RouteEntry::new(1, 3)]
//! );
//! ```

use core::fmt::Debug;
use core::hash::Hash;

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::route::EventRoute;

/// The relations a route builder walks.
///
/// Implementations must keep the logical relation acyclic. The route
/// relation may contain cycles; the builder stops at the first revisit.
pub trait RouteTree {
    /// Node handle.
    type Node: Copy + Eq + Hash + Debug;

    /// The logical parent of `node`.
    fn logical_parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The next node on an event route. Defaults to the logical parent.
    fn route_parent(&self, node: Self::Node) -> Option<Self::Node> {
        self.logical_parent(node)
    }

    /// Returns `true` if `node` has at least one logical child.
    fn has_logical_children(&self, node: Self::Node) -> bool;

    /// Returns `true` if `node` is `ancestor` or lies below it logically.
    fn is_logical_descendant(&self, node: Self::Node, ancestor: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.logical_parent(n);
        }
        false
    }

    /// Adjusts the source restored when the route merges back into the
    /// logical subtree it left. Defaults to `source`.
    ///
    /// `node` is the merge node, the logical ancestor of the branch node that
    /// the route reaches next.
    fn adjust_branch_source(&self, node: Self::Node, source: Self::Node) -> Self::Node {
        let _ = node;
        source
    }
}

/// Build the route for an event raised on `leaf`.
///
/// The walk ends at the first node without a route parent. Branches never
/// matched by a return into their subtree remain on the route's branch stack.
pub fn build_route<T: RouteTree + ?Sized>(tree: &T, leaf: T::Node) -> EventRoute<T::Node> {
    let mut route = EventRoute::new();
    let mut visited: HashSet<T::Node> = HashSet::new();
    let mut source = leaf;
    let mut current = Some(leaf);

    while let Some(node) = current {
        if !visited.insert(node) {
            tracing::warn!(?node, "route relation revisits a node; stopping");
            break;
        }

        // A node in a logical tree only reports sources from that tree.
        let in_logical_tree =
            tree.logical_parent(node).is_some() || tree.has_logical_children(node);
        if in_logical_tree && !tree.is_logical_descendant(source, node) {
            source = node;
        }

        if let Some(branch) = route.peek_branch().copied()
            && tree.is_logical_descendant(branch.node, node)
        {
            route.pop_branch_node();
            source = tree.adjust_branch_source(node, branch.source);
            tracing::trace!(?node, branch = ?branch.node, ?source, "restored branch source");
            add_intermediates(tree, &mut route, &mut visited, branch.node, node, source);
        }

        route.add(node, source);
        tracing::trace!(?node, ?source, "route entry");

        let logical = tree.logical_parent(node);
        let next = tree.route_parent(node);
        if logical.is_some() && next != logical {
            route.push_branch_node(node, source);
        }
        current = next;
    }
    route
}

/// Adds the logical ancestors of `branch` below `merge_point` that the
/// detour skipped, nearest to `branch` first.
fn add_intermediates<T: RouteTree + ?Sized>(
    tree: &T,
    route: &mut EventRoute<T::Node>,
    visited: &mut HashSet<T::Node>,
    branch: T::Node,
    merge_point: T::Node,
    source: T::Node,
) {
    let mut skipped: SmallVec<[T::Node; 8]> = SmallVec::new();
    let mut current = tree.logical_parent(branch);
    while let Some(node) = current
        && node != merge_point
    {
        skipped.push(node);
        current = tree.logical_parent(node);
    }
    for node in skipped {
        if visited.insert(node) {
            route.add(node, source);
        }
    }
}
