// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event route: an ordered list of dispatch entries plus a branch stack.
//!
//! A route is built once per event, immediately before dispatch, then walked
//! and discarded. Entries are stored leaf-first; [`RoutingStrategy`] decides
//! the visiting order.
//!
//! [`RoutingStrategy`]: crate::types::RoutingStrategy

use alloc::vec::Vec;
use smallvec::SmallVec;

use crate::types::{BranchNode, RouteEntry};

/// The ordered dispatch path for one routed event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRoute<K> {
    entries: Vec<RouteEntry<K>>,
    branches: SmallVec<[BranchNode<K>; 4]>,
}

impl<K> Default for EventRoute<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EventRoute<K> {
    /// Create an empty route.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            branches: SmallVec::new(),
        }
    }

    /// Append `target` with the source its listeners will observe.
    pub fn add(&mut self, target: K, source: K) {
        self.entries.push(RouteEntry::new(target, source));
    }

    /// Entries in leaf-to-root order.
    pub fn entries(&self) -> &[RouteEntry<K>] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the route has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record that the route leaves `node`'s logical parent while the event
    /// source is `source`.
    pub fn push_branch_node(&mut self, node: K, source: K) {
        self.branches.push(BranchNode { node, source });
    }

    /// The most recent unmatched branch, if any.
    pub fn peek_branch(&self) -> Option<&BranchNode<K>> {
        self.branches.last()
    }

    /// The node of the most recent unmatched branch.
    pub fn peek_branch_node(&self) -> Option<&K> {
        self.branches.last().map(|b| &b.node)
    }

    /// The source recorded with the most recent unmatched branch.
    pub fn peek_branch_source(&self) -> Option<&K> {
        self.branches.last().map(|b| &b.source)
    }

    /// Remove and return the most recent unmatched branch.
    pub fn pop_branch_node(&mut self) -> Option<BranchNode<K>> {
        self.branches.pop()
    }

    /// Number of branches not yet matched by a return into their subtree.
    pub fn open_branches(&self) -> usize {
        self.branches.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_stack_is_lifo() {
        let mut route: EventRoute<u32> = EventRoute::new();
        assert!(route.peek_branch_node().is_none());
        route.push_branch_node(1, 10);
        route.push_branch_node(2, 20);
        assert_eq!(route.peek_branch_node(), Some(&2));
        assert_eq!(route.peek_branch_source(), Some(&20));
        assert_eq!(
            route.pop_branch_node(),
            Some(BranchNode { node: 2, source: 20 })
        );
        assert_eq!(route.peek_branch(), Some(&BranchNode { node: 1, source: 10 }));
        assert_eq!(route.open_branches(), 1);
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut route = EventRoute::new();
        route.add(3_u32, 3);
        route.add(2, 3);
        assert_eq!(route.len(), 2);
        assert_eq!(
            route.entries(),
            &[RouteEntry::new(3, 3), RouteEntry::new(2, 3)]
        );
    }
}
