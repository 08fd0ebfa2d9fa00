// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types: route entries, branch markers, outcomes, and strategies.

/// One step of an [`EventRoute`](crate::route::EventRoute).
///
/// `source` is the element listeners at `target` observe as the event source.
/// It changes along the route as the event crosses logical tree boundaries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RouteEntry<K> {
    /// The node whose handlers run at this step.
    pub target: K,
    /// The apparent event source at this step.
    pub source: K,
}

impl<K> RouteEntry<K> {
    /// Create an entry.
    pub const fn new(target: K, source: K) -> Self {
        Self { target, source }
    }
}

/// A branch marker: the node where the route left a logical parent, and the
/// source at that moment.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BranchNode<K> {
    /// The node the route left through a non-logical relation.
    pub node: K,
    /// The event source when the branch was taken.
    pub source: K,
}

/// Result of a handler invocation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Outcome {
    /// Continue to the next entry.
    #[default]
    Continue,
    /// Stop propagation; the event is not marked handled.
    Stop,
    /// Stop propagation and mark the event handled.
    StopAndConsume,
}

/// The order in which [`dispatcher::run`](crate::dispatcher::run) visits a route.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RoutingStrategy {
    /// Leaf first, then outward to the root.
    #[default]
    Bubble,
    /// Root first, then inward to the leaf.
    Tunnel,
    /// Only the leaf.
    Direct,
}
