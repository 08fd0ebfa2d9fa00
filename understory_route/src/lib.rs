// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Route: routed event paths over logical trees.
//!
//! ## Overview
//!
//! This crate builds the ordered dispatch path for a routed event and runs
//! handlers over it. It does not perform hit testing and does not own a tree.
//! Instead, implement [`RouteTree`](crate::builder::RouteTree) for your tree
//! (or enable an adapter) and call [`build_route`](crate::builder::build_route)
//! with the element the event was raised on.
//!
//! ## Sources
//!
//! Every [`RouteEntry`](crate::types::RouteEntry) pairs a target with the
//! *apparent source* its listeners observe. When an event travels through a
//! node hosted outside its logical parent (a popup, a template part), the
//! builder records a branch. When the route later re-enters the logical tree
//! it left, the source recorded at the branch is restored, so listeners only
//! ever see sources from their own logical tree.
//!
//! ## Dispatcher
//!
//! Execute handlers over a route with [`dispatcher::run`], choosing a
//! [`RoutingStrategy`](crate::types::RoutingStrategy):
//!
//! ```
//! use understory_route::builder::{build_route, RouteTree};
//! use understory_route::dispatcher;
//! use understory_route::types::{Outcome, RoutingStrategy};
//!
//! struct Chain;
//! impl RouteTree for Chain {
//!     type Node = u32;
//!     fn logical_parent(&self, node: u32) -> Option<u32> {
//!         node.checked_sub(1)
//!     }
//!     fn has_logical_children(&self, _node: u32) -> bool {
//!         true
//!     }
//! }
//!
//! let route = build_route(&Chain, 2);
//! let mut seen = Vec::new();
//! let consumed = dispatcher::run(&route, RoutingStrategy::Bubble, &mut seen, |entry, seen| {
//!     seen.push(entry.target);
//!     if entry.target == 1 { Outcome::StopAndConsume } else { Outcome::Continue }
//! });
//! assert!(consumed);
//! assert_eq!(seen, vec![2, 1]);
//! ```
//!
//! ## Adapters
//!
//! The [`adapters`] module provides integration with other Understory crates:
//!
//! - **Element Tree Adapter** (`element_tree_adapter` feature): implements
//!   `RouteTree` for `understory_lineage::ElementTree`, using its route
//!   parents and element hooks.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod adapters;
pub mod builder;
pub mod dispatcher;
pub mod route;
pub mod types;
