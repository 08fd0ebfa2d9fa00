// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dispatcher helper: walk a built route and honor stop/consume outcomes.
//!
//! The dispatcher executes a handler for each entry of an [`EventRoute`] and
//! applies simple propagation rules:
//!
//! - [`RoutingStrategy::Bubble`] visits entries leaf to root,
//!   [`RoutingStrategy::Tunnel`] root to leaf, and [`RoutingStrategy::Direct`]
//!   only the leaf.
//! - [`Outcome::Stop`] aborts propagation immediately.
//! - [`Outcome::StopAndConsume`] aborts propagation and returns `true`.
//! - Returns `true` if consumed; otherwise `false` (for both `Continue` and `Stop`).
//!
//! Routes are typically produced by [`build_route`](crate::builder::build_route).
//!
//! ## Minimal example
//!
//! ```
//! use understory_route::dispatcher;
//! use understory_route::route::EventRoute;
//! use understory_route::types::{Outcome, RoutingStrategy};
//!
//! let mut route = EventRoute::new();
//! route.add(3_u32, 3);
//! route.add(2, 3);
//! route.add(1, 3);
//!
//! let mut seen = Vec::new();
//! let consumed = dispatcher::run(&route, RoutingStrategy::Tunnel, &mut (), |entry, _| {
//!     seen.push(entry.target);
//!     Outcome::Continue
//! });
//!
//! assert!(!consumed);
//! assert_eq!(seen, vec![1, 2, 3]);
//! ```

use crate::route::EventRoute;
use crate::types::{Outcome, RouteEntry, RoutingStrategy};

/// Run a handler over a route and honor stop/consume outcomes.
///
/// ## Usage
///
/// - `route`: a route built by [`build_route`](crate::builder::build_route)
///   or by hand in leaf-to-root order.
/// - `strategy`: the visiting order.
/// - `event`: a mutable event payload carried across handler calls; you own its shape.
/// - `handler`: your per-entry callback. Each entry carries the apparent
///   source for its target; return an [`Outcome`] to control propagation.
///
/// Returns `true` if consumed (via `StopAndConsume`), otherwise `false`.
///
/// ## Example: mark handled while continuing
///
/// ```
/// use understory_route::dispatcher::run;
/// use understory_route::route::EventRoute;
/// use understory_route::types::{Outcome, RoutingStrategy};
///
/// #[derive(Default)]
/// struct Ev {
///     handled: bool,
///     seen: Vec<(u32, u32)>,
/// }
///
/// let mut route = EventRoute::new();
/// route.add(2_u32, 2);
/// route.add(1, 2);
///
/// let mut ev = Ev::default();
/// let consumed = run(&route, RoutingStrategy::Bubble, &mut ev, |entry, e| {
///     e.seen.push((entry.target, entry.source));
///     e.handled = true;
///     Outcome::Continue
/// });
///
/// assert!(!consumed);
/// assert!(ev.handled);
/// assert_eq!(ev.seen, vec![(2, 2), (1, 2)]);
/// ```
pub fn run<K, E>(
    route: &EventRoute<K>,
    strategy: RoutingStrategy,
    event: &mut E,
    mut handler: impl FnMut(&RouteEntry<K>, &mut E) -> Outcome,
) -> bool {
    let entries = route.entries();
    let outcome = match strategy {
        RoutingStrategy::Bubble => walk(entries.iter(), event, &mut handler),
        RoutingStrategy::Tunnel => walk(entries.iter().rev(), event, &mut handler),
        RoutingStrategy::Direct => walk(entries.iter().take(1), event, &mut handler),
    };
    outcome == Outcome::StopAndConsume
}

fn walk<'a, K: 'a, E>(
    entries: impl Iterator<Item = &'a RouteEntry<K>>,
    event: &mut E,
    handler: &mut impl FnMut(&RouteEntry<K>, &mut E) -> Outcome,
) -> Outcome {
    for entry in entries {
        match handler(entry, event) {
            Outcome::Continue => {}
            stop => return stop,
        }
    }
    Outcome::Continue
}
