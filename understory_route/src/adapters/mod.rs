// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters for other Understory crates.
//!
//! Adapters are feature-gated so the core route builder has no dependency
//! on any particular tree.

#[cfg(feature = "element_tree_adapter")]
pub mod element_tree;
