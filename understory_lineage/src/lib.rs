// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Lineage: attributed properties with tree-scoped inheritance.
//!
//! This crate provides an element tree whose nodes carry typed, registered
//! properties. A property's value on an element may be assigned locally,
//! overridden by a modifier, inherited from an ancestor, or fall back to the
//! registered default. Changes propagate through the tree as elements are
//! reparented or as inheritable values change, and only the elements whose
//! effective value actually changed are notified.
//!
//! ## Core Concepts
//!
//! ### Registration
//!
//! Properties are registered once in a [`PropertyRegistry`] under an
//! `(owner, name)` pair. Each registration yields a [`PropertyDescriptor`]
//! holding the default value, [`PropertyFlags`], and optional coerce and
//! change callbacks. The registry is then shared (via `Rc`) by every
//! [`ElementTree`] that uses it.
//!
//! ### Resolution
//!
//! [`ElementTree::get_value`] returns an [`EffectiveValueEntry`] tagged with
//! the [`ValueSource`] that supplied it:
//!
//! | Source | Supplied by |
//! |--------|-------------|
//! | **Modified** | [`ElementTree::set_modified_value`] |
//! | **Local** | [`ElementTree::set_value`] |
//! | **Inherited** | the nearest ancestor with a value, for inheritable properties |
//! | **Default** | the registration |
//!
//! ### Inheritance boundaries
//!
//! [`InheritanceBehavior`] lets an element opt out of inheriting from its
//! parent (`*Next`) or hide itself from its children (`*Now`). Elements on
//! the far side of a boundary, and roots, are *self-inheritance parents*:
//! they cache what they still inherit (only properties flagged
//! [`PropertyFlags::OVERRIDES_INHERITANCE_BEHAVIOR`]) and everything below
//! reads through them.
//!
//! ### Walks
//!
//! Reparenting runs the ancestor-change walk over the moved subtree;
//! changing an inheritable value runs the property-change walk below the
//! element. Both notify change callbacks, [`MenteeListener`]s and
//! [`ElementHooks`], and record layout/paint [`Invalidation`]s that the host
//! drains with [`ElementTree::take_invalidations`].
//!
//! ## Quick Start
//!
//! ```rust
//! use std::rc::Rc;
//! use understory_lineage::{
//!     ElementTree, InheritanceBehavior, PropertyMetadataBuilder, PropertyRegistry, ValueSource,
//! };
//!
//! let mut registry = PropertyRegistry::new();
//! let foo = registry
//!     .register("Element", "Foo", PropertyMetadataBuilder::new(0_i32).inherits(true).build())
//!     .unwrap();
//! registry.seal();
//!
//! let mut tree = ElementTree::new(Rc::new(registry));
//! let root = tree.create_element();
//! let child = tree.create_element();
//! tree.add_child(root, child).unwrap();
//!
//! tree.set_value(root, foo, 5).unwrap();
//! assert_eq!(tree.get(child, foo).unwrap(), 5);
//! assert_eq!(tree.get_value(child, foo).unwrap().source(), ValueSource::Inherited);
//!
//! // A boundary element does not see its ancestors' values.
//! let island = tree.create_element();
//! tree.set_inheritance_behavior(island, InheritanceBehavior::SkipAllNext).unwrap();
//! tree.add_child(root, island).unwrap();
//! assert_eq!(tree.get(island, foo).unwrap(), 0);
//! ```
//!
//! ## Threading
//!
//! [`ElementTree`] is `!Send` and `!Sync`; all access happens on the thread
//! that owns it.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod element;
mod entry;
mod error;
mod hooks;
mod id;
mod inheritance;
mod metadata;
mod registry;
mod store;
mod tree;
mod value;
mod values;
mod walker;

pub use element::{ElementFlags, ElementId, InheritanceBehavior};
pub use entry::{EffectiveValueEntry, ValueSource};
pub use error::{PropertyError, TreeError};
pub use hooks::{ElementHooks, MenteeListener};
pub use id::{Property, PropertyId};
pub use metadata::{
    CoerceValueCallback, Invalidation, PropertyChangedCallback, PropertyFlags, PropertyMetadata,
    PropertyMetadataBuilder,
};
pub use registry::{PropertyDescriptor, PropertyRegistry};
pub use store::PropertyStore;
pub use tree::ElementTree;
pub use value::{ErasedValue, PropertyValue};
pub use walker::InheritablePropertyChange;
