// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use crate::element::ElementId;
use crate::id::PropertyId;

/// Errors raised by [`PropertyRegistry`](crate::PropertyRegistry).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    /// The `(owner, name)` pair is already registered.
    #[error("property `{owner}.{name}` is already registered")]
    DuplicateRegistration {
        /// Owner type name.
        owner: &'static str,
        /// Property name.
        name: &'static str,
    },
    /// The registry was sealed and no longer accepts registrations.
    #[error("cannot register `{owner}.{name}`: the property registry is sealed")]
    RegistrySealed {
        /// Owner type name.
        owner: &'static str,
        /// Property name.
        name: &'static str,
    },
    /// The `u16` id space is exhausted.
    #[error("too many properties registered (max {})", u16::MAX)]
    TooManyProperties,
}

/// Errors raised by [`ElementTree`](crate::ElementTree) operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The element id is stale or was never issued by this tree.
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
    /// The property id is not registered.
    #[error("unknown property {0}")]
    UnknownProperty(PropertyId),
    /// A typed access used a type other than the registered one.
    #[error("property {property} holds `{expected}`, not `{found}`")]
    TypeMismatch {
        /// The property accessed.
        property: PropertyId,
        /// The registered value type.
        expected: &'static str,
        /// The type used by the caller.
        found: &'static str,
    },
    /// Inheritance behavior was changed after the element was initialized.
    #[error("inheritance behavior of {element} cannot change after initialization")]
    InheritanceBehaviorLocked {
        /// The initialized element.
        element: ElementId,
    },
    /// An element was asked to become its own parent.
    #[error("{0} cannot be its own parent")]
    SelfParent(ElementId),
    /// The new parent is a descendant of the child.
    #[error("making {parent} the parent of {child} would create a cycle")]
    Cycle {
        /// The element being attached.
        child: ElementId,
        /// The requested parent.
        parent: ElementId,
    },
    /// The element is not a logical child of the given parent.
    #[error("{child} is not a child of {parent}")]
    NotAChild {
        /// The element expected to be a child.
        child: ElementId,
        /// The expected parent.
        parent: ElementId,
    },
}
