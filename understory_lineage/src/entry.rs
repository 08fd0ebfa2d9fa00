// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Resolved property values.
//!
//! An [`EffectiveValueEntry`] is a snapshot of one property on one element:
//! the value it resolved to and the layer that supplied it.

use core::fmt;

use crate::id::PropertyId;
use crate::value::{ErasedValue, PropertyValue};

/// The layer that supplied an effective value.
///
/// Variants are ordered by precedence, so `Modified > Local > Inherited > Default`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueSource {
    /// The registered default value.
    #[default]
    Default,
    /// A value flowed down from an ancestor.
    Inherited,
    /// A value assigned on the element itself.
    Local,
    /// An override layered above the local value.
    Modified,
}

/// The resolved value of one property on one element.
///
/// Entries are snapshots. Reading one does not keep it in sync with later
/// changes to the tree.
///
/// Two entries are equal when they name the same property, come from the
/// same [`ValueSource`], and hold equal values. `has_modifiers` does not take
/// part in the comparison.
#[derive(Clone)]
pub struct EffectiveValueEntry {
    property: PropertyId,
    value: Option<ErasedValue>,
    source: ValueSource,
    has_modifiers: bool,
}

impl EffectiveValueEntry {
    /// Creates an entry holding `value`.
    #[must_use]
    pub fn new(property: PropertyId, value: ErasedValue, source: ValueSource) -> Self {
        Self {
            property,
            value: Some(value),
            source,
            has_modifiers: false,
        }
    }

    /// Creates the "unset" entry for `property`.
    ///
    /// Used where no layer has produced a value yet, such as the old side of a
    /// change on an element that has never been resolved.
    #[must_use]
    pub fn unset(property: PropertyId) -> Self {
        Self {
            property,
            value: None,
            source: ValueSource::Default,
            has_modifiers: false,
        }
    }

    /// Marks the entry as having passed through coercion or a modifier layer.
    #[must_use]
    pub fn with_modifiers(mut self, has_modifiers: bool) -> Self {
        self.has_modifiers = has_modifiers;
        self
    }

    /// Returns the property this entry belongs to.
    #[must_use]
    #[inline]
    pub fn property(&self) -> PropertyId {
        self.property
    }

    /// Returns the layer that supplied the value.
    #[must_use]
    #[inline]
    pub fn source(&self) -> ValueSource {
        self.source
    }

    /// Returns `true` when coercion or the modifier layer altered the value.
    #[must_use]
    #[inline]
    pub fn has_modifiers(&self) -> bool {
        self.has_modifiers
    }

    /// Returns `true` for the unset sentinel.
    #[must_use]
    #[inline]
    pub fn is_unset(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the erased value, or `None` for the unset sentinel.
    #[must_use]
    #[inline]
    pub fn erased(&self) -> Option<&ErasedValue> {
        self.value.as_ref()
    }

    /// Returns the value as `T`, or `None` if unset or of another type.
    #[must_use]
    pub fn value<T: PropertyValue>(&self) -> Option<&T> {
        self.value.as_ref().and_then(ErasedValue::downcast_ref)
    }

    /// Returns the entry a child sees when it inherits this one.
    ///
    /// Default entries stay default; everything else is flattened to
    /// [`ValueSource::Inherited`] without modifiers.
    #[must_use]
    pub fn as_inherited(&self) -> Self {
        match self.source {
            ValueSource::Default => Self {
                has_modifiers: false,
                ..self.clone()
            },
            _ => Self {
                property: self.property,
                value: self.value.clone(),
                source: ValueSource::Inherited,
                has_modifiers: false,
            },
        }
    }
}

impl PartialEq for EffectiveValueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.property == other.property
            && self.source == other.source
            && self.value == other.value
    }
}

impl fmt::Debug for EffectiveValueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("EffectiveValueEntry");
        s.field("property", &self.property);
        match &self.value {
            Some(value) => s.field("value", value),
            None => s.field("value", &"<unset>"),
        };
        s.field("source", &self.source)
            .field("has_modifiers", &self.has_modifiers)
            .finish()
    }
}
