// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property metadata definitions.
//!
//! This module provides [`PropertyMetadata`] for storing property configuration
//! and [`PropertyMetadataBuilder`] for ergonomic construction.

use alloc::boxed::Box;

use crate::element::ElementId;
use crate::entry::EffectiveValueEntry;
use crate::tree::ElementTree;
use crate::value::PropertyValue;

bitflags::bitflags! {
    /// Behavior flags attached to a property at registration.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PropertyFlags: u8 {
        /// Values flow from ancestors to descendants without a value of their own.
        const INHERITS                        = 0b0000_0001;
        /// Changes request a layout pass on the element.
        const AFFECTS_LAYOUT                  = 0b0000_0010;
        /// Changes request a repaint of the element.
        const AFFECTS_PAINT                   = 0b0000_0100;
        /// Inherited values cross [`InheritanceBehavior`](crate::InheritanceBehavior) boundaries.
        const OVERRIDES_INHERITANCE_BEHAVIOR  = 0b0000_1000;
    }
}

bitflags::bitflags! {
    /// Layout and paint work requested by property changes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Invalidation: u8 {
        /// The element needs a layout pass.
        const LAYOUT = 0b01;
        /// The element needs repainting.
        const PAINT  = 0b10;
    }
}

impl PropertyFlags {
    /// Returns the invalidation requested when a property with these flags changes.
    #[must_use]
    pub fn invalidation(self) -> Invalidation {
        let mut out = Invalidation::empty();
        if self.contains(Self::AFFECTS_LAYOUT) {
            out |= Invalidation::LAYOUT;
        }
        if self.contains(Self::AFFECTS_PAINT) {
            out |= Invalidation::PAINT;
        }
        out
    }
}

/// Callback invoked after a property's effective value changes on an element.
///
/// The callback receives the tree, so it may read or write further values.
/// Writes from inside a callback are applied immediately; any inheritance
/// propagation they cause runs once the current walk has finished.
pub type PropertyChangedCallback =
    Box<dyn Fn(&mut ElementTree, ElementId, &EffectiveValueEntry, &EffectiveValueEntry)>;

/// Callback for coercing a local value before it's stored.
pub type CoerceValueCallback<T> = Box<dyn Fn(T) -> T>;

/// Metadata for a property.
///
/// # Example
///
/// ```rust
/// use understory_lineage::{PropertyFlags, PropertyMetadataBuilder};
///
/// let metadata = PropertyMetadataBuilder::new(12.0_f64)
///     .inherits(true)
///     .affects_layout(true)
///     .build();
///
/// assert_eq!(metadata.default_value(), &12.0);
/// assert!(metadata.flags().contains(PropertyFlags::INHERITS));
/// ```
pub struct PropertyMetadata<T: PropertyValue> {
    pub(crate) default_value: T,
    pub(crate) flags: PropertyFlags,
    pub(crate) changed_callback: Option<PropertyChangedCallback>,
    pub(crate) coerce_callback: Option<CoerceValueCallback<T>>,
}

impl<T: PropertyValue> PropertyMetadata<T> {
    /// Creates metadata with the given default value and no flags.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        PropertyMetadataBuilder::new(default_value).build()
    }

    /// Returns a reference to the default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &T {
        &self.default_value
    }

    /// Returns the property flags.
    #[must_use]
    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    /// Coerces a value using the coerce callback if one is set.
    pub fn coerce(&self, value: T) -> T {
        match &self.coerce_callback {
            Some(callback) => callback(value),
            None => value,
        }
    }
}

// Manual Debug impl since callbacks aren't Debug
impl<T: PropertyValue> core::fmt::Debug for PropertyMetadata<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyMetadata")
            .field("default_value", &self.default_value)
            .field("flags", &self.flags)
            .field("has_changed_callback", &self.changed_callback.is_some())
            .field("has_coerce_callback", &self.coerce_callback.is_some())
            .finish()
    }
}

/// Builder for [`PropertyMetadata`].
pub struct PropertyMetadataBuilder<T: PropertyValue> {
    metadata: PropertyMetadata<T>,
}

impl<T: PropertyValue> core::fmt::Debug for PropertyMetadataBuilder<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("PropertyMetadataBuilder")
            .field(&self.metadata)
            .finish()
    }
}

impl<T: PropertyValue> PropertyMetadataBuilder<T> {
    /// Creates a new builder with the given default value.
    #[must_use]
    pub fn new(default_value: T) -> Self {
        Self {
            metadata: PropertyMetadata {
                default_value,
                flags: PropertyFlags::empty(),
                changed_callback: None,
                coerce_callback: None,
            },
        }
    }

    fn flag(mut self, flag: PropertyFlags, on: bool) -> Self {
        self.metadata.flags.set(flag, on);
        self
    }

    /// Sets whether descendants inherit this property.
    #[must_use]
    pub fn inherits(self, inherits: bool) -> Self {
        self.flag(PropertyFlags::INHERITS, inherits)
    }

    /// Sets whether changes request a layout pass.
    #[must_use]
    pub fn affects_layout(self, affects: bool) -> Self {
        self.flag(PropertyFlags::AFFECTS_LAYOUT, affects)
    }

    /// Sets whether changes request a repaint.
    #[must_use]
    pub fn affects_paint(self, affects: bool) -> Self {
        self.flag(PropertyFlags::AFFECTS_PAINT, affects)
    }

    /// Sets whether inherited values cross inheritance boundaries.
    ///
    /// Only meaningful together with [`inherits`](Self::inherits).
    #[must_use]
    pub fn overrides_inheritance_behavior(self, overrides: bool) -> Self {
        self.flag(PropertyFlags::OVERRIDES_INHERITANCE_BEHAVIOR, overrides)
    }

    /// Replaces all flags at once.
    #[must_use]
    pub fn flags(mut self, flags: PropertyFlags) -> Self {
        self.metadata.flags = flags;
        self
    }

    /// Sets a callback to be invoked when the effective value changes.
    #[must_use]
    pub fn on_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&mut ElementTree, ElementId, &EffectiveValueEntry, &EffectiveValueEntry) + 'static,
    {
        self.metadata.changed_callback = Some(Box::new(callback));
        self
    }

    /// Sets a callback to coerce local values before they are stored.
    #[must_use]
    pub fn coerce<F>(mut self, callback: F) -> Self
    where
        F: Fn(T) -> T + 'static,
    {
        self.metadata.coerce_callback = Some(Box::new(callback));
        self
    }

    /// Builds the [`PropertyMetadata`].
    #[must_use]
    pub fn build(self) -> PropertyMetadata<T> {
        self.metadata
    }
}
