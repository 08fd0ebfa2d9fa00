// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property registry.
//!
//! This module provides [`PropertyRegistry`], the append-only table of
//! [`PropertyDescriptor`]s, keyed by `(owner, name)`.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::TypeId;
use hashbrown::HashMap;

use crate::error::PropertyError;
use crate::id::{Property, PropertyId};
use crate::metadata::{PropertyChangedCallback, PropertyFlags, PropertyMetadata};
use crate::value::{ErasedValue, PropertyValue};

type ErasedCoerce = Box<dyn Fn(&ErasedValue) -> Option<ErasedValue>>;

/// The registered identity and metadata of one property.
///
/// Descriptors are immutable once registered.
pub struct PropertyDescriptor {
    id: PropertyId,
    owner: &'static str,
    name: &'static str,
    type_id: TypeId,
    type_name: &'static str,
    default_value: ErasedValue,
    flags: PropertyFlags,
    coerce: Option<ErasedCoerce>,
    pub(crate) changed_callback: Option<PropertyChangedCallback>,
}

impl PropertyDescriptor {
    /// Returns the property id.
    #[must_use]
    #[inline]
    pub fn id(&self) -> PropertyId {
        self.id
    }

    /// Returns the owner type name.
    #[must_use]
    #[inline]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Returns the property name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the [`TypeId`] of the property's value type.
    #[must_use]
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the name of the property's value type.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the default value.
    #[must_use]
    #[inline]
    pub fn default_value(&self) -> &ErasedValue {
        &self.default_value
    }

    /// Returns the property flags.
    #[must_use]
    #[inline]
    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    /// Returns whether descendants inherit this property.
    #[must_use]
    #[inline]
    pub fn inherits(&self) -> bool {
        self.flags.contains(PropertyFlags::INHERITS)
    }

    /// Returns whether inherited values cross inheritance boundaries.
    #[must_use]
    #[inline]
    pub fn overrides_inheritance_behavior(&self) -> bool {
        self.flags.contains(PropertyFlags::OVERRIDES_INHERITANCE_BEHAVIOR)
    }

    /// Runs the coerce callback on an erased value.
    ///
    /// Returns `None` when no callback is registered or the value has the
    /// wrong type.
    pub(crate) fn coerce(&self, value: &ErasedValue) -> Option<ErasedValue> {
        self.coerce.as_ref().and_then(|coerce| coerce(value))
    }
}

impl core::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("default_value", &self.default_value)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// An append-only registry of properties.
///
/// A registry is built once at startup, optionally [sealed](Self::seal), and
/// then shared read-only by every [`ElementTree`](crate::ElementTree) that
/// uses it.
///
/// # Example
///
/// ```rust
/// use understory_lineage::{PropertyError, PropertyMetadataBuilder, PropertyRegistry};
///
/// let mut registry = PropertyRegistry::new();
/// let font_size = registry
///     .register("Control", "FontSize", PropertyMetadataBuilder::new(12.0_f64).inherits(true).build())
///     .unwrap();
///
/// assert_eq!(registry.lookup("Control", "FontSize"), Some(font_size.id()));
/// assert!(registry.descriptor(font_size.id()).unwrap().inherits());
///
/// let again = registry.register("Control", "FontSize", PropertyMetadataBuilder::new(0.0_f64).build());
/// assert!(matches!(again, Err(PropertyError::DuplicateRegistration { .. })));
/// ```
#[derive(Default)]
pub struct PropertyRegistry {
    descriptors: Vec<PropertyDescriptor>,
    by_owner: HashMap<&'static str, HashMap<&'static str, PropertyId>>,
    inheritable: Vec<PropertyId>,
    sealed: bool,
}

impl PropertyRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a property under `(owner, name)`.
    ///
    /// Returns a typed [`Property<T>`] handle.
    ///
    /// # Errors
    ///
    /// - [`PropertyError::RegistrySealed`] after [`seal`](Self::seal).
    /// - [`PropertyError::DuplicateRegistration`] if the pair is taken.
    /// - [`PropertyError::TooManyProperties`] when the id space is exhausted.
    pub fn register<T: PropertyValue>(
        &mut self,
        owner: &'static str,
        name: &'static str,
        metadata: PropertyMetadata<T>,
    ) -> Result<Property<T>, PropertyError> {
        if self.sealed {
            return Err(PropertyError::RegistrySealed { owner, name });
        }
        if self.lookup(owner, name).is_some() {
            return Err(PropertyError::DuplicateRegistration { owner, name });
        }
        if self.descriptors.len() >= usize::from(u16::MAX) {
            return Err(PropertyError::TooManyProperties);
        }

        #[expect(clippy::cast_possible_truncation, reason = "checked above")]
        let id = PropertyId::new(self.descriptors.len() as u16);

        let PropertyMetadata {
            default_value,
            flags,
            changed_callback,
            coerce_callback,
        } = metadata;
        let coerce = coerce_callback.map(|callback| -> ErasedCoerce {
            Box::new(move |value: &ErasedValue| {
                value
                    .downcast_ref::<T>()
                    .map(|v| ErasedValue::new(callback(v.clone())))
            })
        });

        self.descriptors.push(PropertyDescriptor {
            id,
            owner,
            name,
            type_id: TypeId::of::<T>(),
            type_name: core::any::type_name::<T>(),
            default_value: ErasedValue::new(default_value),
            flags,
            coerce,
            changed_callback,
        });
        self.by_owner.entry(owner).or_default().insert(name, id);
        if flags.contains(PropertyFlags::INHERITS) {
            self.inheritable.push(id);
        }

        tracing::debug!(owner, name, id = id.index(), ?flags, "registered property");
        Ok(Property::from_id(id))
    }

    /// Stops accepting registrations.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    /// Returns `true` once [`seal`](Self::seal) has been called.
    #[must_use]
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Returns the number of registered properties.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if no properties are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Looks up a property by owner and name.
    #[must_use]
    pub fn lookup(&self, owner: &str, name: &str) -> Option<PropertyId> {
        self.by_owner.get(owner)?.get(name).copied()
    }

    /// Returns the descriptor for a property id.
    #[must_use]
    pub fn descriptor(&self, id: PropertyId) -> Option<&PropertyDescriptor> {
        self.descriptors.get(usize::from(id.index()))
    }

    /// Returns the ids of all inheritable properties, in registration order.
    #[must_use]
    #[inline]
    pub fn inheritable(&self) -> &[PropertyId] {
        &self.inheritable
    }

    /// Returns an iterator over all descriptors.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.descriptors.iter()
    }
}

impl core::fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("count", &self.descriptors.len())
            .field("inheritable", &self.inheritable.len())
            .field("sealed", &self.sealed)
            .finish()
    }
}
