// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reading and writing property values on elements.

use crate::element::ElementId;
use crate::entry::{EffectiveValueEntry, ValueSource};
use crate::error::TreeError;
use crate::id::{Property, PropertyId};
use crate::registry::{PropertyDescriptor, PropertyRegistry};
use crate::store::PropertyStore;
use crate::tree::ElementTree;
use crate::value::{ErasedValue, PropertyValue};
use crate::walker::InheritablePropertyChange;

impl ElementTree {
    /// Returns the effective entry of `property` on `element`.
    ///
    /// Resolution order is modified, local, inherited (for inheritable
    /// properties), then the registered default. Returns `None` for unknown
    /// elements or properties.
    #[must_use]
    pub fn get_value(
        &self,
        element: ElementId,
        property: impl Into<PropertyId>,
    ) -> Option<EffectiveValueEntry> {
        let descriptor = self.registry.descriptor(property.into())?;
        self.element(element)?;
        Some(self.effective_entry(element, descriptor))
    }

    /// Returns the effective value of a typed property.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`], [`TreeError::UnknownProperty`], or
    /// [`TreeError::TypeMismatch`] if `T` is not the registered type.
    pub fn get<T: PropertyValue>(
        &self,
        element: ElementId,
        property: Property<T>,
    ) -> Result<T, TreeError> {
        let descriptor = self.checked_descriptor(element, property.id())?;
        check_type::<T>(descriptor)?;
        let entry = self.effective_entry(element, descriptor);
        entry
            .value::<T>()
            .cloned()
            .ok_or_else(|| mismatch::<T>(descriptor))
    }

    /// Returns `true` if `element` has a local or modified value for `property`.
    #[must_use]
    pub fn has_own_value(&self, element: ElementId, property: impl Into<PropertyId>) -> bool {
        let id = property.into();
        self.element(element)
            .is_some_and(|e| e.store.has_own_value(id))
    }

    /// Assigns a local value.
    ///
    /// The value passes through the property's coerce callback first. If the
    /// effective value changes, the change callback runs, layout and paint
    /// invalidation is recorded, and inheritable properties propagate to
    /// descendants before this returns.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`], [`TreeError::UnknownProperty`], or
    /// [`TreeError::TypeMismatch`].
    pub fn set_value<T: PropertyValue>(
        &mut self,
        element: ElementId,
        property: Property<T>,
        value: T,
    ) -> Result<(), TreeError> {
        self.set_value_erased(element, property.id(), ErasedValue::new(value))
    }

    /// Assigns a local value whose type is only known at runtime.
    ///
    /// # Errors
    ///
    /// As [`set_value`](Self::set_value).
    pub fn set_value_erased(
        &mut self,
        element: ElementId,
        property: PropertyId,
        value: ErasedValue,
    ) -> Result<(), TreeError> {
        let registry = self.registry.clone();
        let descriptor = self.checked_value(&registry, element, property, &value)?;
        let (value, coerced) = match descriptor.coerce(&value) {
            Some(coerced) => {
                let changed = coerced != value;
                (coerced, changed)
            }
            None => (value, false),
        };
        self.write_value(element, descriptor, |store| {
            store.set_local(property, value, coerced);
        })
    }

    /// Removes the local value, falling back to inherited or default.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`] or [`TreeError::UnknownProperty`].
    pub fn clear_value(
        &mut self,
        element: ElementId,
        property: impl Into<PropertyId>,
    ) -> Result<(), TreeError> {
        let registry = self.registry.clone();
        let property = property.into();
        let descriptor = checked(&registry, property)?;
        self.try_element(element)?;
        self.write_value(element, descriptor, |store| {
            store.clear_local(property);
        })
    }

    /// Sets a modifier override, which takes precedence over the local value.
    ///
    /// Modifier values are not coerced and always report `has_modifiers`.
    ///
    /// # Errors
    ///
    /// As [`set_value`](Self::set_value).
    pub fn set_modified_value<T: PropertyValue>(
        &mut self,
        element: ElementId,
        property: Property<T>,
        value: T,
    ) -> Result<(), TreeError> {
        let registry = self.registry.clone();
        let value = ErasedValue::new(value);
        let descriptor = self.checked_value(&registry, element, property.id(), &value)?;
        self.write_value(element, descriptor, |store| {
            store.set_modified(property.id(), value);
        })
    }

    /// Removes the modifier override.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`] or [`TreeError::UnknownProperty`].
    pub fn clear_modified_value(
        &mut self,
        element: ElementId,
        property: impl Into<PropertyId>,
    ) -> Result<(), TreeError> {
        let registry = self.registry.clone();
        let property = property.into();
        let descriptor = checked(&registry, property)?;
        self.try_element(element)?;
        self.write_value(element, descriptor, |store| {
            store.clear_modified(property);
        })
    }

    /// Applies `write` to `element`'s store and dispatches the change, if any.
    fn write_value(
        &mut self,
        element: ElementId,
        descriptor: &PropertyDescriptor,
        write: impl FnOnce(&mut PropertyStore),
    ) -> Result<(), TreeError> {
        let old = self.effective_entry(element, descriptor);
        write(&mut self.try_element_mut(element)?.store);
        let new = self.effective_entry(element, descriptor);
        if old == new {
            return Ok(());
        }

        let change = InheritablePropertyChange {
            property: descriptor.id(),
            old,
            new,
        };
        self.notify_property_changed(element, &change);
        if descriptor.inherits() {
            self.invalidate_on_inheritable_property_change(element, change, false);
        }
        Ok(())
    }

    /// Resolves `descriptor` on a live element.
    pub(crate) fn effective_entry(
        &self,
        element: ElementId,
        descriptor: &PropertyDescriptor,
    ) -> EffectiveValueEntry {
        let id = descriptor.id();
        if let Some(own) = self.element(element).and_then(|e| e.store.own_entry(id)) {
            return own;
        }
        if descriptor.inherits()
            && let Some(inherited) = self.inherited_entry(element, id)
        {
            return inherited;
        }
        EffectiveValueEntry::new(id, descriptor.default_value().clone(), ValueSource::Default)
    }

    fn checked_descriptor(
        &self,
        element: ElementId,
        property: PropertyId,
    ) -> Result<&PropertyDescriptor, TreeError> {
        self.try_element(element)?;
        checked(&self.registry, property)
    }

    fn checked_value<'r>(
        &self,
        registry: &'r PropertyRegistry,
        element: ElementId,
        property: PropertyId,
        value: &ErasedValue,
    ) -> Result<&'r PropertyDescriptor, TreeError> {
        self.try_element(element)?;
        let descriptor = checked(registry, property)?;
        if descriptor.type_id() != value.type_id() {
            return Err(TreeError::TypeMismatch {
                property,
                expected: descriptor.type_name(),
                found: value.type_name(),
            });
        }
        Ok(descriptor)
    }
}

fn checked(
    registry: &PropertyRegistry,
    property: PropertyId,
) -> Result<&PropertyDescriptor, TreeError> {
    registry
        .descriptor(property)
        .ok_or(TreeError::UnknownProperty(property))
}

fn check_type<T: PropertyValue>(descriptor: &PropertyDescriptor) -> Result<(), TreeError> {
    if descriptor.type_id() == core::any::TypeId::of::<T>() {
        Ok(())
    } else {
        Err(mismatch::<T>(descriptor))
    }
}

fn mismatch<T>(descriptor: &PropertyDescriptor) -> TreeError {
    TreeError::TypeMismatch {
        property: descriptor.id(),
        expected: descriptor.type_name(),
        found: core::any::type_name::<T>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Invalidation, PropertyMetadata, PropertyMetadataBuilder};
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    struct Fixture {
        tree: ElementTree,
        width: Property<f64>,
        opacity: Property<f64>,
        font_size: Property<f64>,
    }

    fn fixture() -> Fixture {
        let mut registry = PropertyRegistry::new();
        let width = registry
            .register(
                "Control",
                "Width",
                PropertyMetadataBuilder::new(0.0_f64)
                    .affects_layout(true)
                    .build(),
            )
            .unwrap();
        let opacity = registry
            .register(
                "Control",
                "Opacity",
                PropertyMetadataBuilder::new(1.0_f64)
                    .affects_paint(true)
                    .coerce(|v| v.clamp(0.0, 1.0))
                    .build(),
            )
            .unwrap();
        let font_size = registry
            .register(
                "Control",
                "FontSize",
                PropertyMetadataBuilder::new(12.0_f64)
                    .inherits(true)
                    .build(),
            )
            .unwrap();
        Fixture {
            tree: ElementTree::new(Rc::new(registry)),
            width,
            opacity,
            font_size,
        }
    }

    #[test]
    fn unset_property_resolves_to_default() {
        let Fixture { mut tree, width, .. } = fixture();
        let e = tree.create_element();
        let entry = tree.get_value(e, width).unwrap();
        assert_eq!(entry.source(), ValueSource::Default);
        assert_eq!(entry.value::<f64>(), Some(&0.0));
        assert_eq!(tree.get(e, width).unwrap(), 0.0);
    }

    #[test]
    fn unknown_lookups_are_none() {
        let Fixture { mut tree, width, .. } = fixture();
        let e = tree.create_element();
        assert!(tree.get_value(e, PropertyId::new(99)).is_none());
        tree.remove_element(e).unwrap();
        assert!(tree.get_value(e, width).is_none());
        assert_eq!(tree.get(e, width), Err(TreeError::UnknownElement(e)));
    }

    #[test]
    fn typed_access_checks_types() {
        let Fixture { mut tree, width, .. } = fixture();
        let e = tree.create_element();
        let wrong: Property<i32> = Property::from_id(width.id());
        assert!(matches!(
            tree.set_value(e, wrong, 3),
            Err(TreeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            tree.get(e, wrong),
            Err(TreeError::TypeMismatch {
                expected: "f64",
                found: "i32",
                ..
            })
        ));
    }

    #[test]
    fn local_value_and_clear() {
        let Fixture { mut tree, width, .. } = fixture();
        let e = tree.create_element();
        tree.set_value(e, width, 40.0).unwrap();
        assert_eq!(tree.get_value(e, width).unwrap().source(), ValueSource::Local);
        assert!(tree.has_own_value(e, width));
        assert_eq!(tree.take_invalidations(), vec![(e, Invalidation::LAYOUT)]);

        tree.clear_value(e, width).unwrap();
        assert_eq!(tree.get(e, width).unwrap(), 0.0);
        assert!(!tree.has_own_value(e, width));
        assert_eq!(tree.take_invalidations(), vec![(e, Invalidation::LAYOUT)]);
    }

    #[test]
    fn unchanged_value_does_not_notify() {
        let Fixture {
            mut tree,
            width,
            opacity,
            ..
        } = fixture();
        let e = tree.create_element();
        tree.set_value(e, width, 40.0).unwrap();
        tree.take_invalidations();
        tree.set_value(e, width, 40.0).unwrap();
        assert!(tree.take_invalidations().is_empty());
        // Clearing a value that was never set is a no-op too.
        tree.clear_value(e, opacity).unwrap();
        assert!(tree.take_invalidations().is_empty());
    }

    #[test]
    fn coercion_marks_modifiers() {
        let Fixture {
            mut tree, opacity, ..
        } = fixture();
        let e = tree.create_element();
        tree.set_value(e, opacity, 3.0).unwrap();
        let entry = tree.get_value(e, opacity).unwrap();
        assert_eq!(entry.value::<f64>(), Some(&1.0));
        assert!(entry.has_modifiers());

        tree.set_value(e, opacity, 0.5).unwrap();
        assert!(!tree.get_value(e, opacity).unwrap().has_modifiers());
    }

    #[test]
    fn modified_layer_overrides_local() {
        let Fixture { mut tree, width, .. } = fixture();
        let e = tree.create_element();
        tree.set_value(e, width, 10.0).unwrap();
        tree.set_modified_value(e, width, 20.0).unwrap();
        let entry = tree.get_value(e, width).unwrap();
        assert_eq!(entry.source(), ValueSource::Modified);
        assert_eq!(tree.get(e, width).unwrap(), 20.0);

        // Writes to the local layer are shadowed while the override is active.
        tree.set_value(e, width, 15.0).unwrap();
        assert_eq!(tree.get(e, width).unwrap(), 20.0);

        tree.clear_modified_value(e, width).unwrap();
        assert_eq!(tree.get(e, width).unwrap(), 15.0);
    }

    #[test]
    fn erased_writes_are_type_checked() {
        let Fixture { mut tree, width, .. } = fixture();
        let e = tree.create_element();
        tree.set_value_erased(e, width.id(), ErasedValue::new(5.0_f64))
            .unwrap();
        assert_eq!(tree.get(e, width).unwrap(), 5.0);
        assert_eq!(
            tree.set_value_erased(e, width.id(), ErasedValue::new(5_u8)),
            Err(TreeError::TypeMismatch {
                property: width.id(),
                expected: "f64",
                found: "u8",
            })
        );
        assert_eq!(
            tree.clear_value(e, PropertyId::new(42)),
            Err(TreeError::UnknownProperty(PropertyId::new(42)))
        );
    }

    #[test]
    fn change_callback_can_write_other_properties() {
        let log: Rc<RefCell<Vec<(f64, f64)>>> = Rc::default();
        let mut registry = PropertyRegistry::new();
        let height = registry
            .register("Control", "Height", PropertyMetadata::new(0.0_f64))
            .unwrap();
        let sink = log.clone();
        let width = registry
            .register(
                "Control",
                "Width",
                PropertyMetadataBuilder::new(0.0_f64)
                    .on_changed(move |tree, element, old, new| {
                        let old = *old.value::<f64>().unwrap();
                        let new = *new.value::<f64>().unwrap();
                        sink.borrow_mut().push((old, new));
                        tree.set_value(element, height, new * 2.0).unwrap();
                    })
                    .build(),
            )
            .unwrap();

        let mut tree = ElementTree::new(Rc::new(registry));
        let e = tree.create_element();
        tree.set_value(e, width, 4.0).unwrap();
        assert_eq!(tree.get(e, height).unwrap(), 8.0);
        assert_eq!(*log.borrow(), vec![(0.0, 4.0)]);
    }

    #[test]
    fn inheritable_lookup_walks_to_ancestor() {
        let Fixture {
            mut tree,
            font_size,
            ..
        } = fixture();
        let root = tree.create_element();
        let child = tree.create_element();
        tree.add_child(root, child).unwrap();
        tree.set_value(root, font_size, 20.0).unwrap();
        let entry = tree.get_value(child, font_size).unwrap();
        assert_eq!(entry.source(), ValueSource::Inherited);
        assert_eq!(entry.value::<f64>(), Some(&20.0));
    }
}
