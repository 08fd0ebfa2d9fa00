// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element arena and logical tree structure.
//!
//! Value access lives in `values.rs`, inheritance bookkeeping in
//! `inheritance.rs`, and the invalidation walks in `walker.rs`; all of them
//! extend [`ElementTree`].

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::element::{Element, ElementFlags, ElementId, InheritanceBehavior};
use crate::entry::EffectiveValueEntry;
use crate::error::TreeError;
use crate::hooks::{ElementHooks, MenteeListener};
use crate::id::PropertyId;
use crate::metadata::Invalidation;
use crate::registry::PropertyRegistry;
use crate::walker::PendingPropagation;

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// An arena of elements linked into logical trees.
///
/// Every element owns a [`PropertyStore`](crate::PropertyStore); inheritable
/// values flow from parents to children as described in the crate docs. The
/// tree is single-threaded: it holds `Rc` hooks and callbacks, so it is
/// neither `Send` nor `Sync`, and a tree can only be mutated from the thread
/// that owns it.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
/// use understory_lineage::{ElementTree, PropertyMetadataBuilder, PropertyRegistry};
///
/// let mut registry = PropertyRegistry::new();
/// let font_size = registry
///     .register("Control", "FontSize", PropertyMetadataBuilder::new(12.0_f64).inherits(true).build())
///     .unwrap();
///
/// let mut tree = ElementTree::new(Rc::new(registry));
/// let window = tree.create_element();
/// let button = tree.create_element();
/// tree.add_child(window, button).unwrap();
///
/// tree.set_value(window, font_size, 16.0).unwrap();
/// assert_eq!(tree.get(button, font_size).unwrap(), 16.0);
/// ```
pub struct ElementTree {
    pub(crate) registry: Rc<PropertyRegistry>,
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    pub(crate) walk_depth: u32,
    pub(crate) pending: VecDeque<PendingPropagation>,
    /// Last entry each element was notified with during the current walk.
    pub(crate) delivered: HashMap<(ElementId, PropertyId), EffectiveValueEntry>,
    pub(crate) invalidations: HashMap<ElementId, Invalidation>,
}

impl core::fmt::Debug for ElementTree {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ElementTree")
            .field("registry", &self.registry)
            .field("live", &self.len())
            .field("free", &self.free_list.len())
            .field("walk_depth", &self.walk_depth)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl ElementTree {
    /// Creates an empty tree whose elements use `registry`.
    #[must_use]
    pub fn new(registry: Rc<PropertyRegistry>) -> Self {
        Self {
            registry,
            slots: Vec::new(),
            free_list: Vec::new(),
            walk_depth: 0,
            pending: VecDeque::new(),
            delivered: HashMap::new(),
            invalidations: HashMap::new(),
        }
    }

    /// Returns the registry shared by this tree.
    #[must_use]
    #[inline]
    pub fn registry(&self) -> &Rc<PropertyRegistry> {
        &self.registry
    }

    /// Returns the number of live elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Returns `true` if the tree has no live elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a detached element.
    pub fn create_element(&mut self) -> ElementId {
        self.insert_element(Element::new(None))
    }

    /// Creates a detached element that receives `hooks`.
    pub fn create_element_with_hooks(&mut self, hooks: Rc<dyn ElementHooks>) -> ElementId {
        self.insert_element(Element::new(Some(hooks)))
    }

    fn insert_element(&mut self, element: Element) -> ElementId {
        let id = if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.element = Some(element);
            ElementId::new(idx, slot.generation)
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "element counts never approach u32::MAX"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                element: Some(element),
            });
            ElementId::new(idx, 1)
        };
        tracing::trace!(%id, "created element");
        id
    }

    /// Detaches `id` from its parent and frees it together with its subtree.
    ///
    /// The detach runs the ancestor-change walk, so hooks and listeners see
    /// the subtree revert to its own values before it is freed. Ids of freed
    /// elements become stale.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`] if `id` is not live.
    pub fn remove_element(&mut self, id: ElementId) -> Result<(), TreeError> {
        if self.parent_of(id)?.is_some() {
            self.set_parent(id, None)?;
        }
        let mut stack = alloc::vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.idx()) else {
                continue;
            };
            if slot.generation != current.generation() {
                continue;
            }
            if let Some(element) = slot.element.take() {
                stack.extend(element.children.iter().copied());
                self.free_list.push(current.0);
                self.invalidations.remove(&current);
            }
        }
        tracing::debug!(%id, "removed element subtree");
        Ok(())
    }

    /// Returns `true` if `id` refers to a live element.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.element(id).is_some()
    }

    pub(crate) fn element(&self, id: ElementId) -> Option<&Element> {
        self.slots
            .get(id.idx())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.element.as_ref())
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.slots
            .get_mut(id.idx())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.element.as_mut())
    }

    pub(crate) fn try_element(&self, id: ElementId) -> Result<&Element, TreeError> {
        self.element(id).ok_or(TreeError::UnknownElement(id))
    }

    pub(crate) fn try_element_mut(&mut self, id: ElementId) -> Result<&mut Element, TreeError> {
        self.element_mut(id).ok_or(TreeError::UnknownElement(id))
    }

    fn parent_of(&self, id: ElementId) -> Result<Option<ElementId>, TreeError> {
        Ok(self.try_element(id)?.parent)
    }

    // --- structure -----------------------------------------------------------

    /// Returns the logical parent of `id`.
    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id)?.parent
    }

    /// Returns the logical children of `id` in order.
    ///
    /// Unknown elements have no children.
    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.element(id)
            .map(|e| e.children.as_slice())
            .unwrap_or_default()
    }

    /// Returns the route parent of `id`, if one was set.
    #[must_use]
    pub fn route_parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id)?.route_parent
    }

    /// Sets the relation event routes follow instead of the logical parent.
    ///
    /// The route parent does not take part in property inheritance.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`] for stale ids and
    /// [`TreeError::SelfParent`] if `route_parent == Some(id)`.
    pub fn set_route_parent(
        &mut self,
        id: ElementId,
        route_parent: Option<ElementId>,
    ) -> Result<(), TreeError> {
        if let Some(target) = route_parent {
            if target == id {
                return Err(TreeError::SelfParent(id));
            }
            self.try_element(target)?;
        }
        self.try_element_mut(id)?.route_parent = route_parent;
        Ok(())
    }

    /// Lets `id`'s hooks adjust the source restored when an event route
    /// merges back at `id` into the logical subtree it left. Without hooks
    /// `source` is returned.
    #[must_use]
    pub fn adjust_branch_source(&self, id: ElementId, source: ElementId) -> ElementId {
        match self.element(id).and_then(|e| e.hooks.as_ref()) {
            Some(hooks) => hooks.adjust_branch_source(id, source),
            None => source,
        }
    }

    /// Returns `true` if `node` is `ancestor` or lies below it in the logical tree.
    #[must_use]
    pub fn is_logical_descendant(&self, node: ElementId, ancestor: ElementId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Appends `child` to `parent`'s children, detaching it from any previous parent.
    ///
    /// # Errors
    ///
    /// See [`set_parent`](Self::set_parent).
    pub fn add_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        self.reparent(child, Some((parent, None)))
    }

    /// Inserts `child` at `index` among `parent`'s children.
    ///
    /// `index` is clamped to the number of children.
    ///
    /// # Errors
    ///
    /// See [`set_parent`](Self::set_parent).
    pub fn insert_child(
        &mut self,
        parent: ElementId,
        index: usize,
        child: ElementId,
    ) -> Result<(), TreeError> {
        self.reparent(child, Some((parent, Some(index))))
    }

    /// Detaches `child` from `parent`.
    ///
    /// # Errors
    ///
    /// [`TreeError::NotAChild`] if `child`'s parent is not `parent`.
    pub fn remove_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), TreeError> {
        if self.parent_of(child)? != Some(parent) {
            return Err(TreeError::NotAChild { child, parent });
        }
        self.reparent(child, None)
    }

    /// Sets or clears the logical parent of `child`.
    ///
    /// The old relation is cleared before the new one is established, then
    /// one ancestor-change walk brings the subtree's inheritable values up to
    /// date.
    ///
    /// # Errors
    ///
    /// - [`TreeError::UnknownElement`] for stale ids.
    /// - [`TreeError::SelfParent`] if `parent == Some(child)`.
    /// - [`TreeError::Cycle`] if `parent` lies below `child`.
    pub fn set_parent(
        &mut self,
        child: ElementId,
        parent: Option<ElementId>,
    ) -> Result<(), TreeError> {
        self.reparent(child, parent.map(|p| (p, None)))
    }

    fn reparent(
        &mut self,
        child: ElementId,
        new_parent: Option<(ElementId, Option<usize>)>,
    ) -> Result<(), TreeError> {
        let old_parent = self.parent_of(child)?;
        if let Some((parent, _)) = new_parent {
            if parent == child {
                return Err(TreeError::SelfParent(child));
            }
            self.try_element(parent)?;
            if self.is_logical_descendant(parent, child) {
                return Err(TreeError::Cycle { child, parent });
            }
        }
        let new_id = new_parent.map(|(p, _)| p);
        if old_parent == new_id && new_parent.is_none_or(|(_, index)| index.is_none()) {
            return Ok(());
        }

        let snapshot = self.inheritable_snapshot(child);

        // Phase one: clear the old relation.
        if let Some(old) = old_parent
            && let Some(element) = self.element_mut(old)
        {
            element.children.retain(|c| *c != child);
        }
        self.try_element_mut(child)?.parent = None;

        // Phase two: establish the new one.
        if let Some((parent, index)) = new_parent {
            let element = self.try_element_mut(parent)?;
            let index = index.map_or(element.children.len(), |i| i.min(element.children.len()));
            element.children.insert(index, child);
            element.flags.initialized = true;
            self.try_element_mut(child)?.parent = Some(parent);
        }

        tracing::debug!(%child, ?old_parent, new_parent = ?new_id, "logical parent changed");

        if old_parent != new_id {
            if let Some(hooks) = self.element(child).and_then(|e| e.hooks.clone()) {
                hooks.on_new_parent(self, child, old_parent, new_id);
            }
            self.run_tree_change(child, snapshot, new_id.is_some());
        }
        Ok(())
    }

    // --- flags ---------------------------------------------------------------

    /// Returns a copy of `id`'s flags.
    #[must_use]
    pub fn flags(&self, id: ElementId) -> Option<ElementFlags> {
        self.element(id).map(|e| e.flags)
    }

    /// Returns `id`'s inheritance behavior, or the default for unknown ids.
    #[must_use]
    pub fn inheritance_behavior(&self, id: ElementId) -> InheritanceBehavior {
        self.element(id)
            .map(|e| e.flags.inheritance_behavior)
            .unwrap_or_default()
    }

    /// Sets `id`'s inheritance behavior.
    ///
    /// If the element is already attached, its inheritable values are
    /// recomputed for the new behavior.
    ///
    /// # Errors
    ///
    /// [`TreeError::InheritanceBehaviorLocked`] once the element has been
    /// initialized (it gained a child, or [`finish_init`](Self::finish_init)
    /// was called).
    pub fn set_inheritance_behavior(
        &mut self,
        id: ElementId,
        behavior: InheritanceBehavior,
    ) -> Result<(), TreeError> {
        let element = self.try_element(id)?;
        if element.flags.initialized {
            return Err(TreeError::InheritanceBehaviorLocked { element: id });
        }
        if element.flags.inheritance_behavior == behavior {
            return Ok(());
        }
        let attached = element.parent.is_some();
        let snapshot = if attached {
            self.inheritable_snapshot(id)
        } else {
            Vec::new()
        };
        self.try_element_mut(id)?.flags.inheritance_behavior = behavior;
        if attached {
            self.run_tree_change(id, snapshot, true);
        }
        Ok(())
    }

    /// Marks `id` initialized, locking its inheritance behavior.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`] for stale ids.
    pub fn finish_init(&mut self, id: ElementId) -> Result<(), TreeError> {
        self.try_element_mut(id)?.flags.initialized = true;
        Ok(())
    }

    /// Returns `true` once `id` is initialized.
    #[must_use]
    pub fn is_initialized(&self, id: ElementId) -> bool {
        self.element(id).is_some_and(|e| e.flags.initialized)
    }

    /// Marks `id` as visibility-collapsed or visible.
    ///
    /// While an ancestor walk visits a collapsed subtree, layout and paint
    /// requests raised there are dropped. Property values are unaffected.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`] for stale ids.
    pub fn set_collapsed(&mut self, id: ElementId, collapsed: bool) -> Result<(), TreeError> {
        self.try_element_mut(id)?.flags.collapsed = collapsed;
        Ok(())
    }

    /// Enables or disables implicit style lookup on `id`.
    ///
    /// Elements attached below it later copy an enabled flag.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`] for stale ids.
    pub fn set_should_lookup_implicit_styles(
        &mut self,
        id: ElementId,
        enabled: bool,
    ) -> Result<(), TreeError> {
        self.try_element_mut(id)?.flags.should_lookup_implicit_styles = enabled;
        Ok(())
    }

    /// Returns `true` if `id` looks up implicit styles.
    #[must_use]
    pub fn should_lookup_implicit_styles(&self, id: ElementId) -> bool {
        self.element(id)
            .is_some_and(|e| e.flags.should_lookup_implicit_styles)
    }

    // --- listeners and invalidation ------------------------------------------

    /// Subscribes a weak listener to `id`.
    ///
    /// # Errors
    ///
    /// [`TreeError::UnknownElement`] for stale ids.
    pub fn subscribe_mentee(
        &mut self,
        id: ElementId,
        listener: &Rc<dyn MenteeListener>,
    ) -> Result<(), TreeError> {
        let element = self.try_element_mut(id)?;
        element.mentees.push(Rc::downgrade(listener));
        element.flags.potentially_has_mentees = true;
        Ok(())
    }

    /// Returns the live listeners of `id`, pruning dropped ones.
    pub(crate) fn live_mentees(&mut self, id: ElementId) -> SmallVec<[Rc<dyn MenteeListener>; 2]> {
        let Some(element) = self.element_mut(id) else {
            return SmallVec::new();
        };
        if !element.flags.potentially_has_mentees {
            return SmallVec::new();
        }
        element.mentees.retain(|weak| weak.strong_count() > 0);
        element.mentees.iter().filter_map(|weak| weak.upgrade()).collect()
    }

    /// Returns the layout and paint work accumulated since the last call,
    /// sorted by element id.
    pub fn take_invalidations(&mut self) -> Vec<(ElementId, Invalidation)> {
        let mut out: Vec<_> = self.invalidations.drain().collect();
        out.sort_unstable_by_key(|(id, _)| *id);
        out
    }

    pub(crate) fn request_invalidation(&mut self, id: ElementId, invalidation: Invalidation) {
        if !invalidation.is_empty() {
            *self.invalidations.entry(id).or_default() |= invalidation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn tree() -> ElementTree {
        ElementTree::new(Rc::new(PropertyRegistry::new()))
    }

    #[test]
    fn create_and_remove_reuses_slots() {
        let mut tree = tree();
        let a = tree.create_element();
        let b = tree.create_element();
        tree.add_child(a, b).unwrap();
        assert_eq!(tree.len(), 2);

        tree.remove_element(a).unwrap();
        assert!(tree.is_empty());
        assert!(!tree.contains(a));
        assert!(!tree.contains(b));

        let c = tree.create_element();
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(tree.children(a), &[] as &[ElementId]);
    }

    #[test]
    fn add_insert_and_remove_children() {
        let mut tree = tree();
        let root = tree.create_element();
        let a = tree.create_element();
        let b = tree.create_element();
        let c = tree.create_element();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, c).unwrap();
        tree.insert_child(root, 1, b).unwrap();
        assert_eq!(tree.children(root), &[a, b, c]);

        tree.remove_child(root, b).unwrap();
        assert_eq!(tree.children(root), &[a, c]);
        assert_eq!(tree.parent(b), None);
        assert_eq!(
            tree.remove_child(root, b),
            Err(TreeError::NotAChild {
                child: b,
                parent: root
            })
        );
    }

    #[test]
    fn reparent_moves_between_parents() {
        let mut tree = tree();
        let p1 = tree.create_element();
        let p2 = tree.create_element();
        let child = tree.create_element();
        tree.add_child(p1, child).unwrap();
        tree.add_child(p2, child).unwrap();
        assert!(tree.children(p1).is_empty());
        assert_eq!(tree.children(p2), &[child]);
        assert_eq!(tree.parent(child), Some(p2));
    }

    #[test]
    fn self_parent_and_cycles_are_rejected() {
        let mut tree = tree();
        let a = tree.create_element();
        let b = tree.create_element();
        tree.add_child(a, b).unwrap();
        assert_eq!(tree.add_child(a, a), Err(TreeError::SelfParent(a)));
        assert_eq!(
            tree.add_child(b, a),
            Err(TreeError::Cycle {
                child: a,
                parent: b
            })
        );
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.children(b), &[] as &[ElementId]);
    }

    #[test]
    fn stale_ids_are_reported() {
        let mut tree = tree();
        let a = tree.create_element();
        let b = tree.create_element();
        tree.remove_element(a).unwrap();
        assert_eq!(tree.add_child(b, a), Err(TreeError::UnknownElement(a)));
        assert_eq!(tree.add_child(a, b), Err(TreeError::UnknownElement(a)));
    }

    #[test]
    fn gaining_a_child_initializes() {
        let mut tree = tree();
        let a = tree.create_element();
        let b = tree.create_element();
        assert!(!tree.is_initialized(a));
        tree.add_child(a, b).unwrap();
        assert!(tree.is_initialized(a));
        assert!(!tree.is_initialized(b));
        assert_eq!(
            tree.set_inheritance_behavior(a, InheritanceBehavior::SkipAllNow),
            Err(TreeError::InheritanceBehaviorLocked { element: a })
        );
        tree.set_inheritance_behavior(b, InheritanceBehavior::SkipAllNext)
            .unwrap();
        tree.finish_init(b).unwrap();
        assert!(tree.set_inheritance_behavior(b, InheritanceBehavior::Default).is_err());
        assert_eq!(tree.inheritance_behavior(b), InheritanceBehavior::SkipAllNext);
    }

    #[test]
    fn logical_descendants() {
        let mut tree = tree();
        let a = tree.create_element();
        let b = tree.create_element();
        let c = tree.create_element();
        tree.add_child(a, b).unwrap();
        tree.add_child(b, c).unwrap();
        assert!(tree.is_logical_descendant(c, a));
        assert!(tree.is_logical_descendant(c, c));
        assert!(!tree.is_logical_descendant(a, c));
    }

    #[test]
    fn route_parent_is_validated() {
        let mut tree = tree();
        let a = tree.create_element();
        let b = tree.create_element();
        assert_eq!(tree.set_route_parent(a, Some(a)), Err(TreeError::SelfParent(a)));
        tree.set_route_parent(a, Some(b)).unwrap();
        assert_eq!(tree.route_parent(a), Some(b));
        assert_eq!(tree.parent(a), None);
    }

    #[test]
    fn branch_source_goes_through_hooks() {
        struct Retarget(ElementId);
        impl ElementHooks for Retarget {
            fn adjust_branch_source(&self, _element: ElementId, _source: ElementId) -> ElementId {
                self.0
            }
        }

        let mut tree = tree();
        let plain = tree.create_element();
        let source = tree.create_element();
        let hooked = tree.create_element_with_hooks(Rc::new(Retarget(plain)));
        assert_eq!(tree.adjust_branch_source(plain, source), source);
        assert_eq!(tree.adjust_branch_source(hooked, source), plain);
    }

    #[test]
    fn implicit_style_flag_is_copied_on_attach() {
        let mut tree = tree();
        let root = tree.create_element();
        let child = tree.create_element();
        let grandchild = tree.create_element();
        tree.add_child(child, grandchild).unwrap();
        tree.set_should_lookup_implicit_styles(root, true).unwrap();
        tree.add_child(root, child).unwrap();
        assert!(tree.should_lookup_implicit_styles(child));
        assert!(tree.should_lookup_implicit_styles(grandchild));

        tree.remove_child(root, child).unwrap();
        assert!(tree.should_lookup_implicit_styles(child));
        assert_eq!(tree.take_invalidations(), vec![]);
    }
}
