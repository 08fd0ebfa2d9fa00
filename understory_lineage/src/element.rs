// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element identifiers, per-element flags, and the element record.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::fmt;
use smallvec::SmallVec;

use crate::hooks::{ElementHooks, MenteeListener};
use crate::store::PropertyStore;

/// Identifier for an element in an [`ElementTree`](crate::ElementTree).
///
/// A slot index plus a generation counter. Removing an element frees its
/// slot; reusing the slot bumps the generation, so a stale `ElementId` never
/// aliases a different live element.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ElementId(pub(crate) u32, pub(crate) u32);

impl ElementId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns the slot generation.
    #[must_use]
    #[inline]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({}v{})", self.0, self.1)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element {}v{}", self.0, self.1)
    }
}

/// Controls whether property values cross an element's tree boundary.
///
/// `*Now` variants act on the element's children: they stop looking past
/// this element. `*Next` variants act on the element itself: it stops
/// inheriting from its parent. The App, Theme and All scopes only differ for
/// resource lookup, which lives outside this crate; for property values they
/// behave the same.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum InheritanceBehavior {
    /// Inherit normally.
    #[default]
    Default,
    /// Children stop at this element for application-level lookup.
    SkipToAppNow,
    /// This element stops inheriting, continuing at application level.
    SkipToAppNext,
    /// Children stop at this element for theme-level lookup.
    SkipToThemeNow,
    /// This element stops inheriting, continuing at theme level.
    SkipToThemeNext,
    /// Children stop at this element entirely.
    SkipAllNow,
    /// This element stops inheriting entirely.
    SkipAllNext,
}

impl InheritanceBehavior {
    /// Returns `true` for the `*Now` variants.
    #[must_use]
    pub const fn skips_now(self) -> bool {
        matches!(
            self,
            Self::SkipToAppNow | Self::SkipToThemeNow | Self::SkipAllNow
        )
    }

    /// Returns `true` for the `*Next` variants.
    #[must_use]
    pub const fn skips_next(self) -> bool {
        matches!(
            self,
            Self::SkipToAppNext | Self::SkipToThemeNext | Self::SkipAllNext
        )
    }
}

/// Tree bookkeeping carried by every element.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementFlags {
    /// The element caches inheritable values instead of delegating upward.
    pub is_self_inheritance_parent: bool,
    /// Implicit style lookup is enabled; copied from the parent on attach.
    pub should_lookup_implicit_styles: bool,
    /// An ancestor-change walk is currently visiting this element.
    pub ancestor_change_in_progress: bool,
    /// Set while a walk visits this element inside a collapsed subtree.
    ///
    /// Reset to `false` ("unknown") once the element's invalidation ends.
    pub in_visibility_collapsed_tree: bool,
    /// The element's boundary setting.
    pub inheritance_behavior: InheritanceBehavior,
    /// Locks `inheritance_behavior`.
    pub initialized: bool,
    /// The element has had mentees subscribed at some point.
    pub potentially_has_mentees: bool,
    /// The element itself is visibility-collapsed.
    pub collapsed: bool,
}

pub(crate) struct Element {
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: SmallVec<[ElementId; 4]>,
    pub(crate) route_parent: Option<ElementId>,
    pub(crate) inheritance_parent: Option<ElementId>,
    pub(crate) flags: ElementFlags,
    pub(crate) store: PropertyStore,
    pub(crate) hooks: Option<Rc<dyn ElementHooks>>,
    pub(crate) mentees: Vec<Weak<dyn MenteeListener>>,
}

impl Element {
    pub(crate) fn new(hooks: Option<Rc<dyn ElementHooks>>) -> Self {
        Self {
            parent: None,
            children: SmallVec::new(),
            route_parent: None,
            inheritance_parent: None,
            flags: ElementFlags {
                // A detached element is a root, and roots are boundaries.
                is_self_inheritance_parent: true,
                ..ElementFlags::default()
            },
            store: PropertyStore::new(),
            hooks,
            mentees: Vec::new(),
        }
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("route_parent", &self.route_parent)
            .field("inheritance_parent", &self.inheritance_parent)
            .field("flags", &self.flags)
            .field("store", &self.store)
            .field("has_hooks", &self.hooks.is_some())
            .field("mentees", &self.mentees.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn behavior_scopes() {
        use InheritanceBehavior as B;
        for b in [B::SkipToAppNow, B::SkipToThemeNow, B::SkipAllNow] {
            assert!(b.skips_now());
            assert!(!b.skips_next());
        }
        for b in [B::SkipToAppNext, B::SkipToThemeNext, B::SkipAllNext] {
            assert!(b.skips_next());
            assert!(!b.skips_now());
        }
        assert!(!B::Default.skips_now() && !B::Default.skips_next());
    }

    #[test]
    fn new_element_is_a_boundary() {
        let element = Element::new(None);
        assert!(element.flags.is_self_inheritance_parent);
        assert!(!element.flags.initialized);
        assert!(element.parent.is_none());
    }

    #[test]
    fn element_id_formatting() {
        let id = ElementId::new(3, 2);
        assert_eq!(format!("{id:?}"), "ElementId(3v2)");
        assert_eq!(format!("{id}"), "element 3v2");
        assert_eq!(id.idx(), 3);
        assert_eq!(id.generation(), 2);
    }
}
