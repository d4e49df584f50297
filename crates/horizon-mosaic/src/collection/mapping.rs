//! Per-child coordinate mapping.
//!
//! A [`Mapping`] records where one child's sections start in the composite's
//! global section space and how many sections the child had when the
//! composite last revalidated. Translation only ever touches the section
//! component of a coordinate; element indices are shared by both spaces.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use super::change_set::{ChangeSet, InvalidationContext};
use super::coordinate::Coordinate;
use super::identity::ChildKey;
use super::traits::Collection;

/// The translation record for one registered child.
///
/// The offset and section count are snapshots taken during revalidation.
/// Between a structural mutation and the next revalidation they describe the
/// previous layout, which is exactly what removals need to be translated
/// against.
pub struct Mapping<T: 'static> {
    child: Arc<dyn Collection<T>>,
    key: ChildKey,
    offset: usize,
    section_count: usize,
}

impl<T: 'static> Mapping<T> {
    /// Creates a mapping for `child`. Its offset is assigned on the next
    /// [`invalidate`](Self::invalidate).
    pub fn new(child: Arc<dyn Collection<T>>) -> Self {
        let key = ChildKey::of(&child);
        Self {
            child,
            key,
            offset: 0,
            section_count: 0,
        }
    }

    /// The mapped child.
    pub fn child(&self) -> &Arc<dyn Collection<T>> {
        &self.child
    }

    /// The child's identity key.
    pub fn key(&self) -> ChildKey {
        self.key
    }

    /// The global index of the child's first section.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The child's section count at the last revalidation.
    pub fn section_count(&self) -> usize {
        self.section_count
    }

    /// The global sections the child occupies.
    pub fn section_range(&self) -> Range<usize> {
        self.offset..self.offset + self.section_count
    }

    /// Translates a global section into the child's space.
    ///
    /// The caller guarantees that `global` lies inside
    /// [`section_range`](Self::section_range).
    pub fn local_section(&self, global: usize) -> usize {
        debug_assert!(
            self.section_range().contains(&global),
            "global section {global} outside {:?}",
            self.section_range()
        );
        global - self.offset
    }

    /// Like [`local_section`](Self::local_section), returning `None` instead
    /// of assuming the section belongs to this child.
    pub fn checked_local_section(&self, global: usize) -> Option<usize> {
        global
            .checked_sub(self.offset)
            .filter(|&local| local < self.section_count)
    }

    /// Translates a child section into the global space.
    pub fn global_section(&self, local: usize) -> usize {
        local + self.offset
    }

    /// Translates a global coordinate into the child's space.
    pub fn local_coordinate(&self, global: Coordinate) -> Coordinate {
        global.map_section(|section| self.local_section(section))
    }

    /// Translates a child coordinate into the global space.
    pub fn global_coordinate(&self, local: Coordinate) -> Coordinate {
        local.map_section(|section| self.global_section(section))
    }

    /// Lifts a child's change set into the global space.
    pub fn global_changes(&self, changes: &ChangeSet) -> ChangeSet {
        changes.translated(|section| self.global_section(section))
    }

    /// Lifts a child's invalidation context into the global space.
    pub fn global_invalidation(&self, context: &InvalidationContext) -> InvalidationContext {
        context.translated(|section| self.global_section(section))
    }

    /// Re-anchors the mapping at `starting_at` and re-snapshots the child's
    /// section count, calling `on_each_global_section` once per global
    /// section the child now covers.
    ///
    /// Returns the first global section after this child.
    pub fn invalidate(
        &mut self,
        starting_at: usize,
        mut on_each_global_section: impl FnMut(usize),
    ) -> usize {
        self.offset = starting_at;
        self.section_count = self.child.number_of_sections();
        for global in self.section_range() {
            on_each_global_section(global);
        }
        self.offset + self.section_count
    }
}

impl<T: 'static> fmt::Debug for Mapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("key", &self.key)
            .field("offset", &self.offset)
            .field("section_count", &self.section_count)
            .finish()
    }
}
