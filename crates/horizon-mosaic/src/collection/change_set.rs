//! Structural change descriptions and presentational invalidations.
//!
//! A [`ChangeSet`] describes a batch of structural mutations (sections and
//! elements inserted, removed, updated or moved). An
//! [`InvalidationContext`] describes refresh requests that leave the
//! structure untouched. Both carry coordinates in the space of whoever
//! produced them and can be translated into another space with
//! `translated`, which is how a composite lifts a child's notification into
//! its own global space.

use std::collections::BTreeSet;

use super::coordinate::Coordinate;

/// A batch of structural changes at section and element granularity.
///
/// When `has_incremental_changes` is `false` the itemized fields are only
/// informational: consumers must discard them and reload everything.
///
/// # Example
///
/// ```
/// use horizon_mosaic::collection::{ChangeSet, Coordinate};
///
/// let changes = ChangeSet::new()
///     .with_inserted_sections(0..2)
///     .with_updated_elements([Coordinate::element(3, 1)]);
///
/// let lifted = changes.translated(|section| section + 10);
/// assert!(lifted.inserted_sections.contains(&10));
/// assert!(lifted.inserted_sections.contains(&11));
/// assert_eq!(lifted.updated_elements, vec![Coordinate::element(13, 1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Sections inserted, in post-change indices.
    pub inserted_sections: BTreeSet<usize>,
    /// Sections removed, in pre-change indices.
    pub removed_sections: BTreeSet<usize>,
    /// Sections whose content should be reloaded in place.
    pub updated_sections: BTreeSet<usize>,
    /// Elements inserted, in post-change coordinates.
    pub inserted_elements: Vec<Coordinate>,
    /// Elements removed, in pre-change coordinates.
    pub removed_elements: Vec<Coordinate>,
    /// Elements whose content should be reloaded in place.
    pub updated_elements: Vec<Coordinate>,
    /// Section moves as `(from, to)`.
    pub moved_sections: Vec<(usize, usize)>,
    /// Element moves as `(from, to)`.
    pub moved_elements: Vec<(Coordinate, Coordinate)>,
    /// `false` when the batch cannot be applied item by item.
    pub has_incremental_changes: bool,
}

impl Default for ChangeSet {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSet {
    /// Creates an empty, incremental change set.
    pub fn new() -> Self {
        Self {
            inserted_sections: BTreeSet::new(),
            removed_sections: BTreeSet::new(),
            updated_sections: BTreeSet::new(),
            inserted_elements: Vec::new(),
            removed_elements: Vec::new(),
            updated_elements: Vec::new(),
            moved_sections: Vec::new(),
            moved_elements: Vec::new(),
            has_incremental_changes: true,
        }
    }

    /// Creates a change set that asks the consumer for a full reload.
    pub fn reload() -> Self {
        Self {
            has_incremental_changes: false,
            ..Self::new()
        }
    }

    /// Adds inserted sections.
    pub fn with_inserted_sections(mut self, sections: impl IntoIterator<Item = usize>) -> Self {
        self.inserted_sections.extend(sections);
        self
    }

    /// Adds removed sections.
    pub fn with_removed_sections(mut self, sections: impl IntoIterator<Item = usize>) -> Self {
        self.removed_sections.extend(sections);
        self
    }

    /// Adds updated sections.
    pub fn with_updated_sections(mut self, sections: impl IntoIterator<Item = usize>) -> Self {
        self.updated_sections.extend(sections);
        self
    }

    /// Adds inserted elements.
    pub fn with_inserted_elements(mut self, elements: impl IntoIterator<Item = Coordinate>) -> Self {
        self.inserted_elements.extend(elements);
        self
    }

    /// Adds removed elements.
    pub fn with_removed_elements(mut self, elements: impl IntoIterator<Item = Coordinate>) -> Self {
        self.removed_elements.extend(elements);
        self
    }

    /// Adds updated elements.
    pub fn with_updated_elements(mut self, elements: impl IntoIterator<Item = Coordinate>) -> Self {
        self.updated_elements.extend(elements);
        self
    }

    /// Adds a section move.
    pub fn with_moved_section(mut self, from: usize, to: usize) -> Self {
        self.moved_sections.push((from, to));
        self
    }

    /// Adds an element move.
    pub fn with_moved_element(mut self, from: Coordinate, to: Coordinate) -> Self {
        self.moved_elements.push((from, to));
        self
    }

    /// Returns `true` if the batch changes the number of sections.
    pub fn changes_section_count(&self) -> bool {
        !self.inserted_sections.is_empty() || !self.removed_sections.is_empty()
    }

    /// Returns `true` if nothing is described and no reload is requested.
    pub fn is_empty(&self) -> bool {
        self.has_incremental_changes
            && self.inserted_sections.is_empty()
            && self.removed_sections.is_empty()
            && self.updated_sections.is_empty()
            && self.inserted_elements.is_empty()
            && self.removed_elements.is_empty()
            && self.updated_elements.is_empty()
            && self.moved_sections.is_empty()
            && self.moved_elements.is_empty()
    }

    /// Folds `other` into this change set.
    ///
    /// Both batches must be expressed in the same coordinate space. A
    /// non-incremental side makes the result non-incremental.
    pub fn merge(&mut self, other: ChangeSet) {
        self.inserted_sections.extend(other.inserted_sections);
        self.removed_sections.extend(other.removed_sections);
        self.updated_sections.extend(other.updated_sections);
        self.inserted_elements.extend(other.inserted_elements);
        self.removed_elements.extend(other.removed_elements);
        self.updated_elements.extend(other.updated_elements);
        self.moved_sections.extend(other.moved_sections);
        self.moved_elements.extend(other.moved_elements);
        self.has_incremental_changes &= other.has_incremental_changes;
    }

    /// Returns a copy with every section index passed through `map`.
    ///
    /// Element indices within a section are carried over unchanged, as is
    /// `has_incremental_changes`.
    pub fn translated(&self, map: impl Fn(usize) -> usize) -> Self {
        Self {
            inserted_sections: self.inserted_sections.iter().map(|&s| map(s)).collect(),
            removed_sections: self.removed_sections.iter().map(|&s| map(s)).collect(),
            updated_sections: self.updated_sections.iter().map(|&s| map(s)).collect(),
            inserted_elements: translate_coordinates(&self.inserted_elements, &map),
            removed_elements: translate_coordinates(&self.removed_elements, &map),
            updated_elements: translate_coordinates(&self.updated_elements, &map),
            moved_sections: self
                .moved_sections
                .iter()
                .map(|&(from, to)| (map(from), map(to)))
                .collect(),
            moved_elements: self
                .moved_elements
                .iter()
                .map(|&(from, to)| (from.map_section(&map), to.map_section(&map)))
                .collect(),
            has_incremental_changes: self.has_incremental_changes,
        }
    }
}

fn translate_coordinates(coords: &[Coordinate], map: &impl Fn(usize) -> usize) -> Vec<Coordinate> {
    coords.iter().map(|c| c.map_section(map)).collect()
}

/// A batch of purely presentational refresh requests.
///
/// Invalidation never changes section or element counts, so composites
/// forward it without touching their caches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationContext {
    /// Elements whose presentation should be refreshed.
    pub invalidated_elements: BTreeSet<Coordinate>,
    /// Sections whose header should be refreshed.
    pub invalidated_header_sections: BTreeSet<usize>,
    /// Sections whose footer should be refreshed.
    pub invalidated_footer_sections: BTreeSet<usize>,
}

impl InvalidationContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds invalidated elements.
    pub fn with_elements(mut self, elements: impl IntoIterator<Item = Coordinate>) -> Self {
        self.invalidated_elements.extend(elements);
        self
    }

    /// Adds sections whose header is invalidated.
    pub fn with_headers(mut self, sections: impl IntoIterator<Item = usize>) -> Self {
        self.invalidated_header_sections.extend(sections);
        self
    }

    /// Adds sections whose footer is invalidated.
    pub fn with_footers(mut self, sections: impl IntoIterator<Item = usize>) -> Self {
        self.invalidated_footer_sections.extend(sections);
        self
    }

    /// Returns `true` if nothing is invalidated.
    pub fn is_empty(&self) -> bool {
        self.invalidated_elements.is_empty()
            && self.invalidated_header_sections.is_empty()
            && self.invalidated_footer_sections.is_empty()
    }

    /// Returns a copy with every section index passed through `map`.
    pub fn translated(&self, map: impl Fn(usize) -> usize) -> Self {
        Self {
            invalidated_elements: self
                .invalidated_elements
                .iter()
                .map(|c| c.map_section(&map))
                .collect(),
            invalidated_header_sections: self
                .invalidated_header_sections
                .iter()
                .map(|&s| map(s))
                .collect(),
            invalidated_footer_sections: self
                .invalidated_footer_sections
                .iter()
                .map(|&s| map(s))
                .collect(),
        }
    }
}
