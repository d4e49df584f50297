//! Generic sectioned list.
//!
//! `SectionedList<T>` is a ready-made leaf collection: a list of sections,
//! each holding a list of elements, that reports every mutation to its
//! registered [`UpdateSink`].

use std::fmt;
use std::sync::Arc;

use horizon_mosaic_core::logging::targets;
use parking_lot::RwLock;

use super::change_set::{ChangeSet, InvalidationContext};
use super::coordinate::Coordinate;
use super::traits::{Collection, KeyedCollection, UpdateSink};

/// Type alias for a key extractor function.
pub type KeyExtractor<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// A mutable list of sections of elements.
///
/// Mutators take `&self`, so a list can be shared as an `Arc` with a
/// composite and still be edited by its owner. Each mutator emits the
/// matching [`ChangeSet`] after the internal lock has been released, so the
/// sink may read the list back while handling it.
///
/// Arguments outside the current bounds are rejected with `None` or `false`
/// and emit nothing.
///
/// # Example
///
/// ```
/// use horizon_mosaic::collection::{Collection, Coordinate, SectionedList};
///
/// let list = SectionedList::new(vec![vec!["inbox"], vec!["draft", "sent"]]);
/// list.push_element(0, "archive");
///
/// assert_eq!(list.number_of_elements(0), 2);
/// assert_eq!(list.find(&|name| *name == "sent"), Some(Coordinate::element(1, 1)));
/// ```
pub struct SectionedList<T> {
    sections: RwLock<Vec<Vec<T>>>,
    sink: RwLock<Option<Arc<dyn UpdateSink>>>,
    key_extractor: Option<KeyExtractor<T>>,
}

impl<T: Send + Sync + 'static> SectionedList<T> {
    /// Creates a list holding `sections`.
    pub fn new(sections: Vec<Vec<T>>) -> Self {
        Self {
            sections: RwLock::new(sections),
            sink: RwLock::new(None),
            key_extractor: None,
        }
    }

    /// Creates a list with no sections.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Creates a list that supports keyed lookup.
    ///
    /// `extractor` returns the stable key of an element. Keys are expected
    /// to be unique within the list; lookups return the first match.
    pub fn with_key_extractor<F>(sections: Vec<Vec<T>>, extractor: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        Self {
            key_extractor: Some(Arc::new(extractor)),
            ..Self::new(sections)
        }
    }

    /// Returns the number of sections.
    pub fn section_count(&self) -> usize {
        self.sections.read().len()
    }

    /// Returns the number of elements in `section`.
    pub fn element_count(&self, section: usize) -> Option<usize> {
        self.sections.read().get(section).map(Vec::len)
    }

    /// Returns a read guard over all sections.
    pub fn sections(&self) -> impl std::ops::Deref<Target = Vec<Vec<T>>> + '_ {
        self.sections.read()
    }

    /// Calls `f` with the element at `section`/`index`.
    pub fn with_element<R>(&self, section: usize, index: usize, f: impl FnOnce(&T) -> R) -> Option<R> {
        let sections = self.sections.read();
        sections.get(section)?.get(index).map(f)
    }

    // -------------------------------------------------------------------------
    // Sections
    // -------------------------------------------------------------------------

    /// Inserts a section holding `items` at `at`.
    pub fn insert_section(&self, at: usize, items: Vec<T>) -> bool {
        {
            let mut sections = self.sections.write();
            if at > sections.len() {
                return false;
            }
            sections.insert(at, items);
        }
        tracing::debug!(target: targets::LEAF, section = at, "inserted section");
        self.emit(ChangeSet::new().with_inserted_sections([at]));
        true
    }

    /// Appends a section holding `items` and returns its index.
    pub fn push_section(&self, items: Vec<T>) -> usize {
        let at = {
            let mut sections = self.sections.write();
            sections.push(items);
            sections.len() - 1
        };
        tracing::debug!(target: targets::LEAF, section = at, "inserted section");
        self.emit(ChangeSet::new().with_inserted_sections([at]));
        at
    }

    /// Removes the section at `at` and returns its elements.
    pub fn remove_section(&self, at: usize) -> Option<Vec<T>> {
        let removed = {
            let mut sections = self.sections.write();
            if at >= sections.len() {
                return None;
            }
            sections.remove(at)
        };
        tracing::debug!(target: targets::LEAF, section = at, "removed section");
        self.emit(ChangeSet::new().with_removed_sections([at]));
        Some(removed)
    }

    /// Moves the section at `from` so that it ends up at `to`.
    pub fn move_section(&self, from: usize, to: usize) -> bool {
        {
            let mut sections = self.sections.write();
            if from >= sections.len() || to >= sections.len() {
                return false;
            }
            let section = sections.remove(from);
            sections.insert(to, section);
        }
        self.emit(ChangeSet::new().with_moved_section(from, to));
        true
    }

    /// Replaces every section.
    ///
    /// Emits a non-incremental change set: consumers reload everything.
    pub fn set_sections(&self, sections: Vec<Vec<T>>) {
        let count = sections.len();
        *self.sections.write() = sections;
        tracing::debug!(target: targets::LEAF, sections = count, "replaced all sections");
        self.emit(ChangeSet::reload());
    }

    /// Removes every section.
    pub fn clear(&self) {
        self.set_sections(Vec::new());
    }

    // -------------------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------------------

    /// Inserts `item` into `section` at `at`.
    pub fn insert_element(&self, section: usize, at: usize, item: T) -> bool {
        {
            let mut sections = self.sections.write();
            match sections.get_mut(section) {
                Some(elements) if at <= elements.len() => elements.insert(at, item),
                _ => return false,
            }
        }
        self.emit(ChangeSet::new().with_inserted_elements([Coordinate::element(section, at)]));
        true
    }

    /// Appends `item` to `section` and returns its coordinate.
    pub fn push_element(&self, section: usize, item: T) -> Option<Coordinate> {
        let coordinate = {
            let mut sections = self.sections.write();
            let elements = sections.get_mut(section)?;
            elements.push(item);
            Coordinate::element(section, elements.len() - 1)
        };
        self.emit(ChangeSet::new().with_inserted_elements([coordinate]));
        Some(coordinate)
    }

    /// Removes and returns the element at `section`/`at`.
    pub fn remove_element(&self, section: usize, at: usize) -> Option<T> {
        let removed = {
            let mut sections = self.sections.write();
            let elements = sections.get_mut(section)?;
            if at >= elements.len() {
                return None;
            }
            elements.remove(at)
        };
        self.emit(ChangeSet::new().with_removed_elements([Coordinate::element(section, at)]));
        Some(removed)
    }

    /// Provides mutable access to an element via a closure.
    ///
    /// Emits the element as updated after modification.
    ///
    /// `f` runs under the list's write lock. It must not read this list, nor
    /// any composite containing it: such a read revalidates the composite,
    /// which asks this list for its counts and deadlocks.
    pub fn modify<F, R>(&self, section: usize, index: usize, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut sections = self.sections.write();
        let item = sections.get_mut(section)?.get_mut(index)?;
        let result = f(item);
        drop(sections);

        self.emit(ChangeSet::new().with_updated_elements([Coordinate::element(section, index)]));
        Some(result)
    }

    /// Moves an element, possibly into another section.
    ///
    /// `to` is the element's coordinate after the move. Both coordinates must
    /// address elements, not sections.
    pub fn move_element(&self, from: Coordinate, to: Coordinate) -> bool {
        let (Some(from_index), Some(to_index)) = (from.index, to.index) else {
            return false;
        };
        {
            let mut sections = self.sections.write();
            let source_len = match sections.get(from.section) {
                Some(elements) if from_index < elements.len() => elements.len(),
                _ => return false,
            };
            let target_len = match sections.get(to.section) {
                Some(_) if to.section == from.section => source_len - 1,
                Some(elements) => elements.len(),
                None => return false,
            };
            if to_index > target_len {
                return false;
            }
            let item = sections[from.section].remove(from_index);
            sections[to.section].insert(to_index, item);
        }
        self.emit(ChangeSet::new().with_moved_element(from, to));
        true
    }

    // -------------------------------------------------------------------------
    // Invalidation
    // -------------------------------------------------------------------------

    /// Asks the consumer to refresh the presentation of one element.
    pub fn invalidate_element(&self, section: usize, index: usize) -> bool {
        if index >= self.element_count(section).unwrap_or(0) {
            return false;
        }
        self.emit_invalidation(InvalidationContext::new().with_elements([Coordinate::element(section, index)]));
        true
    }

    /// Asks the consumer to refresh the header of `section`.
    pub fn invalidate_header(&self, section: usize) -> bool {
        if section >= self.section_count() {
            return false;
        }
        self.emit_invalidation(InvalidationContext::new().with_headers([section]));
        true
    }

    /// Asks the consumer to refresh the footer of `section`.
    pub fn invalidate_footer(&self, section: usize) -> bool {
        if section >= self.section_count() {
            return false;
        }
        self.emit_invalidation(InvalidationContext::new().with_footers([section]));
        true
    }

    /// Runs `f` inside the sink's batch bracket.
    pub fn batch(&self, f: impl FnOnce()) {
        let mut f = Some(f);
        let mut body = || {
            if let Some(f) = f.take() {
                f();
            }
        };
        match self.current_sink() {
            Some(sink) => sink.perform_batch(&mut body),
            None => body(),
        }
    }

    fn current_sink(&self) -> Option<Arc<dyn UpdateSink>> {
        self.sink.read().clone()
    }

    fn emit(&self, changes: ChangeSet) {
        if let Some(sink) = self.current_sink() {
            tracing::trace!(target: targets::LEAF, incremental = changes.has_incremental_changes, "emitting changes");
            sink.apply_changes(changes);
        }
    }

    fn emit_invalidation(&self, context: InvalidationContext) {
        if let Some(sink) = self.current_sink() {
            sink.invalidate(context);
        }
    }
}

impl<T: Send + Sync + 'static> Collection<T> for SectionedList<T> {
    fn number_of_sections(&self) -> usize {
        self.section_count()
    }

    fn number_of_elements(&self, section: usize) -> usize {
        self.element_count(section).unwrap_or(0)
    }

    /// Runs `predicate` under a recursive read lock: it may read this list
    /// but must not mutate it.
    fn find(&self, predicate: &dyn Fn(&T) -> bool) -> Option<Coordinate> {
        let sections = self.sections.read_recursive();
        sections.iter().enumerate().find_map(|(section, elements)| {
            elements
                .iter()
                .position(|item| predicate(item))
                .map(|index| Coordinate::element(section, index))
        })
    }

    fn set_update_sink(&self, sink: Option<Arc<dyn UpdateSink>>) {
        *self.sink.write() = sink;
    }

    fn has_update_sink(&self) -> bool {
        self.sink.read().is_some()
    }

    fn as_keyed(&self) -> Option<&dyn KeyedCollection> {
        self.key_extractor
            .as_ref()
            .map(|_| self as &dyn KeyedCollection)
    }
}

impl<T: Send + Sync + 'static> KeyedCollection for SectionedList<T> {
    fn coordinate_for_key(&self, key: &str) -> Option<Coordinate> {
        let extractor = self.key_extractor.as_ref()?;
        let sections = self.sections.read_recursive();
        sections.iter().enumerate().find_map(|(section, elements)| {
            elements
                .iter()
                .position(|item| extractor(item) == key)
                .map(|index| Coordinate::element(section, index))
        })
    }

    fn key_at(&self, coordinate: Coordinate) -> Option<String> {
        let extractor = self.key_extractor.as_ref()?;
        self.with_element(coordinate.section, coordinate.index?, |item| extractor(item))
    }
}

impl<T> fmt::Debug for SectionedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = self.sections.read();
        f.debug_struct("SectionedList")
            .field("sections", &sections.len())
            .field("elements", &sections.iter().map(Vec::len).sum::<usize>())
            .field("keyed", &self.key_extractor.is_some())
            .finish()
    }
}

static_assertions::assert_impl_all!(SectionedList<String>: Send, Sync);
