//! Composite collection.
//!
//! `CompositeCollection` concatenates the sections of any number of child
//! collections into one global section space. Children keep their own local
//! coordinates; the composite keeps one [`Mapping`] per child and translates
//! in both directions.
//!
//! # Cache discipline
//!
//! The offset table and the global-section lookup are a cache over the
//! children's section counts with exactly two states, valid and stale. Every
//! structural mutation marks it stale and every read that resolves sections
//! revalidates first, so no caller ever observes a stale table.
//!
//! Child notifications are ordered around the cache as follows:
//!
//! - inserted sections: the cache is rebuilt *before* translating, since the
//!   child already reports its post-insert count;
//! - removed sections: the change is translated against the pre-removal
//!   offsets, the cache is marked stale, and only then is the translated
//!   change forwarded, so any read made by the consumer while handling it
//!   sees the post-removal layout;
//! - updates and moves: translated and forwarded with no cache work.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, Weak};

use horizon_mosaic_core::logging::{PerfSpan, span_names, targets};
use parking_lot::RwLock;
use slotmap::{SlotMap, new_key_type};

use super::change_set::{ChangeSet, InvalidationContext};
use super::config::CompositeConfig;
use super::coordinate::Coordinate;
use super::error::{CompositeError, Result};
use super::identity::ChildKey;
use super::mapping::Mapping;
use super::traits::{Collection, KeyedCollection, UpdateSink};

new_key_type! {
    struct MappingId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheState {
    Valid,
    Stale,
}

/// Everything guarded by the composite's lock.
struct Layout<T: 'static> {
    mappings: SlotMap<MappingId, Mapping<T>>,
    /// Display order of the children.
    order: Vec<MappingId>,
    /// Owning mapping of every global section, indexed by section.
    section_index: Vec<MappingId>,
    identity_index: HashMap<ChildKey, MappingId>,
    cache: CacheState,
}

impl<T: 'static> Layout<T> {
    fn new() -> Self {
        Self {
            mappings: SlotMap::with_key(),
            order: Vec::new(),
            section_index: Vec::new(),
            identity_index: HashMap::new(),
            cache: CacheState::Valid,
        }
    }

    fn mark_stale(&mut self) {
        self.cache = CacheState::Stale;
    }

    /// Rebuilds every offset and the section lookup from the children's
    /// current section counts.
    fn revalidate(&mut self) {
        let _span = PerfSpan::new(span_names::REVALIDATE);
        self.section_index.clear();

        let mut running_total = 0;
        for &id in &self.order {
            let section_index = &mut self.section_index;
            running_total = self.mappings[id].invalidate(running_total, |global| {
                debug_assert_eq!(global, section_index.len());
                section_index.push(id);
            });
        }

        self.cache = CacheState::Valid;
        tracing::trace!(
            target: targets::COMPOSITE,
            children = self.order.len(),
            sections = running_total,
            "revalidated section cache"
        );
    }

    /// Checks the offset table against the layout invariants.
    fn verify(&self) -> Result<()> {
        if self.order.len() != self.mappings.len() || self.order.len() != self.identity_index.len() {
            return Err(CompositeError::corruption(
                self.section_index.len(),
                format!(
                    "{} ordered children, {} mappings, {} identities",
                    self.order.len(),
                    self.mappings.len(),
                    self.identity_index.len()
                ),
            ));
        }

        let mut expected_offset = 0;
        for &id in &self.order {
            let mapping = &self.mappings[id];
            if mapping.offset() != expected_offset {
                return Err(CompositeError::corruption(
                    expected_offset,
                    format!("child starts at {} instead of {expected_offset}", mapping.offset()),
                ));
            }
            for global in mapping.section_range() {
                if self.section_index.get(global) != Some(&id) {
                    return Err(CompositeError::corruption(global, "section owned by another child"));
                }
            }
            expected_offset += mapping.section_count();
        }

        if expected_offset != self.section_index.len() {
            return Err(CompositeError::corruption(
                expected_offset,
                format!("{} sections indexed", self.section_index.len()),
            ));
        }
        Ok(())
    }

    /// Finds the mapping owning `global` and the matching local section.
    fn resolve(&self, global: usize) -> Result<(&Mapping<T>, usize)> {
        let id = self
            .section_index
            .get(global)
            .ok_or_else(|| CompositeError::corruption(global, "no owning child in the section cache"))?;
        let mapping = self
            .mappings
            .get(*id)
            .ok_or_else(|| CompositeError::corruption(global, "section cache points at a removed child"))?;
        let local = mapping.checked_local_section(global).ok_or_else(|| {
            CompositeError::corruption(
                global,
                format!(
                    "translated section is outside the child's {} cached sections",
                    mapping.section_count()
                ),
            )
        })?;
        Ok((mapping, local))
    }

    fn mapping_for(&self, key: ChildKey) -> Option<&Mapping<T>> {
        self.identity_index.get(&key).map(|&id| &self.mappings[id])
    }

    /// Unregisters one child. The cache is left stale.
    fn detach(&mut self, id: MappingId) -> Option<Mapping<T>> {
        let mapping = self.mappings.remove(id)?;
        self.identity_index.remove(&mapping.key());
        self.order.retain(|&other| other != id);
        mapping.child().set_update_sink(None);
        self.mark_stale();
        Some(mapping)
    }

    /// Unregisters every child in display order. The cache is left stale.
    fn detach_all(&mut self) -> Vec<Mapping<T>> {
        let detached: Vec<_> = std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|id| self.mappings.remove(id))
            .collect();
        for mapping in &detached {
            mapping.child().set_update_sink(None);
        }
        self.identity_index.clear();
        self.mark_stale();
        detached
    }

    /// Children with their current offsets, for calling out without the lock.
    fn snapshot(&self) -> Vec<(Arc<dyn Collection<T>>, usize)> {
        self.order
            .iter()
            .map(|&id| {
                let mapping = &self.mappings[id];
                (mapping.child().clone(), mapping.offset())
            })
            .collect()
    }
}

/// A collection presenting the sections of its children as one sequence.
///
/// Children are laid out in insertion order: the first child's sections come
/// first, then the second child's, and so on. A composite is itself a
/// [`Collection`], so composites nest to any depth.
///
/// The composite registers itself as each child's [`UpdateSink`] and
/// forwards every child notification to its own sink with coordinates
/// translated into the global space. Its own mutators notify the same sink.
///
/// A collection can be a child of at most one composite at a time: a
/// collection that already reports to an update sink is refused until its
/// current owner lets go of it.
///
/// # Example
///
/// ```
/// use horizon_mosaic::collection::{Collection, CompositeCollection, SectionedList};
/// use std::sync::Arc;
///
/// let favourites = Arc::new(SectionedList::new(vec![vec!["a", "b"], vec![], vec!["c"]]));
/// let recent = Arc::new(SectionedList::new(vec![vec!["d", "e", "f", "g", "h"]]));
///
/// let composite = CompositeCollection::<&str>::new();
/// composite.append(favourites.clone())?;
/// composite.insert(recent.clone(), 0)?;
///
/// assert_eq!(composite.number_of_sections(), 4);
/// assert_eq!(composite.number_of_elements(0), 5);
/// assert_eq!(composite.number_of_elements(1), 2);
/// # Ok::<(), horizon_mosaic::collection::CompositeError>(())
/// ```
pub struct CompositeCollection<T: 'static> {
    this: Weak<Self>,
    layout: RwLock<Layout<T>>,
    sink: RwLock<Option<Arc<dyn UpdateSink>>>,
    config: CompositeConfig,
}

impl<T: 'static> CompositeCollection<T> {
    /// Creates an empty composite.
    pub fn new() -> Arc<Self> {
        Self::with_config(CompositeConfig::default())
    }

    /// Creates an empty composite with the given configuration.
    pub fn with_config(config: CompositeConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            layout: RwLock::new(Layout::new()),
            sink: RwLock::new(None),
            config,
        })
    }

    /// Creates a composite already holding `children`, in order.
    ///
    /// No notifications are sent: the composite has no sink yet.
    pub fn with_children(
        children: impl IntoIterator<Item = Arc<dyn Collection<T>>>,
    ) -> Result<Arc<Self>> {
        let children: Vec<_> = children.into_iter().collect();
        let composite = Self::new();
        composite.check_unique(&children)?;
        {
            let mut layout = composite.layout.write();
            for child in children {
                let at = layout.order.len();
                composite.attach(&mut layout, child, at)?;
            }
            composite.refresh(&mut layout);
        }
        Ok(composite)
    }

    /// Returns the configuration this composite was created with.
    pub fn config(&self) -> &CompositeConfig {
        &self.config
    }

    fn name(&self) -> &str {
        self.config.name.as_deref().unwrap_or("composite")
    }

    fn key(&self) -> ChildKey {
        ChildKey::of_ref(self)
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Inserts `child` so that it becomes the child at position `at`.
    ///
    /// Emits the global sections the child now occupies as inserted.
    ///
    /// # Errors
    ///
    /// - [`CompositeError::DuplicateChild`] if `child` is already registered
    /// - [`CompositeError::IndexOutOfBounds`] if `at > child_count()`
    /// - [`CompositeError::AlreadyObserved`] if `child` reports to another sink
    /// - [`CompositeError::SelfInsertion`] if `child` is this composite or
    ///   contains it
    pub fn insert(&self, child: Arc<dyn Collection<T>>, at: usize) -> Result<()> {
        self.check_not_ancestor(&child)?;
        let range = {
            let mut layout = self.layout.write();
            let id = self.attach(&mut layout, child, at)?;
            self.refresh(&mut layout);
            layout.mappings[id].section_range()
        };

        tracing::debug!(
            target: targets::COMPOSITE,
            composite = self.name(),
            position = at,
            sections = ?range,
            "inserted child"
        );
        if !range.is_empty() {
            self.emit_changes(ChangeSet::new().with_inserted_sections(range));
        }
        Ok(())
    }

    /// Inserts `child` after every existing child.
    pub fn append(&self, child: Arc<dyn Collection<T>>) -> Result<()> {
        let at = self.child_count();
        self.insert(child, at)
    }

    /// Removes `child`.
    ///
    /// Emits the global sections the child occupied before removal as
    /// removed.
    ///
    /// # Errors
    ///
    /// [`CompositeError::NotAChild`] if `child` is not registered. This is a
    /// programming error in the caller.
    pub fn remove<C>(&self, child: &Arc<C>) -> Result<()>
    where
        C: Collection<T> + ?Sized,
    {
        let key = ChildKey::of(child);
        let range = {
            let mut layout = self.layout.write();
            let id = *layout
                .identity_index
                .get(&key)
                .ok_or(CompositeError::NotAChild)?;
            self.ensure_valid(&mut layout);
            let range = layout.mappings[id].section_range();
            layout.detach(id);
            self.refresh(&mut layout);
            range
        };

        tracing::debug!(
            target: targets::COMPOSITE,
            composite = self.name(),
            sections = ?range,
            "removed child"
        );
        if !range.is_empty() {
            self.emit_changes(ChangeSet::new().with_removed_sections(range));
        }
        Ok(())
    }

    /// Removes every child as one batch.
    ///
    /// Each child's range is computed against the pre-removal layout; the
    /// union is emitted as a single change set inside the sink's batch
    /// bracket. Returns the number of children removed.
    pub fn remove_all(&self) -> usize {
        let (changes, removed) = {
            let mut layout = self.layout.write();
            self.ensure_valid(&mut layout);

            let mut changes = ChangeSet::new();
            for &id in &layout.order {
                changes
                    .removed_sections
                    .extend(layout.mappings[id].section_range());
            }
            let removed = layout.detach_all().len();
            self.refresh(&mut layout);
            (changes, removed)
        };

        tracing::debug!(
            target: targets::COMPOSITE,
            composite = self.name(),
            children = removed,
            sections = changes.removed_sections.len(),
            "removed all children"
        );
        if !changes.is_empty() {
            self.emit_batched(changes);
        }
        removed
    }

    /// Replaces every child with `children`, in order.
    ///
    /// The consumer receives one non-incremental change set asking for a full
    /// reload instead of itemized removals and insertions. Nothing is changed
    /// if `children` is rejected.
    ///
    /// # Errors
    ///
    /// - [`CompositeError::DuplicateChild`] if `children` holds a child twice
    /// - [`CompositeError::AlreadyObserved`] if a new child reports to another
    ///   sink
    /// - [`CompositeError::SelfInsertion`] if `children` holds this composite
    ///   or a collection containing it
    pub fn replace(&self, children: Vec<Arc<dyn Collection<T>>>) -> Result<()> {
        self.check_unique(&children)?;
        let count = children.len();
        {
            let mut layout = self.layout.write();
            // Current children report to this composite and are released below.
            if children
                .iter()
                .any(|child| child.has_update_sink() && !layout.identity_index.contains_key(&ChildKey::of(child)))
            {
                return Err(CompositeError::AlreadyObserved);
            }
            layout.detach_all();
            for child in children {
                let at = layout.order.len();
                self.attach(&mut layout, child, at)?;
            }
            self.refresh(&mut layout);
        }

        tracing::debug!(
            target: targets::COMPOSITE,
            composite = self.name(),
            children = count,
            "replaced children"
        );
        self.emit_batched(ChangeSet::reload());
        Ok(())
    }

    /// Runs `f` inside the sink's batch bracket so that every notification
    /// it causes is applied as one transition.
    pub fn perform_batch(&self, f: impl FnOnce()) {
        let mut f = Some(f);
        self.forward_batch(&mut || {
            if let Some(f) = f.take() {
                f();
            }
        });
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.layout.read().order.len()
    }

    /// Returns the children in display order.
    pub fn children(&self) -> Vec<Arc<dyn Collection<T>>> {
        let layout = self.layout.read();
        layout
            .order
            .iter()
            .map(|&id| layout.mappings[id].child().clone())
            .collect()
    }

    /// Returns `true` if `child` is registered.
    pub fn contains<C: ?Sized>(&self, child: &Arc<C>) -> bool {
        self.layout
            .read()
            .identity_index
            .contains_key(&ChildKey::of(child))
    }

    /// Returns the display position of `child`.
    pub fn position_of<C: ?Sized>(&self, child: &Arc<C>) -> Option<usize> {
        let layout = self.layout.read();
        let id = *layout.identity_index.get(&ChildKey::of(child))?;
        layout.order.iter().position(|&other| other == id)
    }

    /// Returns the global sections `child` occupies.
    pub fn section_range_of<C: ?Sized>(&self, child: &Arc<C>) -> Option<Range<usize>> {
        let mut layout = self.layout.write();
        self.ensure_valid(&mut layout);
        layout
            .mapping_for(ChildKey::of(child))
            .map(Mapping::section_range)
    }

    /// Translates a coordinate of `child` into the global space.
    pub fn global_coordinate<C: ?Sized>(&self, child: &Arc<C>, local: Coordinate) -> Result<Coordinate> {
        let mut layout = self.layout.write();
        self.ensure_valid(&mut layout);
        layout
            .mapping_for(ChildKey::of(child))
            .map(|mapping| mapping.global_coordinate(local))
            .ok_or(CompositeError::NotAChild)
    }

    /// Resolves a global coordinate to the owning child and the matching
    /// local coordinate.
    pub fn local_coordinate(&self, global: Coordinate) -> Result<(Arc<dyn Collection<T>>, Coordinate)> {
        let mut layout = self.layout.write();
        self.ensure_valid(&mut layout);
        let (mapping, local) = layout.resolve(global.section)?;
        Ok((mapping.child().clone(), global.with_section(local)))
    }

    /// Returns the child owning global `section`.
    pub fn child_at_section(&self, section: usize) -> Option<Arc<dyn Collection<T>>> {
        self.local_coordinate(Coordinate::section(section))
            .ok()
            .map(|(child, _)| child)
    }

    /// Returns the element count of global `section`, reporting a corrupt
    /// or out-of-range section instead of panicking.
    pub fn try_number_of_elements(&self, section: usize) -> Result<usize> {
        let (child, local) = {
            let mut layout = self.layout.write();
            self.ensure_valid(&mut layout);
            let (mapping, local) = layout.resolve(section)?;
            (mapping.child().clone(), local)
        };
        Ok(child.number_of_elements(local))
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Rejects a child that is this composite or has it nested below.
    ///
    /// Runs without this composite's lock: a child containing it would read
    /// it back.
    fn check_not_ancestor(&self, child: &Arc<dyn Collection<T>>) -> Result<()> {
        let key = self.key();
        if ChildKey::of(child) == key || child.contains_descendant(key) {
            return Err(CompositeError::SelfInsertion);
        }
        Ok(())
    }

    /// Rejects a child list containing a repeated child or an ancestor of
    /// this composite.
    fn check_unique(&self, children: &[Arc<dyn Collection<T>>]) -> Result<()> {
        let mut seen = HashSet::with_capacity(children.len());
        for child in children {
            self.check_not_ancestor(child)?;
            if !seen.insert(ChildKey::of(child)) {
                return Err(CompositeError::DuplicateChild);
            }
        }
        Ok(())
    }

    /// Registers `child` at position `at`. The cache is left stale.
    fn attach(
        &self,
        layout: &mut Layout<T>,
        child: Arc<dyn Collection<T>>,
        at: usize,
    ) -> Result<MappingId> {
        let key = ChildKey::of(&child);
        if key == self.key() {
            return Err(CompositeError::SelfInsertion);
        }
        if layout.identity_index.contains_key(&key) {
            return Err(CompositeError::DuplicateChild);
        }
        if at > layout.order.len() {
            return Err(CompositeError::IndexOutOfBounds {
                index: at,
                count: layout.order.len(),
            });
        }
        if child.has_update_sink() {
            return Err(CompositeError::AlreadyObserved);
        }

        child.set_update_sink(Some(Arc::new(ChildSink {
            composite: self.this.clone(),
            key,
        })));
        let id = layout.mappings.insert(Mapping::new(child));
        layout.identity_index.insert(key, id);
        layout.order.insert(at, id);
        layout.mark_stale();
        Ok(id)
    }

    fn refresh(&self, layout: &mut Layout<T>) {
        layout.revalidate();
        if self.config.verify_invariants {
            if let Err(err) = layout.verify() {
                tracing::error!(target: targets::COMPOSITE, composite = self.name(), %err, "section cache corrupted");
                panic!("{err}");
            }
        }
    }

    fn ensure_valid(&self, layout: &mut Layout<T>) {
        if layout.cache == CacheState::Stale {
            self.refresh(layout);
        }
    }

    fn current_sink(&self) -> Option<Arc<dyn UpdateSink>> {
        self.sink.read().clone()
    }

    fn emit_changes(&self, changes: ChangeSet) {
        if let Some(sink) = self.current_sink() {
            sink.apply_changes(changes);
        }
    }

    fn emit_batched(&self, changes: ChangeSet) {
        let Some(sink) = self.current_sink() else {
            return;
        };
        let mut pending = Some(changes);
        sink.perform_batch(&mut || {
            if let Some(changes) = pending.take() {
                sink.apply_changes(changes);
            }
        });
    }

    fn forward_batch(&self, body: &mut dyn FnMut()) {
        match self.current_sink() {
            Some(sink) => sink.perform_batch(body),
            None => body(),
        }
    }

    fn child_did_change(&self, key: ChildKey, changes: ChangeSet) {
        let _span = PerfSpan::new(span_names::PROPAGATE);

        let forwarded = {
            let mut layout = self.layout.write();
            let Some(&id) = layout.identity_index.get(&key) else {
                tracing::warn!(target: targets::PROPAGATION, ?key, "dropping changes from an unregistered child");
                return;
            };

            // The child already reports its post-change count, so its own
            // range has to be rebuilt before anything is translated.
            if !changes.inserted_sections.is_empty() || !changes.has_incremental_changes {
                layout.mark_stale();
            }
            self.ensure_valid(&mut layout);

            let forwarded = layout.mappings[id].global_changes(&changes);

            // Removals were translated against the old layout; repair lazily.
            if !changes.removed_sections.is_empty() {
                layout.mark_stale();
            }
            forwarded
        };

        tracing::trace!(
            target: targets::PROPAGATION,
            inserted_sections = forwarded.inserted_sections.len(),
            removed_sections = forwarded.removed_sections.len(),
            incremental = forwarded.has_incremental_changes,
            "forwarding child changes"
        );
        self.emit_changes(forwarded);
    }

    fn child_did_invalidate(&self, key: ChildKey, context: InvalidationContext) {
        let forwarded = {
            let mut layout = self.layout.write();
            self.ensure_valid(&mut layout);
            match layout.mapping_for(key) {
                Some(mapping) => mapping.global_invalidation(&context),
                None => {
                    tracing::warn!(target: targets::PROPAGATION, ?key, "dropping invalidation from an unregistered child");
                    return;
                }
            }
        };

        if let Some(sink) = self.current_sink() {
            sink.invalidate(forwarded);
        }
    }
}

impl<T: 'static> Collection<T> for CompositeCollection<T> {
    fn number_of_sections(&self) -> usize {
        let mut layout = self.layout.write();
        self.ensure_valid(&mut layout);
        layout.section_index.len()
    }

    /// # Panics
    ///
    /// Panics with [`CompositeError::MappingCorruption`] if `section` has no
    /// owning child. Use [`CompositeCollection::try_number_of_elements`] for
    /// the checked form.
    fn number_of_elements(&self, section: usize) -> usize {
        match self.try_number_of_elements(section) {
            Ok(count) => count,
            Err(err) => {
                tracing::error!(target: targets::COMPOSITE, composite = self.name(), %err, "section lookup failed");
                panic!("{err}");
            }
        }
    }

    fn find(&self, predicate: &dyn Fn(&T) -> bool) -> Option<Coordinate> {
        let children = {
            let mut layout = self.layout.write();
            self.ensure_valid(&mut layout);
            layout.snapshot()
        };
        children.iter().find_map(|(child, offset)| {
            child
                .find(predicate)
                .map(|local| local.map_section(|section| section + offset))
        })
    }

    fn set_update_sink(&self, sink: Option<Arc<dyn UpdateSink>>) {
        *self.sink.write() = sink;
    }

    fn has_update_sink(&self) -> bool {
        self.sink.read().is_some()
    }

    fn contains_descendant(&self, key: ChildKey) -> bool {
        if self.layout.read().identity_index.contains_key(&key) {
            return true;
        }
        self.children().iter().any(|child| child.contains_descendant(key))
    }

    fn as_keyed(&self) -> Option<&dyn KeyedCollection> {
        Some(self)
    }
}

impl<T: 'static> KeyedCollection for CompositeCollection<T> {
    fn coordinate_for_key(&self, key: &str) -> Option<Coordinate> {
        let children = {
            let mut layout = self.layout.write();
            self.ensure_valid(&mut layout);
            layout.snapshot()
        };
        children.iter().find_map(|(child, offset)| {
            child
                .as_keyed()?
                .coordinate_for_key(key)
                .map(|local| local.map_section(|section| section + offset))
        })
    }

    fn key_at(&self, coordinate: Coordinate) -> Option<String> {
        let (child, local) = self.local_coordinate(coordinate).ok()?;
        child.as_keyed()?.key_at(local)
    }
}

impl<T: 'static> Drop for CompositeCollection<T> {
    fn drop(&mut self) {
        self.layout.get_mut().detach_all();
    }
}

impl<T: 'static> fmt::Debug for CompositeCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layout = self.layout.read();
        f.debug_struct("CompositeCollection")
            .field("name", &self.config.name)
            .field("children", &layout.order.len())
            .field("cache", &layout.cache)
            .finish()
    }
}

/// The sink a composite hands to each child.
///
/// Holds the composite weakly, so the registration never keeps the
/// composite alive, and remembers which child it was issued to.
struct ChildSink<T: 'static> {
    composite: Weak<CompositeCollection<T>>,
    key: ChildKey,
}

impl<T: 'static> UpdateSink for ChildSink<T> {
    fn apply_changes(&self, changes: ChangeSet) {
        if let Some(composite) = self.composite.upgrade() {
            composite.child_did_change(self.key, changes);
        }
    }

    fn invalidate(&self, context: InvalidationContext) {
        if let Some(composite) = self.composite.upgrade() {
            composite.child_did_invalidate(self.key, context);
        }
    }

    fn perform_batch(&self, body: &mut dyn FnMut()) {
        match self.composite.upgrade() {
            Some(composite) => composite.forward_batch(body),
            None => body(),
        }
    }
}

static_assertions::assert_impl_all!(CompositeCollection<String>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::SectionedList;

    fn list(counts: &[usize]) -> Arc<SectionedList<u32>> {
        Arc::new(SectionedList::new(
            counts.iter().map(|&n| (0..n as u32).collect()).collect(),
        ))
    }

    #[test]
    fn test_empty_composite() {
        let composite = CompositeCollection::<u32>::new();
        assert_eq!(composite.number_of_sections(), 0);
        assert_eq!(composite.child_count(), 0);
        assert!(composite.try_number_of_elements(0).is_err());
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let composite = CompositeCollection::<u32>::new();
        let err = composite.insert(list(&[1]), 1).unwrap_err();
        assert_eq!(err, CompositeError::IndexOutOfBounds { index: 1, count: 0 });
        assert_eq!(composite.child_count(), 0);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let composite = CompositeCollection::<u32>::new();
        let child = list(&[1, 2]);
        composite.append(child.clone()).unwrap();
        assert_eq!(composite.append(child.clone()), Err(CompositeError::DuplicateChild));
        assert_eq!(composite.number_of_sections(), 2);
    }

    #[test]
    fn test_remove_unknown_child() {
        let composite = CompositeCollection::<u32>::new();
        composite.append(list(&[1])).unwrap();
        assert_eq!(composite.remove(&list(&[1])), Err(CompositeError::NotAChild));
    }

    #[test]
    fn test_self_insertion_rejected() {
        let composite = CompositeCollection::<u32>::new();
        assert_eq!(
            composite.append(composite.clone()),
            Err(CompositeError::SelfInsertion)
        );
        assert_eq!(
            composite.replace(vec![composite.clone() as Arc<dyn Collection<u32>>]),
            Err(CompositeError::SelfInsertion)
        );
    }

    #[test]
    fn test_ancestor_insertion_rejected() {
        let outer = CompositeCollection::<u32>::new();
        let middle = CompositeCollection::<u32>::new();
        let inner = CompositeCollection::<u32>::new();
        middle.append(inner.clone()).unwrap();
        outer.append(middle.clone()).unwrap();

        assert!(outer.contains_descendant(ChildKey::of(&inner)));
        assert!(!inner.contains_descendant(ChildKey::of(&outer)));
        assert_eq!(inner.append(outer.clone()), Err(CompositeError::SelfInsertion));
        assert_eq!(
            inner.replace(vec![list(&[1]) as Arc<dyn Collection<u32>>, middle.clone()]),
            Err(CompositeError::SelfInsertion)
        );
        assert_eq!(inner.child_count(), 0);
        assert_eq!(outer.number_of_sections(), 0);
    }

    #[test]
    fn test_observed_child_rejected() {
        let first = CompositeCollection::<u32>::new();
        let second = CompositeCollection::<u32>::new();
        let child = list(&[1, 2]);
        first.append(child.clone()).unwrap();

        assert_eq!(second.append(child.clone()), Err(CompositeError::AlreadyObserved));
        assert!(!second.contains(&child));

        first.remove(&child).unwrap();
        second.append(child.clone()).unwrap();
        assert_eq!(second.number_of_sections(), 2);
    }

    #[test]
    fn test_layout_verifies_after_mutations() {
        let composite = CompositeCollection::<u32>::with_config(CompositeConfig::new().with_verify_invariants(true));
        let a = list(&[2, 0, 1]);
        let b = list(&[5]);
        let c = list(&[]);
        composite.append(a.clone()).unwrap();
        composite.insert(b.clone(), 0).unwrap();
        composite.insert(c.clone(), 1).unwrap();
        composite.remove(&b).unwrap();

        let layout = composite.layout.read();
        assert_eq!(layout.cache, CacheState::Valid);
        assert!(layout.verify().is_ok());
        assert_eq!(layout.section_index.len(), 3);
    }

    #[test]
    fn test_sections_resolve_to_owner() {
        let a = list(&[1, 1]);
        let b = list(&[3]);
        let composite = CompositeCollection::with_children([
            a.clone() as Arc<dyn Collection<u32>>,
            b.clone() as Arc<dyn Collection<u32>>,
        ])
        .unwrap();

        let owner = composite.child_at_section(2).unwrap();
        assert_eq!(ChildKey::of(&owner), ChildKey::of(&b));
        let (owner, local) = composite.local_coordinate(Coordinate::element(1, 0)).unwrap();
        assert_eq!(ChildKey::of(&owner), ChildKey::of(&a));
        assert_eq!(local, Coordinate::element(1, 0));
        assert!(composite.child_at_section(3).is_none());
    }

    #[test]
    fn test_drop_clears_child_sinks() {
        let child = list(&[1]);
        let composite = CompositeCollection::<u32>::new();
        composite.append(child.clone()).unwrap();
        assert!(child.has_update_sink());
        drop(composite);
        assert!(!child.has_update_sink());
    }

    #[test]
    #[should_panic(expected = "mapping corruption")]
    fn test_number_of_elements_out_of_range_panics() {
        let composite = CompositeCollection::<u32>::new();
        composite.append(list(&[1])).unwrap();
        composite.number_of_elements(1);
    }
}
