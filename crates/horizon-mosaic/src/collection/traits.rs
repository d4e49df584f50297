//! Core traits for sectioned collections.
//!
//! A [`Collection`] reports how many sections it has and how many elements
//! each section holds, and can search its elements. An [`UpdateSink`]
//! receives the change notifications a collection produces. A composite is
//! both: it implements `Collection` over the union of its children and acts as
//! each child's `UpdateSink`.

use std::sync::Arc;

use super::change_set::{ChangeSet, InvalidationContext};
use super::coordinate::Coordinate;
use super::identity::ChildKey;

/// A source of sectioned data.
///
/// Implementations must report counts consistent with the notifications they
/// send to their update sink: by the time a [`ChangeSet`] is delivered, the
/// counts already reflect it.
///
/// # Example
///
/// ```
/// use horizon_mosaic::collection::{Collection, Coordinate, UpdateSink};
/// use std::sync::Arc;
///
/// struct Fixed(Vec<Vec<u32>>);
///
/// impl Collection<u32> for Fixed {
///     fn number_of_sections(&self) -> usize {
///         self.0.len()
///     }
///
///     fn number_of_elements(&self, section: usize) -> usize {
///         self.0.get(section).map_or(0, Vec::len)
///     }
///
///     fn find(&self, predicate: &dyn Fn(&u32) -> bool) -> Option<Coordinate> {
///         self.0.iter().enumerate().find_map(|(s, items)| {
///             items.iter().position(predicate).map(|i| Coordinate::element(s, i))
///         })
///     }
///
///     fn set_update_sink(&self, _sink: Option<Arc<dyn UpdateSink>>) {
///         // Immutable data never notifies.
///     }
/// }
///
/// let fixed = Fixed(vec![vec![1, 2], vec![], vec![3]]);
/// assert_eq!(fixed.total_elements(), 3);
/// assert_eq!(fixed.find(&|item| *item == 3), Some(Coordinate::element(2, 0)));
/// assert!(!fixed.has_update_sink());
/// ```
pub trait Collection<T>: Send + Sync {
    /// Returns the number of sections.
    fn number_of_sections(&self) -> usize;

    /// Returns the number of elements in `section`.
    fn number_of_elements(&self, section: usize) -> usize;

    /// Returns the coordinate of the first element matching `predicate`,
    /// searching sections in order.
    fn find(&self, predicate: &dyn Fn(&T) -> bool) -> Option<Coordinate>;

    /// Registers (or clears, with `None`) the sink that receives this
    /// collection's change notifications.
    ///
    /// A collection reports to at most one sink; registering a new one
    /// replaces the previous registration.
    fn set_update_sink(&self, sink: Option<Arc<dyn UpdateSink>>);

    /// Returns `true` if a sink is registered.
    ///
    /// Composites refuse a child that already reports somewhere else. The
    /// default returns `false`, which suits collections that never notify.
    fn has_update_sink(&self) -> bool {
        false
    }

    /// Returns `true` if the collection with `key` is nested somewhere below
    /// this one.
    ///
    /// Only collections that hold other collections need to override this.
    fn contains_descendant(&self, _key: ChildKey) -> bool {
        false
    }

    /// Returns the keyed lookup view, if supported.
    ///
    /// The default returns `None`.
    fn as_keyed(&self) -> Option<&dyn KeyedCollection> {
        None
    }

    /// Returns the number of elements across all sections.
    fn total_elements(&self) -> usize {
        (0..self.number_of_sections())
            .map(|section| self.number_of_elements(section))
            .sum()
    }
}

/// Receiver of change notifications from a [`Collection`].
///
/// Coordinates in everything delivered to a sink are expressed in the
/// coordinate space of the collection the sink is registered with.
pub trait UpdateSink: Send + Sync {
    /// Applies a batch of structural changes.
    fn apply_changes(&self, changes: ChangeSet);

    /// Applies a batch of presentational invalidations.
    fn invalidate(&self, context: InvalidationContext);

    /// Runs `body`, treating every notification it produces as one
    /// transition.
    ///
    /// The default simply runs the body.
    fn perform_batch(&self, body: &mut dyn FnMut()) {
        body();
    }
}

/// Optional capability: lookup of elements by a stable string key.
///
/// Collections expose it through [`Collection::as_keyed`].
pub trait KeyedCollection {
    /// Returns the coordinate of the element with `key`, if any.
    fn coordinate_for_key(&self, key: &str) -> Option<Coordinate>;

    /// Returns the key of the element at `coordinate`, if any.
    fn key_at(&self, coordinate: Coordinate) -> Option<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<usize>);

    impl Collection<()> for Fixed {
        fn number_of_sections(&self) -> usize {
            self.0.len()
        }

        fn number_of_elements(&self, section: usize) -> usize {
            self.0.get(section).copied().unwrap_or(0)
        }

        fn find(&self, _predicate: &dyn Fn(&()) -> bool) -> Option<Coordinate> {
            None
        }

        fn set_update_sink(&self, _sink: Option<Arc<dyn UpdateSink>>) {}
    }

    #[test]
    fn test_default_total_elements() {
        assert_eq!(Fixed(vec![2, 0, 1]).total_elements(), 3);
        assert_eq!(Fixed(vec![]).total_elements(), 0);
    }

    #[test]
    fn test_default_not_keyed() {
        assert!(Fixed(vec![1]).as_keyed().is_none());
    }

    #[test]
    fn test_default_leaf_has_no_sink_or_descendants() {
        let fixed = Fixed(vec![1]);
        assert!(!fixed.has_update_sink());
        assert!(!fixed.contains_descendant(ChildKey::of(&Arc::new(()))));
    }

    #[test]
    fn test_default_batch_runs_body() {
        struct Null;
        impl UpdateSink for Null {
            fn apply_changes(&self, _changes: ChangeSet) {}
            fn invalidate(&self, _context: InvalidationContext) {}
        }

        let mut ran = false;
        Null.perform_batch(&mut || ran = true);
        assert!(ran);
    }
}
