//! Signal-backed update sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use horizon_mosaic_core::Signal;

use super::change_set::{ChangeSet, InvalidationContext};
use super::traits::{Collection, UpdateSink};

/// An [`UpdateSink`] that re-emits every notification on a [`Signal`].
///
/// This is the display-adapter end of a collection pipeline: register it as
/// the sink of the outermost collection and connect views to its signals.
///
/// Batch brackets nest. Only the outermost bracket emits `batch_began` and
/// `batch_ended`; inner brackets are absorbed into it.
///
/// # Example
///
/// ```
/// use horizon_mosaic::collection::{CollectionSignals, SectionedList};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let list = SectionedList::<u8>::empty();
/// let signals = CollectionSignals::attach(&list);
///
/// let inserted = Arc::new(AtomicUsize::new(0));
/// let counter = inserted.clone();
/// signals.changes.connect(move |changes| {
///     counter.fetch_add(changes.inserted_sections.len(), Ordering::SeqCst);
/// });
///
/// list.push_section(vec![1, 2]);
/// assert_eq!(inserted.load(Ordering::SeqCst), 1);
/// ```
pub struct CollectionSignals {
    /// Emitted for every structural change set.
    pub changes: Signal<ChangeSet>,
    /// Emitted for every presentational invalidation.
    pub invalidated: Signal<InvalidationContext>,
    /// Emitted when the outermost batch bracket opens.
    pub batch_began: Signal<()>,
    /// Emitted when the outermost batch bracket closes.
    pub batch_ended: Signal<()>,
    batch_depth: AtomicUsize,
}

impl Default for CollectionSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionSignals {
    /// Creates an unattached set of signals.
    pub fn new() -> Self {
        Self {
            changes: Signal::new(),
            invalidated: Signal::new(),
            batch_began: Signal::new(),
            batch_ended: Signal::new(),
            batch_depth: AtomicUsize::new(0),
        }
    }

    /// Creates signals and registers them as `collection`'s sink.
    pub fn attach<T, C>(collection: &C) -> Arc<Self>
    where
        C: Collection<T> + ?Sized,
    {
        let signals = Arc::new(Self::new());
        collection.set_update_sink(Some(signals.clone()));
        signals
    }

    /// Returns `true` while a batch bracket is open.
    pub fn is_in_batch(&self) -> bool {
        self.batch_depth.load(Ordering::SeqCst) > 0
    }
}

impl UpdateSink for CollectionSignals {
    fn apply_changes(&self, changes: ChangeSet) {
        self.changes.emit(changes);
    }

    fn invalidate(&self, context: InvalidationContext) {
        self.invalidated.emit(context);
    }

    fn perform_batch(&self, body: &mut dyn FnMut()) {
        if self.batch_depth.fetch_add(1, Ordering::SeqCst) == 0 {
            self.batch_began.emit(());
        }
        body();
        if self.batch_depth.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.batch_ended.emit(());
        }
    }
}

static_assertions::assert_impl_all!(CollectionSignals: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_forwards_changes_and_invalidations() {
        let signals = CollectionSignals::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_changes = seen.clone();
        signals.changes.connect(move |changes| {
            seen_changes.lock().push(format!("changes {}", changes.inserted_sections.len()));
        });
        let seen_invalidations = seen.clone();
        signals.invalidated.connect(move |context| {
            seen_invalidations
                .lock()
                .push(format!("invalidated {}", context.invalidated_header_sections.len()));
        });

        signals.apply_changes(ChangeSet::new().with_inserted_sections(0..3));
        signals.invalidate(InvalidationContext::new().with_headers([1]));
        assert_eq!(*seen.lock(), vec!["changes 3", "invalidated 1"]);
    }

    #[test]
    fn test_nested_batches_bracket_once() {
        let signals = Arc::new(CollectionSignals::new());
        let events = Arc::new(Mutex::new(Vec::new()));

        let began = events.clone();
        signals.batch_began.connect(move |_| began.lock().push("began"));
        let ended = events.clone();
        signals.batch_ended.connect(move |_| ended.lock().push("ended"));

        let inner = signals.clone();
        signals.perform_batch(&mut || {
            assert!(inner.is_in_batch());
            inner.perform_batch(&mut || {});
        });

        assert!(!signals.is_in_batch());
        assert_eq!(*events.lock(), vec!["began", "ended"]);
    }
}
