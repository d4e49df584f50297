//! Shared helpers for the collection integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use horizon_mosaic::collection::{ChangeSet, InvalidationContext, SectionedList, UpdateSink};
use parking_lot::Mutex;

/// Installs a test-friendly subscriber; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A leaf whose sections hold `counts[i]` elements numbered from zero.
pub fn list(counts: &[usize]) -> Arc<SectionedList<u32>> {
    Arc::new(SectionedList::new(
        counts.iter().map(|&n| (0..n as u32).collect()).collect(),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Changes(ChangeSet),
    Invalidated(InvalidationContext),
    BatchBegan,
    BatchEnded,
}

/// An update sink recording everything it receives, in order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Only the change sets, in order.
    pub fn changes(&self) -> Vec<ChangeSet> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::Changes(changes) => Some(changes.clone()),
                _ => None,
            })
            .collect()
    }
}

impl UpdateSink for RecordingSink {
    fn apply_changes(&self, changes: ChangeSet) {
        self.events.lock().push(Event::Changes(changes));
    }

    fn invalidate(&self, context: InvalidationContext) {
        self.events.lock().push(Event::Invalidated(context));
    }

    fn perform_batch(&self, body: &mut dyn FnMut()) {
        self.events.lock().push(Event::BatchBegan);
        body();
        self.events.lock().push(Event::BatchEnded);
    }
}
