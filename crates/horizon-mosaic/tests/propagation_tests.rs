//! Integration tests for child-to-consumer notification forwarding.

mod common;

use std::sync::{Arc, Weak};

use common::{Event, RecordingSink, init_tracing, list};
use horizon_mosaic::collection::{
    ChangeSet, Collection, CollectionSignals, CompositeCollection, Coordinate,
    InvalidationContext, SectionedList, UpdateSink,
};
use parking_lot::Mutex;

/// `[b, a]` where `b` has one section of five elements and `a` has sections
/// of two, zero and one elements.
fn shifted_layout() -> (
    Arc<CompositeCollection<u32>>,
    Arc<SectionedList<u32>>,
    Arc<SectionedList<u32>>,
    Arc<RecordingSink>,
) {
    init_tracing();
    let composite = CompositeCollection::<u32>::new();
    let a = list(&[2, 0, 1]);
    let b = list(&[5]);
    composite.insert(a.clone(), 0).unwrap();
    composite.insert(b.clone(), 0).unwrap();

    let sink = RecordingSink::new();
    composite.set_update_sink(Some(sink.clone()));
    (composite, a, b, sink)
}

#[test]
fn test_element_insert_is_shifted_by_offset() {
    let (composite, a, _b, sink) = shifted_layout();

    assert!(a.insert_element(1, 0, 42));

    assert_eq!(
        sink.events(),
        vec![Event::Changes(
            ChangeSet::new().with_inserted_elements([Coordinate::element(2, 0)])
        )]
    );
    assert_eq!(composite.number_of_elements(2), 1);
}

#[test]
fn test_first_child_needs_no_shift() {
    let (_composite, _a, b, sink) = shifted_layout();

    b.modify(0, 4, |value| *value += 1);

    assert_eq!(
        sink.changes(),
        vec![ChangeSet::new().with_updated_elements([Coordinate::element(0, 4)])]
    );
}

#[test]
fn test_section_insert_revalidates_before_translating() {
    let (composite, a, b, sink) = shifted_layout();

    a.insert_section(3, vec![1, 2, 3]);
    assert_eq!(
        sink.take(),
        vec![Event::Changes(ChangeSet::new().with_inserted_sections([4]))]
    );
    assert_eq!(composite.number_of_sections(), 5);
    assert_eq!(composite.number_of_elements(4), 3);

    // `a` grew, so a section inserted into `b` must not be confused with it.
    b.push_section(vec![]);
    assert_eq!(
        sink.take(),
        vec![Event::Changes(ChangeSet::new().with_inserted_sections([1]))]
    );
    assert_eq!(composite.section_range_of(&a), Some(2..6));
}

#[test]
fn test_section_removal_uses_pre_removal_offsets() {
    let (composite, a, _b, sink) = shifted_layout();

    assert_eq!(a.remove_section(2), Some(vec![0]));

    assert_eq!(
        sink.changes(),
        vec![ChangeSet::new().with_removed_sections([3])]
    );
    assert_eq!(composite.number_of_sections(), 3);
    assert_eq!(composite.section_range_of(&a), Some(1..3));
}

#[test]
fn test_consumer_reads_post_change_layout() {
    struct ReadingSink {
        composite: Mutex<Weak<CompositeCollection<u32>>>,
        observed: Mutex<Vec<(usize, usize)>>,
    }

    impl UpdateSink for ReadingSink {
        fn apply_changes(&self, _changes: ChangeSet) {
            if let Some(composite) = self.composite.lock().upgrade() {
                let sections = composite.number_of_sections();
                self.observed.lock().push((sections, composite.total_elements()));
            }
        }

        fn invalidate(&self, _context: InvalidationContext) {}
    }

    let (composite, a, _b, _recorder) = shifted_layout();
    let sink = Arc::new(ReadingSink {
        composite: Mutex::new(Arc::downgrade(&composite)),
        observed: Mutex::new(Vec::new()),
    });
    composite.set_update_sink(Some(sink.clone()));

    a.remove_section(0);
    a.push_section(vec![7, 7, 7]);
    a.push_element(0, 1);

    assert_eq!(*sink.observed.lock(), vec![(3, 6), (4, 9), (4, 10)]);
}

#[test]
fn test_moves_are_translated() {
    let (_composite, a, _b, sink) = shifted_layout();

    assert!(a.move_element(Coordinate::element(0, 0), Coordinate::element(2, 1)));
    assert!(a.move_section(0, 2));

    assert_eq!(
        sink.changes(),
        vec![
            ChangeSet::new().with_moved_element(Coordinate::element(1, 0), Coordinate::element(3, 1)),
            ChangeSet::new().with_moved_section(1, 3),
        ]
    );
}

#[test]
fn test_invalidation_is_translated_without_changes() {
    let (composite, a, _b, sink) = shifted_layout();

    assert!(a.invalidate_element(0, 1));
    assert!(a.invalidate_header(2));
    assert!(a.invalidate_footer(1));

    assert_eq!(
        sink.events(),
        vec![
            Event::Invalidated(InvalidationContext::new().with_elements([Coordinate::element(1, 1)])),
            Event::Invalidated(InvalidationContext::new().with_headers([3])),
            Event::Invalidated(InvalidationContext::new().with_footers([2])),
        ]
    );
    assert_eq!(composite.number_of_sections(), 4);
}

#[test]
fn test_child_reload_is_forwarded_as_reload() {
    let (composite, a, _b, sink) = shifted_layout();

    a.set_sections(vec![vec![1]]);

    let changes = sink.changes();
    assert_eq!(changes.len(), 1);
    assert!(!changes[0].has_incremental_changes);
    assert_eq!(composite.number_of_sections(), 2);
    assert_eq!(composite.number_of_elements(1), 1);
}

#[test]
fn test_child_batch_is_bracketed() {
    let (_composite, a, _b, sink) = shifted_layout();

    a.batch(|| {
        a.push_section(vec![]);
        a.push_section(vec![]);
    });

    assert_eq!(
        sink.events(),
        vec![
            Event::BatchBegan,
            Event::Changes(ChangeSet::new().with_inserted_sections([4])),
            Event::Changes(ChangeSet::new().with_inserted_sections([5])),
            Event::BatchEnded,
        ]
    );
}

#[test]
fn test_removed_child_stops_propagating() {
    let (composite, a, _b, sink) = shifted_layout();
    composite.remove(&a).unwrap();
    sink.take();

    a.push_section(vec![1]);

    assert!(sink.events().is_empty());
    assert!(!a.has_update_sink());
    assert_eq!(composite.number_of_sections(), 1);
}

#[test]
fn test_changes_travel_through_nested_composites() {
    init_tracing();
    let leaf = list(&[1]);
    let inner = CompositeCollection::<u32>::new();
    inner.append(list(&[3, 3])).unwrap();
    inner.append(leaf.clone()).unwrap();

    let outer = CompositeCollection::<u32>::new();
    outer.append(list(&[9])).unwrap();
    outer.append(inner.clone()).unwrap();
    let sink = RecordingSink::new();
    outer.set_update_sink(Some(sink.clone()));

    leaf.insert_element(0, 1, 5);
    leaf.remove_section(0);

    assert_eq!(
        sink.changes(),
        vec![
            ChangeSet::new().with_inserted_elements([Coordinate::element(3, 1)]),
            ChangeSet::new().with_removed_sections([3]),
        ]
    );
    assert_eq!(outer.number_of_sections(), 3);
}

#[test]
fn test_keyed_lookup_through_composite() {
    fn names(sections: &[&[&str]]) -> Vec<Vec<String>> {
        sections
            .iter()
            .map(|section| section.iter().map(|name| name.to_string()).collect())
            .collect()
    }

    let first = Arc::new(SectionedList::with_key_extractor(names(&[&["ada"], &["bob"]]), String::clone));
    let second = Arc::new(SectionedList::with_key_extractor(names(&[&["cyd", "dee"]]), String::clone));
    let unkeyed = Arc::new(SectionedList::new(names(&[&["eve"]])));

    let composite = CompositeCollection::<String>::new();
    composite.append(unkeyed.clone()).unwrap();
    composite.append(first.clone()).unwrap();
    composite.append(second.clone()).unwrap();

    let keyed = composite.as_keyed().unwrap();
    assert_eq!(keyed.coordinate_for_key("dee"), Some(Coordinate::element(3, 1)));
    assert_eq!(keyed.coordinate_for_key("bob"), Some(Coordinate::element(2, 0)));
    assert_eq!(keyed.coordinate_for_key("eve"), None);
    assert_eq!(keyed.key_at(Coordinate::element(1, 0)).as_deref(), Some("ada"));
    assert_eq!(keyed.key_at(Coordinate::element(0, 0)), None);
}

#[test]
fn test_signals_observe_composite() {
    let (composite, a, _b, _recorder) = shifted_layout();
    let signals = CollectionSignals::attach(&*composite);

    let inserted = Arc::new(Mutex::new(Vec::new()));
    let seen = inserted.clone();
    signals.changes.connect(move |changes| {
        seen.lock().extend(changes.inserted_sections.iter().copied());
    });
    let brackets = Arc::new(Mutex::new(0));
    let count = brackets.clone();
    signals.batch_ended.connect(move |_| *count.lock() += 1);

    composite.append(list(&[1, 1])).unwrap();
    a.push_section(vec![]);
    composite.remove_all();

    assert_eq!(*inserted.lock(), vec![4, 5, 4]);
    assert_eq!(*brackets.lock(), 1);
    assert!(!signals.is_in_batch());
}

#[test]
fn test_concurrent_child_mutation_and_reads() {
    let (composite, a, _b, _sink) = shifted_layout();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for value in 0..200 {
                a.push_section(vec![value]);
            }
        });
        for _ in 0..200 {
            let sections = composite.number_of_sections();
            assert!((4..=204).contains(&sections));
        }
    });

    assert_eq!(composite.number_of_sections(), 204);
    assert_eq!(composite.section_range_of(&a), Some(1..204));
}
