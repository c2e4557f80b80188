use crate::*;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::num::NonZeroUsize;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        start + (self.next_u64() % (end_exclusive - start) as u64) as usize
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

fn list_cache() -> MeasurementCache {
    MeasurementCache::new(CacheOptions::default()).unwrap()
}

fn grid_cache(columns: usize) -> MeasurementCache {
    MeasurementCache::new(CacheOptions::with_columns(columns).unwrap()).unwrap()
}

fn row(index: usize) -> Position {
    Position::new(index, 0)
}

fn sorted<K: Ord>(mut v: Vec<K>) -> Vec<K> {
    v.sort();
    v
}

/// Seeds a reconciler with `keys` and measures each key with the given height.
fn seeded(
    cache: &mut MeasurementCache,
    keys: &[&'static str],
    heights: &[f32],
) -> Reconciler<&'static str> {
    let mut r = Reconciler::new();
    r.reconcile(cache, keys.iter().copied(), Sentinel::None);
    for (i, &h) in heights.iter().enumerate() {
        cache.set(cache.position_of(i), 50.0, h).unwrap();
    }
    r
}

#[test]
fn position_is_derived_from_index_and_column_count() {
    let three = NonZeroUsize::new(3).unwrap();
    assert_eq!(Position::from_index(0, three), Position::new(0, 0));
    assert_eq!(Position::from_index(4, three), Position::new(1, 1));
    assert_eq!(Position::from_index(8, three), Position::new(2, 2));
    assert_eq!(Position::new(2, 1).to_index(three), 7);

    let one = NonZeroUsize::MIN;
    assert_eq!(Position::from_index(5, one), Position::new(5, 0));
}

#[test]
fn zero_columns_are_rejected() {
    assert_eq!(
        CacheOptions::with_columns(0),
        Err(CacheError::InvalidOptions("column_count must be at least 1"))
    );
}

#[test]
fn non_positive_placeholder_is_rejected() {
    let opts = CacheOptions::default().with_default_size(100.0, 0.0);
    assert!(matches!(
        MeasurementCache::new(opts),
        Err(CacheError::InvalidOptions(_))
    ));
    let opts = CacheOptions::default().with_default_size(f32::NAN, 1.0);
    assert!(MeasurementCache::new(opts).is_err());
}

#[test]
fn unmeasured_slots_report_positive_placeholder() {
    let cache = list_cache();
    let size = cache.get(row(1234));
    assert_eq!(size, Size::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));
    assert!(size.height > 0.0);
    assert!(!cache.is_measured(row(1234)));
    assert_eq!(cache.entry(row(1234)), MeasurementEntry::UNMEASURED);
}

#[test]
fn set_then_get_round_trips_exactly() {
    let mut cache = grid_cache(2);
    let mut rng = Lcg::new(7);
    for i in 0..64 {
        let w = (rng.next_u64() % 10_000) as f32 / 7.0;
        let h = (rng.next_u64() % 10_000) as f32 / 3.0 + 0.5;
        let p = cache.position_of(i);
        cache.set(p, w, h).unwrap();
        assert_eq!(cache.get(p), Size::new(w, h));
    }
    cache.set(row(0), 0.0, 0.0).unwrap();
    assert_eq!(cache.get(row(0)), Size::new(0.0, 0.0));
    assert!(cache.is_measured(row(0)));
}

#[test]
fn invalid_measurements_are_rejected_and_leave_slot_untouched() {
    let mut cache = list_cache();
    cache.set(row(3), 10.0, 20.0).unwrap();

    for (w, h) in [
        (-1.0, 5.0),
        (5.0, -0.5),
        (f32::NAN, 5.0),
        (5.0, f32::INFINITY),
    ] {
        let err = cache.set(row(3), w, h).unwrap_err();
        assert!(matches!(err, CacheError::InvalidMeasurement { position, .. } if position == row(3)));
        assert_eq!(cache.get(row(3)), Size::new(10.0, 20.0));
    }

    assert!(cache.set(row(4), -3.0, 1.0).is_err());
    assert!(!cache.is_measured(row(4)));
}

#[test]
fn clear_is_idempotent_and_keeps_slot_readable() {
    let mut cache = list_cache();
    cache.set(row(2), 30.0, 40.0).unwrap();
    cache.set(row(5), 30.0, 50.0).unwrap();

    cache.clear(row(2));
    let once = (cache.entry(row(2)), cache.get(row(5)), cache.measured_len());
    cache.clear(row(2));
    let twice = (cache.entry(row(2)), cache.get(row(5)), cache.measured_len());
    assert_eq!(once, twice);
    assert_eq!(cache.get(row(2)), cache.placeholder());

    cache.clear(row(5));
    cache.clear(row(99));
    assert_eq!(cache.measured_len(), 0);
    assert_eq!(cache.get(row(5)).height, DEFAULT_HEIGHT);
}

#[test]
fn far_positions_are_stored_without_growing_storage() {
    let mut cache = grid_cache(2);
    let far = Position::new(usize::MAX / 4, 1);
    cache.set(far, 10.0, 12.0).unwrap();
    assert_eq!(cache.get(far), Size::new(10.0, 12.0));
    assert_eq!(cache.measured_len(), 1);
    assert_eq!(cache.column_width(1), 10.0);

    let mut list = list_cache();
    list.set(row(usize::MAX / 2), 5.0, 6.0).unwrap();
    assert_eq!(list.height(row(usize::MAX / 2)), 6.0);
    list.clear(row(usize::MAX / 2));
    assert_eq!(list.measured_len(), 0);
}

#[test]
fn row_height_is_tallest_cell_in_row() {
    let mut cache = grid_cache(3);
    assert_eq!(cache.row_height(0), DEFAULT_HEIGHT);

    cache.set(Position::new(0, 0), 10.0, 12.0).unwrap();
    cache.set(Position::new(0, 2), 10.0, 30.0).unwrap();
    assert_eq!(cache.row_height(0), 30.0);
    assert_eq!(cache.row_height(1), DEFAULT_HEIGHT);

    cache.set(Position::new(1, 1), 80.0, 5.0).unwrap();
    assert_eq!(cache.column_width(1), 80.0);
    assert_eq!(cache.column_width(2), 10.0);
    assert_eq!(cache.column_width(5), DEFAULT_WIDTH);
}

#[test]
fn overscan_indices_clamp_to_sequence() {
    assert_eq!(
        overscan_indices(5, 8, 10, 100),
        Some(OverscanIndices {
            overscan_start_index: 0,
            overscan_stop_index: 18,
        })
    );
    assert_eq!(
        overscan_indices(90, 99, 10, 100),
        Some(OverscanIndices {
            overscan_start_index: 80,
            overscan_stop_index: 99,
        })
    );
    assert_eq!(overscan_indices(0, 0, 10, 0), None);
}

#[test]
fn registry_maps_keys_to_first_occurrence() {
    let reg = IdentityRegistry::from_keys(["a", "b", "a", "c"]);
    assert_eq!(reg.len(), 4);
    assert_eq!(reg.index_of(&"a"), Some(0));
    assert_eq!(reg.index_of(&"c"), Some(3));
    assert_eq!(reg.index_of(&"z"), None);
    assert_eq!(reg.key_at(1), Some(&"b"));
    assert!(reg.same_order(["a", "b", "a", "c"].iter()));
    assert!(!reg.same_order(["a", "b", "a"].iter()));
    assert!(!reg.same_order(["a", "b", "a", "c", "d"].iter()));
}

#[test]
fn first_pass_only_records_baseline() {
    let mut cache = list_cache();
    cache.set(row(0), 10.0, 10.0).unwrap();
    let mut r = Reconciler::new();
    let report = r.reconcile(&mut cache, ["a", "b"], Sentinel::None);
    assert_eq!(report, ReconcileReport::default());
    assert!(r.is_initialized());
    assert_eq!(cache.height(row(0)), 10.0);
}

#[test]
fn reorder_migrates_measurements_with_keys() {
    let mut cache = list_cache();
    let mut r = seeded(&mut cache, &["A", "B", "C"], &[10.0, 20.0, 30.0]);

    let report = r.reconcile(&mut cache, ["C", "A", "B"], Sentinel::None);

    assert_eq!(cache.height(row(r.slot_of_key(&"C").unwrap())), 30.0);
    assert_eq!(cache.height(row(r.slot_of_key(&"A").unwrap())), 10.0);
    assert_eq!(cache.height(row(r.slot_of_key(&"B").unwrap())), 20.0);
    assert_eq!(report.moved, 3);
    assert_eq!(report.migrated, 3);
    assert_eq!(report.removed, 0);
    assert_eq!(
        report.relayout,
        Relayout::Positions(vec![row(0), row(1), row(2)])
    );
}

#[test]
fn deletion_clears_slot_and_migrates_by_key() {
    let mut cache = list_cache();
    let mut r = seeded(&mut cache, &["A", "B", "C"], &[10.0, 20.0, 30.0]);

    let report = r.reconcile(&mut cache, ["A", "C"], Sentinel::None);

    assert_eq!(report.removed, 1);
    assert_eq!(report.moved, 1);
    assert_eq!(cache.height(row(0)), 10.0);
    assert_eq!(cache.height(row(1)), 30.0);
    assert!(!cache.is_measured(row(2)));
    assert_eq!(cache.get(row(2)), cache.placeholder());
}

#[test]
fn unmeasured_entries_are_not_migrated() {
    let mut cache = list_cache();
    let mut r = Reconciler::new();
    r.reconcile(&mut cache, ["A", "B"], Sentinel::None);
    cache.set(row(1), 50.0, 20.0).unwrap();

    // A (unmeasured) moves to 1, B (measured) moves to 0.
    let report = r.reconcile(&mut cache, ["B", "A"], Sentinel::None);
    assert_eq!(report.moved, 2);
    assert_eq!(report.migrated, 1);
    assert_eq!(cache.height(row(0)), 20.0);
    assert!(!cache.is_measured(row(1)));
}

#[test]
fn insertion_shifts_following_measurements() {
    let mut cache = list_cache();
    let mut r = seeded(&mut cache, &["A", "B"], &[10.0, 20.0]);

    r.reconcile(&mut cache, ["A", "X", "B"], Sentinel::None);
    assert_eq!(cache.height(row(0)), 10.0);
    assert!(!cache.is_measured(row(1)));
    assert_eq!(cache.height(row(2)), 20.0);
}

#[test]
fn unchanged_order_is_a_no_op() {
    let mut cache = list_cache();
    let mut r = seeded(&mut cache, &["A", "B"], &[10.0, 20.0]);
    let report = r.reconcile(&mut cache, ["A", "B"], Sentinel::None);
    assert_eq!(report, ReconcileReport::default());
    assert!(report.relayout.is_none());
}

#[test]
fn pure_append_without_sentinel_needs_no_relayout() {
    let mut cache = list_cache();
    let mut r = seeded(&mut cache, &["A", "B"], &[10.0, 20.0]);
    let report = r.reconcile(&mut cache, ["A", "B", "C"], Sentinel::None);
    assert!(report.relayout.is_none());
    assert_eq!(cache.height(row(1)), 20.0);
}

#[test]
fn trailing_sentinel_slot_is_cleared_on_append() {
    let mut cache = list_cache();
    let mut r = Reconciler::new();
    r.reconcile(&mut cache, ["A", "B"], Sentinel::Trailing);
    assert_eq!(r.slot_count(), 3);
    assert_eq!(r.slot(2), Some(Slot::Sentinel));
    cache.set(row(0), 50.0, 10.0).unwrap();
    cache.set(row(2), 50.0, 44.0).unwrap(); // loader row

    let report = r.reconcile(&mut cache, ["A", "B", "C"], Sentinel::Trailing);

    assert!(!cache.is_measured(row(2)));
    assert_eq!(cache.height(row(0)), 10.0);
    assert_eq!(report.relayout, Relayout::Positions(vec![row(2)]));
    assert_eq!(r.slot(3), Some(Slot::Sentinel));
}

#[test]
fn leading_sentinel_offsets_items_and_prepend_migrates() {
    let mut cache = list_cache();
    let mut r = Reconciler::new();
    r.reconcile(&mut cache, ["m3", "m4"], Sentinel::Leading);
    assert_eq!(r.slot(0), Some(Slot::Sentinel));
    assert_eq!(r.key_at_slot(1), Some(&"m3"));
    cache.set(row(0), 50.0, 40.0).unwrap(); // loader row
    cache.set(row(1), 50.0, 13.0).unwrap();
    cache.set(row(2), 50.0, 14.0).unwrap();

    // An older page is prepended; index 0 holds the newest-loaded item.
    r.reconcile(&mut cache, ["m1", "m2", "m3", "m4"], Sentinel::Leading);

    assert!(!cache.is_measured(row(0)));
    assert!(!cache.is_measured(row(1)));
    assert!(!cache.is_measured(row(2)));
    assert_eq!(cache.height(row(3)), 13.0);
    assert_eq!(cache.height(row(4)), 14.0);
}

#[test]
fn sentinel_removal_in_reverse_mode_shifts_every_item() {
    let mut cache = list_cache();
    let mut r = Reconciler::new();
    r.reconcile(&mut cache, ["a", "b"], Sentinel::Leading);
    cache.set(row(1), 50.0, 11.0).unwrap();
    cache.set(row(2), 50.0, 22.0).unwrap();

    let report = r.reconcile(&mut cache, ["a", "b"], Sentinel::None);
    assert_eq!(report.moved, 2);
    assert_eq!(cache.height(row(0)), 11.0);
    assert_eq!(cache.height(row(1)), 22.0);
    assert!(!cache.is_measured(row(2)));
    assert_eq!(r.slot_count(), 2);
}

#[test]
fn grid_reorder_moves_between_columns() {
    let mut cache = grid_cache(2);
    let mut r = seeded(&mut cache, &["a", "b", "c"], &[10.0, 20.0, 30.0]);

    r.reconcile(&mut cache, ["c", "b", "a"], Sentinel::None);
    assert_eq!(cache.height(Position::new(0, 0)), 30.0);
    assert_eq!(cache.height(Position::new(0, 1)), 20.0);
    assert_eq!(cache.height(Position::new(1, 0)), 10.0);
    assert_eq!(cache.row_height(0), 30.0);
}

#[test]
fn duplicate_targets_do_not_panic() {
    let mut cache = list_cache();
    let mut r = Reconciler::new();
    r.reconcile(&mut cache, ["a", "a", "b"], Sentinel::None);
    cache.set(row(0), 50.0, 1.5).unwrap();
    cache.set(row(1), 50.0, 2.5).unwrap();

    // Both prior "a" slots map to the single "a" in the new order.
    r.reconcile(&mut cache, ["b", "a"], Sentinel::None);
    assert!(!cache.is_measured(row(0)));
    let h = cache.height(row(1));
    assert!(h == 1.5 || h == 2.5);
    assert_eq!(r.slot_count(), 2);
}

#[test]
fn randomized_reconciliation_keeps_measurements_with_keys() {
    let mut rng = Lcg::new(0x5eed);
    for columns in [1usize, 3] {
        let mut cache = grid_cache(columns);
        let mut r = Reconciler::<u32>::new();
        let mut keys: Vec<u32> = (0..40).collect();
        let mut next_key = 40u32;
        r.reconcile(&mut cache, keys.iter().copied(), Sentinel::None);

        let mut heights: Vec<(u32, f32)> = Vec::new();
        for _ in 0..50 {
            // Measure a few random slots.
            for _ in 0..5 {
                if keys.is_empty() {
                    break;
                }
                let i = rng.gen_range_usize(0, keys.len());
                let h = 2.0 + rng.gen_range_usize(0, 500) as f32;
                cache.set(cache.position_of(i), 10.0, h).unwrap();
                heights.retain(|(k, _)| *k != keys[i]);
                heights.push((keys[i], h));
            }

            // Mutate: remove, insert, swap.
            if !keys.is_empty() && rng.gen_bool() {
                let i = rng.gen_range_usize(0, keys.len());
                let removed = keys.remove(i);
                heights.retain(|(k, _)| *k != removed);
            }
            if rng.gen_bool() {
                let i = rng.gen_range_usize(0, keys.len() + 1);
                keys.insert(i, next_key);
                next_key += 1;
            }
            if keys.len() > 1 {
                let a = rng.gen_range_usize(0, keys.len());
                let b = rng.gen_range_usize(0, keys.len());
                keys.swap(a, b);
            }

            r.reconcile(&mut cache, keys.iter().copied(), Sentinel::None);

            for (i, key) in keys.iter().enumerate() {
                let p = cache.position_of(i);
                match heights.iter().find(|(k, _)| k == key) {
                    Some(&(_, h)) => assert_eq!(cache.height(p), h, "key {key} at {i}"),
                    None => assert!(!cache.is_measured(p), "key {key} at {i}"),
                }
            }
            assert_eq!(cache.measured_len(), heights.len());
        }
    }
}

#[test]
fn update_cache_prefers_index_then_key() {
    let mut cache = list_cache();
    let r = seeded(&mut cache, &["A", "B", "C"], &[10.0, 20.0, 30.0]);

    let p = r
        .update_cache(&mut cache, &UpdateTarget::by_key("B").with_index(2))
        .unwrap();
    assert_eq!(p, row(2));
    assert!(!cache.is_measured(row(2)));
    assert_eq!(cache.height(row(1)), 20.0);

    // Out-of-range index falls back to the key.
    let p = r
        .update_cache(&mut cache, &UpdateTarget::by_index(9).with_key("A"))
        .unwrap();
    assert_eq!(p, row(0));
}

#[test]
fn update_cache_unknown_target_fails_without_touching_cache() {
    let mut cache = list_cache();
    let r = seeded(&mut cache, &["A", "B"], &[10.0, 20.0]);
    let before: Vec<Size> = (0..3).map(|i| cache.get(row(i))).collect();

    let err = r
        .update_cache(&mut cache, &UpdateTarget::by_key("Z"))
        .unwrap_err();
    assert_eq!(
        err,
        CacheError::ItemNotFound {
            key: Some(String::from("\"Z\"")),
            index: None,
        }
    );
    assert!(r.update_cache(&mut cache, &UpdateTarget::by_index(2)).is_err());

    let after: Vec<Size> = (0..3).map(|i| cache.get(row(i))).collect();
    assert_eq!(before, after);
}

#[test]
fn update_cache_accounts_for_leading_sentinel() {
    let mut cache = list_cache();
    let mut r = Reconciler::new();
    r.reconcile(&mut cache, ["a", "b"], Sentinel::Leading);
    cache.set(row(2), 50.0, 9.0).unwrap();
    let p = r
        .update_cache(&mut cache, &UpdateTarget::by_key("b"))
        .unwrap();
    assert_eq!(p, row(2));
    assert!(!cache.is_measured(row(2)));
}

#[test]
fn relayout_merge_unions_positions() {
    let mut a = Relayout::None;
    a.merge(Relayout::Positions(vec![row(3), row(1)]));
    a.merge(Relayout::Positions(vec![row(1), row(2)]));
    assert_eq!(
        a,
        Relayout::Positions(vec![row(1), row(2), row(3)])
    );
    a.merge(Relayout::Full);
    assert_eq!(a, Relayout::Full);
    a.merge(Relayout::None);
    assert_eq!(a, Relayout::Full);
}

fn bridge_with_visible(keys: &[&'static str]) -> ResizeBridge<&'static str> {
    let mut b = ResizeBridge::new(1000);
    let change = b.on_range_rendered(keys.iter().copied(), keys.iter().copied());
    assert_eq!(sorted(change.observe), sorted(keys.to_vec()));
    b
}

#[test]
fn first_attached_callback_is_initial_layout() {
    let mut b = bridge_with_visible(&["a"]);
    assert_eq!(b.state(&"a"), Some(ObservationState::InitialPending));

    b.on_resize([ResizedNode::attached("a")]);
    assert_eq!(b.state(&"a"), Some(ObservationState::Settled));
    let work = b.on_frame(0, |_| true);
    assert!(work.is_empty());
    assert_eq!(b.pending_len(), 0);
}

#[test]
fn detached_nodes_are_ignored() {
    let mut b = bridge_with_visible(&["a"]);
    b.on_resize([ResizedNode::detached("a")]);
    assert_eq!(b.state(&"a"), Some(ObservationState::InitialPending));

    b.on_resize([ResizedNode::attached("a")]);
    b.on_resize([ResizedNode::detached("a")]);
    assert!(b.on_frame(0, |_| true).is_empty());

    b.on_resize([ResizedNode {
        key: None,
        attached: true,
    }]);
    assert!(b.on_frame(1, |_| true).is_empty());
}

#[test]
fn settled_resize_is_deferred_to_next_frame() {
    let mut b = bridge_with_visible(&["a", "b"]);
    b.on_resize([ResizedNode::attached("a"), ResizedNode::attached("b")]);

    b.on_resize([
        ResizedNode::attached("a"),
        ResizedNode::attached("a"),
    ]);
    assert_eq!(b.pending_len(), 0);

    let work = b.on_frame(100, |_| true);
    assert_eq!(work.resized, vec!["a"]);
    assert!(work.drained.is_empty());
    assert!(b.is_pending(&"a"));
    assert_eq!(b.deadline_ms(), Some(1100));
}

#[test]
fn relayout_echo_does_not_reenter_same_batch() {
    let mut b = bridge_with_visible(&["a"]);
    b.on_resize([ResizedNode::attached("a")]);
    b.on_resize([ResizedNode::attached("a")]);
    let work = b.on_frame(0, |_| true);
    assert_eq!(work.resized, vec!["a"]);

    // The relayout issued for "a" makes the host report it again before the next frame.
    b.on_resize([ResizedNode::attached("a")]);
    assert!(b.on_frame(16, |_| true).resized.is_empty());

    // A later genuine resize is picked up again.
    b.on_resize([ResizedNode::attached("a")]);
    assert_eq!(b.on_frame(32, |_| true).resized, vec!["a"]);
}

#[test]
fn trailing_timer_drains_off_screen_keys_only() {
    let mut b = bridge_with_visible(&["a", "b", "c"]);
    b.on_resize([
        ResizedNode::attached("a"),
        ResizedNode::attached("b"),
        ResizedNode::attached("c"),
    ]);
    b.on_resize([
        ResizedNode::attached("a"),
        ResizedNode::attached("b"),
        ResizedNode::attached("c"),
    ]);
    let work = b.on_frame(0, |_| true);
    assert_eq!(sorted(work.resized), vec!["a", "b", "c"]);
    assert_eq!(b.pending_len(), 3);

    // Scroll so that only "c" stays within the overscan window.
    let change = b.on_range_rendered(["c"], ["c", "d"]);
    assert_eq!(sorted(change.unobserve), vec!["a", "b"]);

    assert!(b.on_frame(999, |_| true).is_empty());
    let work = b.on_frame(1000, |k| *k != "b");
    assert_eq!(work.drained, vec!["a"]);
    assert_eq!(b.pending_len(), 0);
    assert_eq!(b.deadline_ms(), None);
}

#[test]
fn scroll_rearms_timer_only_while_pending() {
    let mut b = bridge_with_visible(&["a"]);
    b.on_scroll(5);
    assert_eq!(b.deadline_ms(), None);

    b.on_resize([ResizedNode::attached("a")]);
    b.on_resize([ResizedNode::attached("a")]);
    b.on_frame(0, |_| true);
    assert_eq!(b.deadline_ms(), Some(1000));
    b.on_scroll(800);
    assert_eq!(b.deadline_ms(), Some(1800));
    b.on_range_rendered(["z"], ["z"]);
    assert!(b.on_frame(1000, |_| true).is_empty());
    assert_eq!(b.on_frame(1800, |_| true).drained, vec!["a"]);
}

#[test]
fn queued_resize_for_removed_key_is_dropped() {
    let mut b = bridge_with_visible(&["a"]);
    b.on_resize([ResizedNode::attached("a")]);
    b.on_resize([ResizedNode::attached("a")]);
    let work = b.on_frame(0, |_| false);
    assert!(work.is_empty());
    assert_eq!(b.observed_len(), 0);
}

#[test]
fn retain_live_and_disconnect_bound_state() {
    let mut b = bridge_with_visible(&["a", "b"]);
    b.on_resize([ResizedNode::attached("a"), ResizedNode::attached("b")]);
    b.on_resize([ResizedNode::attached("a"), ResizedNode::attached("b")]);
    b.on_frame(0, |_| true);
    assert_eq!(b.pending_len(), 2);

    b.retain_live(|k| *k == "b");
    assert_eq!(b.observed_len(), 1);
    assert_eq!(b.pending_len(), 1);
    assert!(b.deadline_ms().is_some());

    b.disconnect();
    assert_eq!(b.observed_len(), 0);
    assert_eq!(b.pending_len(), 0);
    assert_eq!(b.deadline_ms(), None);
}

#[test]
fn remounted_key_starts_over_as_initial() {
    let mut b = bridge_with_visible(&["a"]);
    b.on_resize([ResizedNode::attached("a")]);
    b.on_range_rendered(["x"], ["x"]);
    assert_eq!(b.state(&"a"), None);

    let change = b.on_range_rendered(["a"], ["a"]);
    assert_eq!(change.observe, vec!["a"]);
    assert_eq!(b.state(&"a"), Some(ObservationState::InitialPending));
}

#[test]
fn pagination_guards_concurrent_loads() {
    let mut p = Pagination::new(true);
    let first = p.on_sentinel_visibility(true);
    assert!(first.is_some());
    assert!(p.on_sentinel_visibility(true).is_none());
    assert!(p.state().is_loading);

    assert!(p.finish(first.unwrap(), LoadOutcome::Loaded));
    assert!(!p.is_loading());
}

#[test]
fn pagination_stops_when_exhausted() {
    let mut p = Pagination::new(true);
    let t = p.on_sentinel_visibility(true).unwrap();
    p.set_has_more(false);
    p.finish(t, LoadOutcome::Loaded);

    assert_eq!(
        p.state(),
        LoaderState {
            is_loading: false,
            has_more: false,
        }
    );
    assert!(!p.is_rearmed());
    assert!(p.on_frame().is_none());
    assert!(p.on_sentinel_visibility(true).is_none());
}

#[test]
fn pagination_rearms_while_sentinel_visible() {
    let mut p = Pagination::new(true);
    let t = p.on_sentinel_visibility(true).unwrap();
    p.finish(t, LoadOutcome::Loaded);
    assert!(p.is_rearmed());

    let t2 = p.on_frame().unwrap();
    assert_ne!(t, t2);
    p.finish(t2, LoadOutcome::Loaded);

    // The page filled the viewport: sentinel scrolled out before the frame.
    p.on_sentinel_visibility(false);
    assert!(p.on_frame().is_none());
}

#[test]
fn pagination_failure_returns_to_idle_without_retry() {
    let mut p = Pagination::new(true);
    let t = p.on_sentinel_visibility(true).unwrap();
    p.finish(t, LoadOutcome::Failed);

    assert!(!p.is_loading());
    assert!(p.has_more());
    assert!(p.on_frame().is_none());
    assert!(p.on_sentinel_visibility(true).is_some());
}

#[test]
fn pagination_ignores_stale_ticket() {
    let mut p = Pagination::new(true);
    let t = p.on_sentinel_visibility(true).unwrap();
    p.finish(t, LoadOutcome::Failed);
    let t2 = p.on_sentinel_visibility(true).unwrap();

    assert!(!p.finish(t, LoadOutcome::Loaded));
    assert_eq!(p.phase(), LoadPhase::Loading(t2));
}

#[test]
fn pagination_without_more_data_never_loads() {
    let mut p = Pagination::default();
    assert!(p.on_sentinel_visibility(true).is_none());
    assert!(!p.is_loading());
}
