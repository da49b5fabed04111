//! Property-based tests for sorting, selection and aggregation

use cadastre_core::{
    aggregate, sort, ActiveView, Direction, RawUnit, SelectionState, SortKey, SortRule, UnitStore,
};
use proptest::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeSet;

// ============================================================
// Strategies
// ============================================================

fn raw_unit() -> impl Strategy<Value = RawUnit> {
    (
        prop_oneof![Just("BJ"), Just("0"), Just("1"), Just("2"), Just("x")],
        prop_oneof![Just("A"), Just("B"), Just("")],
        prop_oneof![Just("1"), Just("2"), Just("")],
        prop_oneof![Just("V"), Just("C"), Just("A"), Just("G"), Just("?")],
        prop::option::of(0u32..500),
    )
        .prop_map(|(floor, door, stair, usage, area)| RawUnit {
            planta: Some(floor.to_string()),
            puerta: Some(door.to_string()),
            escalera: Some(stair.to_string()),
            clave_grupo_bice_o_uso: Some(usage.to_string()),
            sup_inmueble_construido: area.map(f64::from),
            ..Default::default()
        })
}

fn store() -> impl Strategy<Value = UnitStore> {
    prop::collection::vec(raw_unit(), 0..40).prop_map(UnitStore::from_raw)
}

fn sort_keys() -> Vec<SortKey> {
    vec![
        SortKey::canonical(),
        SortKey::new().then(SortRule::Floor(Direction::Descending)),
        SortKey::new()
            .then(SortRule::Door(Direction::Ascending))
            .then(SortRule::Floor(Direction::Ascending)),
        SortKey::new().then(SortRule::Kind(Direction::Ascending)),
        SortKey::new()
            .then(SortRule::Stair(Direction::Descending))
            .then(SortRule::Area(Direction::Ascending)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // ============================================================
    // Sorting
    // ============================================================

    #[test]
    fn sort_is_stable_for_every_key(store in store()) {
        for key in sort_keys() {
            let sorted = sort(store.records(), &key);
            prop_assert_eq!(sorted.len(), store.len());
            for (i, a) in sorted.iter().enumerate() {
                for b in &sorted[i + 1..] {
                    prop_assert_ne!(key.compare(a, b), Ordering::Greater);
                    if key.compare(a, b) == Ordering::Equal {
                        prop_assert!(a.original_index < b.original_index);
                    }
                }
            }
        }
    }

    #[test]
    fn sorted_view_is_a_permutation(store in store()) {
        let view = ActiveView::sorted(&store, &SortKey::canonical());
        let seen: BTreeSet<usize> = view.indices().iter().copied().collect();
        prop_assert_eq!(seen, store.indices().collect::<BTreeSet<_>>());
    }

    // ============================================================
    // Selection
    // ============================================================

    #[test]
    fn double_toggle_restores_membership(
        initial in prop::collection::btree_set(0usize..50, 0..20),
        index in 0usize..50
    ) {
        let state: SelectionState = initial.iter().copied().collect();
        let twice = state.toggle(index).toggle(index);
        prop_assert_eq!(twice.indices(), state.indices());
    }

    #[test]
    fn range_select_adds_exactly_the_span(
        store in store(),
        initial in prop::collection::btree_set(0usize..40, 0..10),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>()
    ) {
        prop_assume!(!store.is_empty());
        let view = ActiveView::sorted(&store, &SortKey::canonical());
        let pa = a.index(view.len());
        let pb = b.index(view.len());
        let anchor = view.indices()[pa];
        let target = view.indices()[pb];

        let before: SelectionState = initial.iter().copied().collect();
        let anchored = before.toggle(anchor);
        let after = anchored.range_select(target, &view);

        let span: BTreeSet<usize> =
            view.indices()[pa.min(pb)..=pa.max(pb)].iter().copied().collect();
        let expected: BTreeSet<usize> = anchored.indices().union(&span).copied().collect();
        prop_assert_eq!(after.indices(), &expected);
        prop_assert_eq!(after.last_touched(), Some(target));
    }

    // ============================================================
    // Aggregation
    // ============================================================

    #[test]
    fn aggregate_totals_match_selected_records(
        store in store(),
        picks in prop::collection::vec(any::<bool>(), 40)
    ) {
        let selected: BTreeSet<usize> = store
            .indices()
            .filter(|&i| picks[i])
            .collect();
        let agg = aggregate(store.records(), &selected);

        let expected_area: f64 = selected.iter().map(|&i| store.records()[i].built_area).sum();
        prop_assert_eq!(agg.count, selected.len());
        prop_assert_eq!(agg.total_area, expected_area);
        prop_assert_eq!(agg.by_kind.values().map(|t| t.count).sum::<usize>(), agg.count);
        let by_kind_area: f64 = agg.by_kind.values().map(|t| t.area).sum();
        prop_assert!((by_kind_area - agg.total_area).abs() < 1e-6);
    }
}

#[test]
fn range_select_scenario_from_view_positions() {
    // View [i0, i1, i2, i3] with i1 as anchor; shift-click on i3.
    let view = ActiveView::from_indices(vec![7, 3, 5, 1]);
    let state: SelectionState = [9].into_iter().collect();
    let state = state.toggle(3).range_select(1, &view);
    assert_eq!(
        state.indices().iter().copied().collect::<Vec<_>>(),
        vec![1, 3, 5, 9]
    );
}
