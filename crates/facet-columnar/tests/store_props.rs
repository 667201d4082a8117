use facet_columnar::{BuildParams, ColumnStore, FieldDescriptor, StoreBuilder, Value, ValueType};
use facet_intset::IntSet;
use proptest::prelude::*;
use std::sync::Arc;

/// Rows over a small value alphabet so filters and partitions hit plenty of
/// collisions.
fn rows() -> impl Strategy<Value = Vec<(u8, u8)>> {
    proptest::collection::vec((0u8..4, 0u8..3), 0..64)
}

fn build(rows: &[(u8, u8)]) -> Arc<ColumnStore> {
    let mut builder = StoreBuilder::new(
        vec![
            FieldDescriptor::new("k", ValueType::String),
            FieldDescriptor::new("n", ValueType::Number),
        ],
        BuildParams::default(),
    )
    .unwrap();
    for (k, n) in rows {
        builder
            .add_row(vec![
                Value::from(format!("k{k}")),
                Value::from(f64::from(*n)),
            ])
            .unwrap();
    }
    Arc::new(builder.finish().unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn filtering_matches_a_row_scan(data in rows(), k in 0u8..4) {
        let store = build(&data);
        let view = store.filter_value("k", format!("k{k}")).unwrap();
        let expected: Vec<u32> = data
            .iter()
            .enumerate()
            .filter(|(_, (rk, _))| *rk == k)
            .map(|(i, _)| i as u32)
            .collect();
        prop_assert_eq!(view.int_set().iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn repeated_filters_are_idempotent(data in rows(), k in 0u8..4) {
        let store = build(&data);
        let once = store.filter_value("k", format!("k{k}")).unwrap();
        let twice = once.filter_value("k", format!("k{k}")).unwrap();
        prop_assert_eq!(once.int_set(), twice.int_set());
        prop_assert_eq!(once.filters(), twice.filters());
    }

    #[test]
    fn filter_composition_commutes(data in rows(), k in 0u8..4, n in 0u8..3) {
        let store = build(&data);
        let ab = store
            .filter_value("k", format!("k{k}")).unwrap()
            .filter_value("n", f64::from(n)).unwrap();
        let ba = store
            .filter_value("n", f64::from(n)).unwrap()
            .filter_value("k", format!("k{k}")).unwrap();
        prop_assert_eq!(ab.int_set(), ba.int_set());
    }

    #[test]
    fn partitions_tile_the_store(data in rows()) {
        let store = build(&data);
        let parts = store.partition("k").unwrap();

        let sets: Vec<IntSet> = parts.values().map(|v| v.int_set().clone()).collect();
        prop_assert_eq!(IntSet::union_all(sets.iter()), store.int_set());

        for (i, a) in sets.iter().enumerate() {
            for b in &sets[i + 1..] {
                prop_assert!(a.intersection(b).is_empty());
            }
        }

        // No partition is empty, and sizes add up to the row count.
        let total: usize = sets.iter().map(IntSet::len).sum();
        prop_assert_eq!(total, store.size());
        prop_assert!(sets.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn remove_filter_round_trips(data in rows(), k in 0u8..4) {
        let store = build(&data);
        let filter = facet_columnar::Filter::value("k", format!("k{k}"));
        let view = store.filter(filter.clone()).unwrap();
        let restored = view.remove_filter(&filter).unwrap();
        prop_assert_eq!(restored.int_set(), &store.int_set());
    }
}
