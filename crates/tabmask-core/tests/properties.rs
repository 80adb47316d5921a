//! Property tests for key discovery, merge cardinality and transforms

use proptest::prelude::*;
use tabmask_core::transform::mask_name;
use tabmask_core::{intersect, merge_tables, Cell, Table, TransformKind, TransformRegistry, CATALOG};

fn keyed_table(value_column: &str, keys: &[Option<u8>]) -> Table {
    let mut table = Table::new(["key", value_column]);
    for (i, key) in keys.iter().enumerate() {
        let key = key.map_or(Cell::Missing, |k| Cell::Integer(i64::from(k)));
        table.push_row(vec![key, Cell::Integer(i as i64)]);
    }
    table
}

fn expected_outer_rows(left: &[Option<u8>], right: &[Option<u8>]) -> usize {
    // Missing keys match each other like any other key
    let matches = |k: &Option<u8>| right.iter().filter(|r| *r == k).count();
    let left_rows: usize = left.iter().map(|k| matches(k).max(1)).sum();
    let unmatched_right = right.iter().filter(|r| !left.contains(r)).count();
    left_rows + unmatched_right
}

proptest! {
    #[test]
    fn intersect_is_commutative(
        a in prop::collection::vec("[a-e]{1,2}", 0..8),
        b in prop::collection::vec("[a-e]{1,2}", 0..8),
    ) {
        prop_assert_eq!(intersect(&a, &b), intersect(&b, &a));
    }

    #[test]
    fn merge_has_outer_join_cardinality(
        left in prop::collection::vec(prop::option::weighted(0.9, 0u8..4), 0..10),
        right in prop::collection::vec(prop::option::weighted(0.9, 0u8..4), 0..10),
    ) {
        let merged = merge_tables(&keyed_table("l", &left), &keyed_table("r", &right), "key").unwrap();

        prop_assert_eq!(merged.row_count(), expected_outer_rows(&left, &right));
        prop_assert!(merged.row_count() >= left.len().max(right.len()));

        // Every input row shows up by its value column
        for i in 0..left.len() {
            prop_assert!(merged.column_values("l").unwrap().contains(&&Cell::Integer(i as i64)));
        }
        for i in 0..right.len() {
            prop_assert!(merged.column_values("r").unwrap().contains(&&Cell::Integer(i as i64)));
        }
    }

    #[test]
    fn name_mask_preserves_length(name in "\\PC{0,8}") {
        let masked = mask_name(&name);
        let len = name.chars().count();
        prop_assert_eq!(masked.chars().count(), len);
        if !(2..=4).contains(&len) {
            prop_assert_eq!(masked, name);
        } else {
            prop_assert!(masked.ends_with('*'));
        }
    }

    #[test]
    fn transforms_are_deterministic(raw in "\\PC{0,12}") {
        let registry = TransformRegistry::new().with_salt("s3cret");
        let cell = Cell::parse(&raw);
        for entry in CATALOG {
            prop_assert_eq!(registry.apply(entry.kind, &cell), registry.apply(entry.kind, &cell));
        }
    }

    #[test]
    fn hash_is_64_lowercase_hex(raw in "\\PC{1,12}") {
        let registry = TransformRegistry::new();
        let cell = Cell::Text(raw);
        match registry.apply(TransformKind::HashSha256, &cell) {
            Cell::Text(digest) => {
                prop_assert_eq!(digest.len(), 64);
                prop_assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            }
            other => prop_assert!(false, "unexpected cell {:?}", other),
        }
    }
}
