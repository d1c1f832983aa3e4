//! Warehouse stock store tests
//!
//! Tests for the lock-ordering of (item, warehouse) pairs taken before a
//! batch mutates the ledger.

use std::collections::HashSet;

use proptest::prelude::*;
use uuid::Uuid;

use stock_backend::services::transaction::{affected_pairs, CartLine, ResolvedLine};

fn line(item: Uuid, source: Option<Uuid>, destination: Option<Uuid>) -> ResolvedLine {
    ResolvedLine {
        line: CartLine {
            item_id: item,
            source,
            destination,
        },
        quantity: rust_decimal::Decimal::ONE,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_transfer_line_touches_both_warehouses() {
        let item = Uuid::new_v4();
        let source = Uuid::new_v4();
        let destination = Uuid::new_v4();

        let pairs = affected_pairs(&[line(item, Some(source), Some(destination))]);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&(item, source)));
        assert!(pairs.contains(&(item, destination)));
    }

    #[test]
    fn test_pairs_deduplicated() {
        let item = Uuid::new_v4();
        let warehouse = Uuid::new_v4();
        let lines = vec![
            line(item, None, Some(warehouse)),
            line(item, None, Some(warehouse)),
            line(item, None, Some(warehouse)),
        ];

        assert_eq!(affected_pairs(&lines), vec![(item, warehouse)]);
    }

    #[test]
    fn test_pairs_sorted() {
        let lines: Vec<ResolvedLine> = (0..10)
            .map(|_| line(Uuid::new_v4(), Some(Uuid::new_v4()), None))
            .collect();

        let pairs = affected_pairs(&lines);
        let mut sorted = pairs.clone();
        sorted.sort();
        assert_eq!(pairs, sorted);
    }

}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn uuid_pool(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The lock set is the same no matter how the cart lines are
        /// ordered, so two concurrent batches over the same pairs always
        /// acquire row locks in the same sequence.
        #[test]
        fn prop_lock_order_independent_of_cart_order(
            picks in prop::collection::vec((0usize..4, 0usize..4), 1..12),
            rotation in 0usize..12
        ) {
            let items = uuid_pool(4);
            let warehouses = uuid_pool(4);

            let mut lines: Vec<ResolvedLine> = picks
                .iter()
                .map(|(i, w)| line(items[*i], Some(warehouses[*w]), None))
                .collect();

            let baseline = affected_pairs(&lines);
            let len = lines.len().max(1);
            lines.rotate_left(rotation % len);
            prop_assert_eq!(affected_pairs(&lines), baseline);
        }

        /// Every pair a line touches appears exactly once in the lock set,
        /// and nothing else does.
        #[test]
        fn prop_lock_set_is_exactly_touched_pairs(
            picks in prop::collection::vec((0usize..4, 0usize..4, 0usize..4), 1..12)
        ) {
            let items = uuid_pool(4);
            let warehouses = uuid_pool(4);

            let lines: Vec<ResolvedLine> = picks
                .iter()
                .map(|(i, s, d)| {
                    line(items[*i], Some(warehouses[*s]), Some(warehouses[*d]))
                })
                .collect();

            let mut expected = HashSet::new();
            for l in &lines {
                if let Some(w) = l.line.source {
                    expected.insert((l.line.item_id, w));
                }
                if let Some(w) = l.line.destination {
                    expected.insert((l.line.item_id, w));
                }
            }

            let pairs = affected_pairs(&lines);
            let unique: HashSet<_> = pairs.iter().copied().collect();
            prop_assert_eq!(unique.len(), pairs.len(), "duplicate pair in lock set");
            prop_assert_eq!(unique, expected);
        }
    }
}
