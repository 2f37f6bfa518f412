//! Property tests for the order-insensitive comparisons.

use mockalchemy::prelude::*;
use mockalchemy::{Comparator, normalize_call};
use proptest::prelude::*;

fn criteria(values: &[i64]) -> Vec<Expr> {
    values.iter().map(|v| Expr::col("column").eq(*v)).collect()
}

proptest! {
    #[test]
    fn unordered_tuple_ignores_permutation(
        items in prop::collection::vec(0i64..20, 0..12),
        seed in any::<u64>(),
    ) {
        let mut shuffled = items.clone();
        let len = shuffled.len();
        if len > 1 {
            // rotate plus swap keeps every element exactly once
            let rotation = (seed as usize) % len;
            shuffled.rotate_left(rotation);
            shuffled.swap(0, len - 1);
        }
        prop_assert!(UnorderedTuple::new(items.clone()) == shuffled);
        prop_assert!(UnorderedTuple::new(shuffled) == UnorderedTuple::new(items));
    }

    #[test]
    fn unordered_tuple_counts_duplicates(
        items in prop::collection::vec(0i64..5, 1..10),
        extra in 0i64..5,
    ) {
        let mut longer = items.clone();
        longer.push(extra);
        prop_assert!(UnorderedTuple::new(items.clone()) != longer);

        let mut replaced = items.clone();
        replaced[0] = replaced[0] + 10;
        prop_assert!(UnorderedTuple::new(items) != replaced);
    }

    #[test]
    fn filter_calls_ignore_argument_order(
        values in prop::collection::vec(0i64..100, 1..6),
    ) {
        let mut reversed = values.clone();
        reversed.reverse();

        let recorded = Call::new("filter").with_args(criteria(&values));
        let expected = Call::new("filter").with_args(criteria(&reversed));
        prop_assert_eq!(
            normalize_call(&recorded, true, Comparator::Unordered),
            normalize_call(&expected, true, Comparator::Ordered)
        );
    }

    #[test]
    fn matcher_equality_follows_rendering(a in -50i64..50, b in -50i64..50) {
        let left = ExpressionMatcher::new(Expr::col("column").eq(a));
        let right = ExpressionMatcher::new(Expr::col("column").eq(b));
        prop_assert_eq!(left == right, a == b);
    }
}

#[test]
fn duplicate_counts_matter() {
    assert!(UnorderedTuple::new([1, 1, 2]) != [1, 2, 2]);
    assert!(UnorderedTuple::new([1, 2, 2]) == [2, 1, 2]);
}
