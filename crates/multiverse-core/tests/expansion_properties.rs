//! Property-based tests for universe expansion

mod common;

use multiverse_core::{expand, BranchRegistry};
use proptest::prelude::*;
use std::collections::HashSet;

fn every_condition_holds(registry: &BranchRegistry, universe: &multiverse_core::Universe) -> bool {
    registry.parameters().iter().all(|parameter| {
        let chosen = universe.choice(parameter.name()).unwrap();
        let option = parameter.option(chosen).unwrap();
        option
            .condition()
            .map_or(true, |c| c.evaluate(universe.assignment()).unwrap())
    })
}

proptest! {
    // Property: without conditions the universe count is the product of option counts
    #[test]
    fn prop_unconditioned_count_is_product(counts in prop::collection::vec(1usize..5, 0..5)) {
        let registry = common::unconditioned(&counts);
        let universes = expand(&registry).unwrap();
        let expected: usize = counts.iter().product();
        prop_assert_eq!(universes.len(), expected);
    }

    // Property: every emitted universe satisfies every condition it triggers
    #[test]
    fn prop_conditions_always_satisfied(
        counts in prop::collection::vec(1usize..4, 1..5),
        mask in any::<u64>()
    ) {
        let registry = common::parity_conditioned(&counts, mask);
        let universes = expand(&registry).unwrap();
        prop_assert!(universes.len() <= registry.cartesian_size());
        for universe in &universes {
            prop_assert_eq!(universe.assignment().len(), registry.len());
            prop_assert!(every_condition_holds(&registry, universe));
        }
    }

    // Property: identifiers are dense 1..=N, mappings are unique, and
    // repeated expansion is identical
    #[test]
    fn prop_ids_dense_unique_and_stable(
        counts in prop::collection::vec(1usize..4, 1..5),
        mask in any::<u64>()
    ) {
        let registry = common::parity_conditioned(&counts, mask);
        let first = expand(&registry).unwrap();
        let second = expand(&registry).unwrap();

        let ids: Vec<usize> = first.ids().collect();
        prop_assert_eq!(ids, (1..=first.len()).collect::<Vec<_>>());

        let distinct: HashSet<_> = first.iter().map(|u| u.assignment().clone()).collect();
        prop_assert_eq!(distinct.len(), first.len());

        prop_assert_eq!(first, second);
    }
}

#[test]
fn test_pruned_set_is_subset_of_product_in_same_order() {
    // Filtering the full product by the conditions must reproduce the
    // expansion exactly, order included.
    let counts = [3, 2, 3];
    let registry = common::parity_conditioned(&counts, u64::MAX);
    let pruned = expand(&registry).unwrap();

    let unconditioned = common::unconditioned(&counts);
    let full = expand(&unconditioned).unwrap();
    let filtered: Vec<_> = full
        .iter()
        .filter(|u| every_condition_holds(&registry, u))
        .map(|u| u.assignment().clone())
        .collect();

    let expanded: Vec<_> = pruned.iter().map(|u| u.assignment().clone()).collect();
    assert_eq!(expanded, filtered);
}
