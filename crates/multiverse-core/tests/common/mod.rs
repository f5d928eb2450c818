//! Shared utilities for integration tests

use multiverse_core::{BranchOption, BranchRegistry, Condition};

/// Registry with `counts[i]` options for parameter `p{i}`, no conditions
pub fn unconditioned(counts: &[usize]) -> BranchRegistry {
    let mut registry = BranchRegistry::new();
    for (i, &n) in counts.iter().enumerate() {
        let name = format!("p{i}");
        let options: Vec<_> = (0..n)
            .map(|j| BranchOption::new(format!("{name}_o{j}")))
            .collect();
        registry.declare(name, options).unwrap();
    }
    registry
}

/// Registry in which option `j` of parameter `p{i}` (i > 0) is valid only
/// when the previous parameter chose an option with the same parity,
/// selected by `mask` bit `(i, j)`.
pub fn parity_conditioned(counts: &[usize], mask: u64) -> BranchRegistry {
    let mut registry = BranchRegistry::new();
    let mut bit = 0u32;
    for (i, &n) in counts.iter().enumerate() {
        let name = format!("p{i}");
        let mut options = Vec::with_capacity(n);
        for j in 0..n {
            let mut option = BranchOption::new(format!("{name}_o{j}"));
            if i > 0 && mask & (1u64 << (bit % 64)) != 0 {
                let prev = format!("p{}", i - 1);
                let same_parity = (0..counts[i - 1])
                    .filter(|k| k % 2 == j % 2)
                    .map(|k| Condition::is(prev.clone(), format!("{prev}_o{k}")));
                option = option.when(Condition::any(same_parity));
            }
            bit += 1;
            options.push(option);
        }
        registry.declare(name, options).unwrap();
    }
    registry
}
