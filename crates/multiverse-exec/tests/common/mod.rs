//! Shared utilities for integration tests

use multiverse_core::{BranchOption, BranchRegistry, Column, Dataset, Outcome};
use multiverse_exec::{Pipeline, Step};
use std::sync::Arc;

/// `filter` ∈ {all, positive}, `model` ∈ {mean, median}
pub fn registry() -> BranchRegistry {
    let mut registry = BranchRegistry::new();
    registry
        .declare("filter", [BranchOption::new("all"), BranchOption::new("positive")])
        .unwrap();
    registry
        .declare("model", [BranchOption::new("mean"), BranchOption::new("median")])
        .unwrap();
    registry
}

pub fn dataset() -> Arc<Dataset> {
    Arc::new(
        Dataset::new(vec![
            Column::float("y", [-2.0, 1.0, 3.0, 4.0, -1.0, 6.0]),
            Column::integer("group", [1, 1, 2, 2, 3, 3]),
        ])
        .unwrap(),
    )
}

/// Pipeline that filters rows, then fits a location model
pub fn pipeline() -> Pipeline {
    Pipeline::new()
        .step(Step::branch("filter", "filter", |state, option| {
            if option.name() == "positive" {
                let keep: Vec<bool> = state.data().numeric("y")?.iter().map(|v| *v > 0.0).collect();
                let filtered = state.data().filter_rows(&keep)?;
                state.replace_data(filtered);
            }
            Ok(())
        }))
        .step(
            Step::variants("model", "model")
                .variant("mean", "mean(y)", |state| {
                    let y = state.data().numeric("y")?;
                    let mean = y.iter().sum::<f64>() / y.len() as f64;
                    state.record(Outcome::normal("location", mean, 1.0));
                    Ok(())
                })
                .variant("median", "median(y)", |state| {
                    let mut y = state.data().numeric("y")?;
                    y.sort_by(f64::total_cmp);
                    let n = y.len();
                    let median = if n % 2 == 0 {
                        (y[n / 2 - 1] + y[n / 2]) / 2.0
                    } else {
                        y[n / 2]
                    };
                    state.record(Outcome::normal("location", median, 1.0));
                    Ok(())
                }),
        )
}
