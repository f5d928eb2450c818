//! Universe expansion
//!
//! Parameters are processed in declaration order while maintaining a
//! frontier of partial assignments, starting from a single empty one. Each
//! partial assignment is extended by every option (in declared order) whose
//! condition holds for it. An assignment for which no option of some
//! parameter is valid simply contributes no universes.

use crate::registry::BranchRegistry;
use crate::universe::{Assignment, UniverseSet};
use crate::Result;
use tracing::{debug, instrument};

/// Expand a registry into its deterministically ordered universe set.
///
/// The first-declared parameter varies slowest, matching nested iteration.
/// With no conditions the result is exactly the Cartesian product.
#[instrument(skip(registry), fields(parameters = registry.len()))]
pub fn expand(registry: &BranchRegistry) -> Result<UniverseSet> {
    let mut frontier = vec![Assignment::new()];

    for parameter in registry.parameters() {
        let mut next = Vec::with_capacity(frontier.len() * parameter.options().len());
        for partial in &frontier {
            for option in parameter.options() {
                let valid = match option.condition() {
                    Some(condition) => condition.evaluate(partial)?,
                    None => true,
                };
                if valid {
                    next.push(partial.extended(parameter.name(), option.name()));
                }
            }
        }
        debug!(
            parameter = parameter.name(),
            before = frontier.len(),
            after = next.len(),
            "expanded frontier"
        );
        frontier = next;
    }

    debug!(
        universes = frontier.len(),
        cartesian = registry.cartesian_size(),
        "expansion complete"
    );
    Ok(UniverseSet::from_assignments(frontier))
}
