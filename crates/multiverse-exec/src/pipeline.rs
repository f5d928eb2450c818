//! Ordered analysis pipelines

use crate::step::{Step, StepKind};
use multiverse_core::{BranchRegistry, Error, Result, Universe};
use tracing::debug;

/// Ordered list of steps executed once per universe
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn step(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Append a step in place
    pub fn push(&mut self, step: impl Into<Step>) {
        self.steps.push(step.into());
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Check the pipeline against the declared parameters.
    ///
    /// Every parameter-dependent step must name a declared parameter, and a
    /// variant step must have exactly one body for each of its options.
    pub fn validate(&self, registry: &BranchRegistry) -> Result<()> {
        for step in &self.steps {
            let Some(parameter_name) = step.parameter() else {
                continue;
            };
            let parameter = registry
                .parameter(parameter_name)
                .ok_or_else(|| Error::UnknownParameter(parameter_name.to_string()))?;

            if let StepKind::Variants { variants, .. } = step.kind() {
                for (i, variant) in variants.iter().enumerate() {
                    if parameter.option(variant.option()).is_none() {
                        return Err(Error::InvalidParameter(format!(
                            "step '{}' has a variant for '{}', which is not an option of '{}'",
                            step.name(),
                            variant.option(),
                            parameter_name
                        )));
                    }
                    if variants[..i].iter().any(|v| v.option() == variant.option()) {
                        return Err(Error::InvalidParameter(format!(
                            "step '{}' has more than one variant for '{}'",
                            step.name(),
                            variant.option()
                        )));
                    }
                }
                for option in parameter.options() {
                    if !variants.iter().any(|v| v.option() == option.name()) {
                        return Err(Error::MissingVariant {
                            step: step.name().to_string(),
                            parameter: parameter_name.to_string(),
                            option: option.name().to_string(),
                        });
                    }
                }
            }
        }

        debug!(steps = self.steps.len(), "pipeline validated");
        Ok(())
    }

    /// For each step index, the distinct parameters the steps up to and
    /// including it depend on, in first-use order
    pub fn prefix_parameters(&self) -> Vec<Vec<String>> {
        let mut seen: Vec<String> = Vec::new();
        self.steps
            .iter()
            .map(|step| {
                if let Some(p) = step.parameter() {
                    if !seen.iter().any(|s| s == p) {
                        seen.push(p.to_string());
                    }
                }
                seen.clone()
            })
            .collect()
    }

    /// Identity of the state reached after step `index` in `universe`:
    /// the step index plus the universe's choices for the parameters that
    /// steps up to `index` depend on
    pub(crate) fn prefix_key(
        index: usize,
        parameters: &[String],
        universe: &Universe,
    ) -> PrefixKey {
        let choices = parameters
            .iter()
            .map(|p| (p.clone(), universe.choice(p).unwrap_or_default().to_string()))
            .collect();
        PrefixKey { index, choices }
    }

    /// Source text of every step, in order
    pub fn render(&self, registry: &BranchRegistry) -> Vec<String> {
        self.steps.iter().map(|s| s.render(registry)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PrefixKey {
    index: usize,
    choices: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiverse_core::BranchOption;

    fn registry() -> BranchRegistry {
        let mut registry = BranchRegistry::new();
        registry
            .declare("a", [BranchOption::new("a1"), BranchOption::new("a2")])
            .unwrap();
        registry
            .declare("b", [BranchOption::new("b1"), BranchOption::new("b2")])
            .unwrap();
        registry
    }

    #[test]
    fn test_validate_accepts_complete_pipeline() {
        let pipeline = Pipeline::new()
            .step(Step::fixed("load", "", |_| Ok(())))
            .step(Step::branch("filter", "a", |_, _| Ok(())))
            .step(
                Step::variants("model", "b")
                    .variant("b1", "", |_| Ok(()))
                    .variant("b2", "", |_| Ok(())),
            );
        assert!(pipeline.validate(&registry()).is_ok());
    }

    #[test]
    fn test_validate_unknown_parameter() {
        let pipeline = Pipeline::new().step(Step::branch("filter", "c", |_, _| Ok(())));
        match pipeline.validate(&registry()) {
            Err(Error::UnknownParameter(p)) => assert_eq!(p, "c"),
            other => panic!("expected UnknownParameter, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_missing_variant() {
        let pipeline = Pipeline::new()
            .step(Step::variants("model", "b").variant("b1", "", |_| Ok(())));
        match pipeline.validate(&registry()) {
            Err(Error::MissingVariant {
                step,
                parameter,
                option,
            }) => {
                assert_eq!(step, "model");
                assert_eq!(parameter, "b");
                assert_eq!(option, "b2");
            }
            other => panic!("expected MissingVariant, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_stray_and_duplicate_variants() {
        let stray = Pipeline::new().step(
            Step::variants("model", "b")
                .variant("b1", "", |_| Ok(()))
                .variant("b2", "", |_| Ok(()))
                .variant("b3", "", |_| Ok(())),
        );
        assert!(matches!(
            stray.validate(&registry()),
            Err(Error::InvalidParameter(_))
        ));

        let duplicate = Pipeline::new().step(
            Step::variants("model", "b")
                .variant("b1", "", |_| Ok(()))
                .variant("b1", "", |_| Ok(()))
                .variant("b2", "", |_| Ok(())),
        );
        assert!(matches!(
            duplicate.validate(&registry()),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_prefix_parameters() {
        let pipeline = Pipeline::new()
            .step(Step::fixed("load", "", |_| Ok(())))
            .step(Step::branch("filter", "a", |_, _| Ok(())))
            .step(Step::fixed("center", "", |_| Ok(())))
            .step(Step::branch("model", "b", |_, _| Ok(())))
            .step(Step::branch("refit", "a", |_, _| Ok(())));
        let prefixes = pipeline.prefix_parameters();
        assert_eq!(prefixes[0], Vec::<String>::new());
        assert_eq!(prefixes[1], vec!["a"]);
        assert_eq!(prefixes[2], vec!["a"]);
        assert_eq!(prefixes[3], vec!["a", "b"]);
        assert_eq!(prefixes[4], vec!["a", "b"]);
    }

    #[test]
    fn test_render_one_fragment_per_step() {
        let pipeline = Pipeline::new()
            .step(Step::fixed("load", "d <- read()", |_| Ok(())))
            .step(Step::branch("filter", "a", |_, _| Ok(())));
        let fragments = pipeline.render(&registry());
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[0], "# load\nd <- read()");
        assert!(fragments[1].starts_with("# filter\nbranch(a,"));
    }
}
