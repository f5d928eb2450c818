//! Pipeline steps
//!
//! A step is either fixed (identical in every universe) or depends on one
//! parameter. Parameter-dependent steps come in two shapes: a single closure
//! that receives the chosen [`BranchOption`], or one closure per option.

use crate::state::UniverseState;
use anyhow::anyhow;
use multiverse_core::{BranchOption, BranchRegistry, Universe};
use std::fmt;
use std::sync::Arc;

/// Result of running one step; any error halts the universe
pub type StepResult = anyhow::Result<()>;

type StepFn = Arc<dyn Fn(&mut UniverseState) -> StepResult + Send + Sync>;
type BranchFn = Arc<dyn Fn(&mut UniverseState, &BranchOption) -> StepResult + Send + Sync>;

/// Per-option body of a variant step
#[derive(Clone)]
pub struct Variant {
    option: String,
    code: String,
    f: StepFn,
}

impl Variant {
    pub fn option(&self) -> &str {
        &self.option
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("option", &self.option)
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}

/// What a step does when it runs
#[derive(Clone)]
pub enum StepKind {
    /// Same body in every universe
    Fixed(StepFn),
    /// One body, parameterized by the chosen option
    Branch { parameter: String, f: BranchFn },
    /// A separate body per option of the parameter
    Variants {
        parameter: String,
        variants: Vec<Variant>,
    },
}

/// A named unit of analysis code
#[derive(Clone)]
pub struct Step {
    name: String,
    code: String,
    kind: StepKind,
}

impl Step {
    /// A step that runs identically in every universe
    ///
    /// ```rust
    /// use multiverse_exec::Step;
    ///
    /// let step = Step::fixed("center", "x <- x - mean(x)", |state| {
    ///     state.set("centered", true);
    ///     Ok(())
    /// });
    /// assert_eq!(step.parameter(), None);
    /// ```
    pub fn fixed<F>(name: impl Into<String>, code: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut UniverseState) -> StepResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            code: code.into(),
            kind: StepKind::Fixed(Arc::new(f)),
        }
    }

    /// A step whose body receives the option chosen for `parameter`
    pub fn branch<F>(name: impl Into<String>, parameter: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut UniverseState, &BranchOption) -> StepResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            code: String::new(),
            kind: StepKind::Branch {
                parameter: parameter.into(),
                f: Arc::new(f),
            },
        }
    }

    /// A step with one body per option of `parameter`; add bodies with
    /// [`VariantStep::variant`]
    pub fn variants(name: impl Into<String>, parameter: impl Into<String>) -> VariantStep {
        VariantStep {
            name: name.into(),
            code: String::new(),
            parameter: parameter.into(),
            variants: Vec::new(),
        }
    }

    /// Replace the step's source text
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn kind(&self) -> &StepKind {
        &self.kind
    }

    /// Parameter this step depends on, if any
    pub fn parameter(&self) -> Option<&str> {
        match &self.kind {
            StepKind::Fixed(_) => None,
            StepKind::Branch { parameter, .. } | StepKind::Variants { parameter, .. } => {
                Some(parameter)
            }
        }
    }

    /// Run the step for `universe`
    pub(crate) fn run(
        &self,
        state: &mut UniverseState,
        universe: &Universe,
        registry: &BranchRegistry,
    ) -> StepResult {
        match &self.kind {
            StepKind::Fixed(f) => f(state),
            StepKind::Branch { parameter, f } => {
                let chosen = chosen(universe, parameter)?;
                let option = registry.option(parameter, chosen)?;
                f(state, option)
            }
            StepKind::Variants {
                parameter,
                variants,
            } => {
                let chosen = chosen(universe, parameter)?;
                let variant = variants
                    .iter()
                    .find(|v| v.option == chosen)
                    .ok_or_else(|| anyhow!("no variant for {parameter}={chosen}"))?;
                (variant.f)(state)
            }
        }
    }

    /// Human-readable source text of the step, with every alternative
    /// listed for parameter-dependent steps
    pub fn render(&self, registry: &BranchRegistry) -> String {
        let mut lines = vec![format!("# {}", self.name)];
        lines.extend(self.code.lines().map(str::to_string));

        let alternatives: Vec<(String, String)> = match &self.kind {
            StepKind::Fixed(_) => Vec::new(),
            StepKind::Branch { parameter, .. } => registry
                .parameter(parameter)
                .map(|p| {
                    p.options()
                        .iter()
                        .map(|o| (o.name().to_string(), o.code_text().to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            StepKind::Variants { variants, .. } => variants
                .iter()
                .map(|v| (v.option.clone(), v.code.clone()))
                .collect(),
        };

        if let Some(parameter) = self.parameter() {
            lines.push(format!("branch({parameter},"));
            let last = alternatives.len().saturating_sub(1);
            for (i, (option, code)) in alternatives.iter().enumerate() {
                let sep = if i == last { "" } else { "," };
                let mut body = code.lines();
                let first = body.next().unwrap_or_default();
                lines.push(format!("  \"{option}\" ~ {first}"));
                lines.extend(body.map(|l| format!("    {l}")));
                if let Some(line) = lines.last_mut() {
                    line.push_str(sep);
                }
            }
            lines.push(")".to_string());
        }

        lines.join("\n")
    }
}

/// Builder for a step with one body per option, from [`Step::variants`]
#[derive(Debug)]
pub struct VariantStep {
    name: String,
    code: String,
    parameter: String,
    variants: Vec<Variant>,
}

impl VariantStep {
    /// Add the body run when `option` is chosen
    pub fn variant<F>(mut self, option: impl Into<String>, code: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut UniverseState) -> StepResult + Send + Sync + 'static,
    {
        self.variants.push(Variant {
            option: option.into(),
            code: code.into(),
            f: Arc::new(f),
        });
        self
    }

    /// Source text shown above the alternatives
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn build(self) -> Step {
        Step {
            name: self.name,
            code: self.code,
            kind: StepKind::Variants {
                parameter: self.parameter,
                variants: self.variants,
            },
        }
    }
}

impl From<VariantStep> for Step {
    fn from(builder: VariantStep) -> Self {
        builder.build()
    }
}

fn chosen<'a>(universe: &'a Universe, parameter: &str) -> anyhow::Result<&'a str> {
    universe
        .choice(parameter)
        .ok_or_else(|| anyhow!("universe #{} assigns no option to '{parameter}'", universe.id()))
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            StepKind::Fixed(_) => "fixed",
            StepKind::Branch { .. } => "branch",
            StepKind::Variants { .. } => "variants",
        };
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("parameter", &self.parameter())
            .finish()
    }
}
