//! Branch registry: declared decision points and their options
//!
//! Declaration order is significant. It fixes the expansion order and is the
//! only direction in which conditions may reference other parameters.

use crate::condition::Condition;
use crate::value::Value;
use crate::{Error, Result};
use std::collections::HashMap;
use tracing::debug;

/// A selectable alternative for a parameter
#[derive(Debug, Clone, PartialEq)]
pub struct BranchOption {
    name: String,
    code: String,
    value: Value,
    condition: Option<Condition>,
}

impl BranchOption {
    /// Create an option whose code and value default to its name
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            code: name.clone(),
            value: Value::String(name.clone()),
            name,
            condition: None,
        }
    }

    /// Set the human-readable code fragment shown for this option
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Set the value handed to parameterized steps
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = value.into();
        self
    }

    /// Restrict this option's validity
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Option name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Code fragment
    pub fn code_text(&self) -> &str {
        &self.code
    }

    /// Option payload
    pub fn payload(&self) -> &Value {
        &self.value
    }

    /// Attached condition, if any
    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }
}

/// A named decision point with an ordered, non-empty set of options
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    options: Vec<BranchOption>,
}

impl Parameter {
    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options in declaration order
    pub fn options(&self) -> &[BranchOption] {
        &self.options
    }

    /// Look up an option by name
    pub fn option(&self, name: &str) -> Option<&BranchOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Option names in declaration order
    pub fn option_names(&self) -> Vec<&str> {
        self.options.iter().map(|o| o.name.as_str()).collect()
    }

    /// Whether any option carries a condition
    pub fn is_conditional(&self) -> bool {
        self.options.iter().any(|o| o.condition.is_some())
    }
}

/// Ordered collection of declared parameters
#[derive(Debug, Clone, Default)]
pub struct BranchRegistry {
    parameters: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl BranchRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a parameter with its options.
    ///
    /// Fails on a duplicate parameter name, a duplicate option name within
    /// the parameter, an empty option list, or a condition that references
    /// anything other than an option of an already-declared parameter.
    pub fn declare<I>(&mut self, name: impl Into<String>, options: I) -> Result<&Parameter>
    where
        I: IntoIterator<Item = BranchOption>,
    {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateParameter(name));
        }

        let options: Vec<BranchOption> = options.into_iter().collect();
        if options.is_empty() {
            return Err(Error::EmptyParameter(name));
        }

        for (i, option) in options.iter().enumerate() {
            if options[..i].iter().any(|o| o.name == option.name) {
                return Err(Error::DuplicateOption {
                    parameter: name,
                    option: option.name.clone(),
                });
            }
            if let Some(condition) = &option.condition {
                self.check_condition(&name, option.name(), condition)?;
            }
        }

        debug!(
            parameter = %name,
            options = options.len(),
            position = self.parameters.len(),
            "declared parameter"
        );

        let position = self.parameters.len();
        self.index.insert(name.clone(), position);
        self.parameters.push(Parameter { name, options });
        Ok(&self.parameters[position])
    }

    fn check_condition(&self, parameter: &str, option: &str, condition: &Condition) -> Result<()> {
        for (referenced, referenced_option) in condition.references() {
            if referenced == parameter {
                return Err(Error::condition_reference(
                    parameter,
                    option,
                    referenced,
                    "refers to the parameter being declared",
                ));
            }
            let Some(target) = self.parameter(referenced) else {
                return Err(Error::condition_reference(
                    parameter,
                    option,
                    referenced,
                    &format!("is not declared before '{parameter}'"),
                ));
            };
            if target.option(referenced_option).is_none() {
                return Err(Error::condition_reference(
                    parameter,
                    option,
                    referenced,
                    &format!("has no option '{referenced_option}'"),
                ));
            }
        }
        Ok(())
    }

    /// Parameters in declaration order
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.index.get(name).map(|&i| &self.parameters[i])
    }

    /// Declaration position of a parameter
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Look up an option of a parameter
    pub fn option(&self, parameter: &str, option: &str) -> Result<&BranchOption> {
        let param = self
            .parameter(parameter)
            .ok_or_else(|| Error::UnknownParameter(parameter.to_string()))?;
        param.option(option).ok_or_else(|| {
            Error::InvalidInput(format!(
                "parameter '{parameter}' has no option '{option}'"
            ))
        })
    }

    /// Number of declared parameters
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Whether nothing has been declared
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Size of the unconditioned Cartesian product
    pub fn cartesian_size(&self) -> usize {
        self.parameters.iter().map(|p| p.options.len()).product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(names: &[&str]) -> Vec<BranchOption> {
        names.iter().map(|n| BranchOption::new(*n)).collect()
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let mut registry = BranchRegistry::new();
        registry.declare("z", opts(&["z1"])).unwrap();
        registry.declare("a", opts(&["a1", "a2"])).unwrap();

        let names: Vec<_> = registry.parameters().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["z", "a"]);
        assert_eq!(registry.position("a"), Some(1));
        assert_eq!(registry.cartesian_size(), 2);
    }

    #[test]
    fn test_option_defaults() {
        let option = BranchOption::new("log");
        assert_eq!(option.name(), "log");
        assert_eq!(option.code_text(), "log");
        assert_eq!(option.payload(), &Value::from("log"));
        assert!(option.condition().is_none());

        let option = BranchOption::new("cutoff_2")
            .code("x < 2.0")
            .value(2.0);
        assert_eq!(option.code_text(), "x < 2.0");
        assert_eq!(option.payload().as_float(), Some(2.0));
    }

    #[test]
    fn test_duplicate_parameter() {
        let mut registry = BranchRegistry::new();
        registry.declare("a", opts(&["a1"])).unwrap();
        let err = registry.declare("a", opts(&["a2"])).unwrap_err();
        assert!(matches!(err, Error::DuplicateParameter(p) if p == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_option() {
        let mut registry = BranchRegistry::new();
        let err = registry.declare("a", opts(&["a1", "a2", "a1"])).unwrap_err();
        match err {
            Error::DuplicateOption { parameter, option } => {
                assert_eq!(parameter, "a");
                assert_eq!(option, "a1");
            }
            other => panic!("Wrong error type: {other:?}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_parameter() {
        let mut registry = BranchRegistry::new();
        let err = registry.declare("a", Vec::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyParameter(_)));
    }

    #[test]
    fn test_condition_on_earlier_parameter() {
        let mut registry = BranchRegistry::new();
        registry.declare("a", opts(&["a1", "a2"])).unwrap();
        let param = registry
            .declare(
                "b",
                vec![
                    BranchOption::new("b1").when(Condition::is("a", "a1")),
                    BranchOption::new("b2"),
                ],
            )
            .unwrap();
        assert!(param.is_conditional());
    }

    #[test]
    fn test_forward_reference_rejected() {
        let mut registry = BranchRegistry::new();
        let err = registry
            .declare(
                "a",
                vec![BranchOption::new("a1").when(Condition::is("b", "b1"))],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConditionReference { ref referenced, .. } if referenced == "b"
        ));
        // A failed declaration leaves no trace.
        assert!(registry.parameter("a").is_none());
    }

    #[test]
    fn test_self_reference_rejected() {
        let mut registry = BranchRegistry::new();
        let err = registry
            .declare(
                "a",
                vec![
                    BranchOption::new("a1"),
                    BranchOption::new("a2").when(Condition::is_not("a", "a1")),
                ],
            )
            .unwrap_err();
        assert!(err.to_string().contains("parameter being declared"));
    }

    #[test]
    fn test_unknown_option_reference_rejected() {
        let mut registry = BranchRegistry::new();
        registry.declare("a", opts(&["a1"])).unwrap();
        let err = registry
            .declare(
                "b",
                vec![BranchOption::new("b1").when(Condition::is("a", "a9"))],
            )
            .unwrap_err();
        assert!(err.to_string().contains("has no option 'a9'"));
    }

    #[test]
    fn test_option_lookup() {
        let mut registry = BranchRegistry::new();
        registry.declare("a", opts(&["a1", "a2"])).unwrap();
        assert_eq!(registry.option("a", "a2").unwrap().name(), "a2");
        assert!(matches!(
            registry.option("q", "a2"),
            Err(Error::UnknownParameter(_))
        ));
        assert!(registry.option("a", "a3").is_err());
        assert_eq!(registry.parameter("a").unwrap().option_names(), vec!["a1", "a2"]);
    }
}
