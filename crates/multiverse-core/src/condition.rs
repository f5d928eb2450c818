//! Validity conditions attached to branch options
//!
//! A condition is a small boolean expression over equality tests against
//! the options chosen at earlier parameters. Evaluation is pure: it only
//! reads the partial assignment it is given.

use crate::universe::Assignment;
use crate::{Error, Result};
use std::fmt;

/// Boolean expression over `(parameter, option)` equality tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// `parameter` is assigned `option`
    Is { parameter: String, option: String },
    /// `parameter` is assigned something other than `option`
    IsNot { parameter: String, option: String },
    /// Every inner condition holds (true when empty)
    All(Vec<Condition>),
    /// At least one inner condition holds (false when empty)
    Any(Vec<Condition>),
    /// Negation
    Not(Box<Condition>),
}

impl Condition {
    /// `parameter == option`
    pub fn is(parameter: impl Into<String>, option: impl Into<String>) -> Self {
        Self::Is {
            parameter: parameter.into(),
            option: option.into(),
        }
    }

    /// `parameter != option`
    pub fn is_not(parameter: impl Into<String>, option: impl Into<String>) -> Self {
        Self::IsNot {
            parameter: parameter.into(),
            option: option.into(),
        }
    }

    /// Conjunction of several conditions
    pub fn all(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    /// Disjunction of several conditions
    pub fn any(conditions: impl IntoIterator<Item = Condition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Negate a condition
    #[allow(clippy::should_implement_trait)]
    pub fn not(condition: Condition) -> Self {
        Self::Not(Box::new(condition))
    }

    /// `self && other`
    pub fn and(self, other: Condition) -> Self {
        match self {
            Self::All(mut inner) => {
                inner.push(other);
                Self::All(inner)
            }
            this => Self::All(vec![this, other]),
        }
    }

    /// `self || other`
    pub fn or(self, other: Condition) -> Self {
        match self {
            Self::Any(mut inner) => {
                inner.push(other);
                Self::Any(inner)
            }
            this => Self::Any(vec![this, other]),
        }
    }

    /// Evaluate against a (possibly partial) assignment.
    ///
    /// Every referenced parameter must already be assigned; the expander
    /// guarantees this by scanning parameters in declaration order.
    pub fn evaluate(&self, assignment: &Assignment) -> Result<bool> {
        match self {
            Self::Is { parameter, option } => Ok(lookup(assignment, parameter)? == option),
            Self::IsNot { parameter, option } => Ok(lookup(assignment, parameter)? != option),
            Self::All(inner) => {
                for condition in inner {
                    if !condition.evaluate(assignment)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(inner) => {
                for condition in inner {
                    if condition.evaluate(assignment)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(inner) => Ok(!inner.evaluate(assignment)?),
        }
    }

    /// All `(parameter, option)` tests in this expression, in source order
    pub fn references(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    /// Distinct parameters referenced by this expression, in first-seen order
    pub fn referenced_parameters(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for (parameter, _) in self.references() {
            if !out.contains(&parameter) {
                out.push(parameter);
            }
        }
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        match self {
            Self::Is { parameter, option } | Self::IsNot { parameter, option } => {
                out.push((parameter.as_str(), option.as_str()));
            }
            Self::All(inner) | Self::Any(inner) => {
                for condition in inner {
                    condition.collect_references(out);
                }
            }
            Self::Not(inner) => inner.collect_references(out),
        }
    }
}

fn lookup<'a>(assignment: &'a Assignment, parameter: &str) -> Result<&'a str> {
    assignment
        .get(parameter)
        .ok_or_else(|| Error::UnresolvedCondition(parameter.to_string()))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Is { parameter, option } => write!(f, "{parameter} == {option}"),
            Self::IsNot { parameter, option } => write!(f, "{parameter} != {option}"),
            Self::All(inner) if inner.is_empty() => write!(f, "true"),
            Self::Any(inner) if inner.is_empty() => write!(f, "false"),
            Self::All(inner) => write_joined(f, inner, " && "),
            Self::Any(inner) => write_joined(f, inner, " || "),
            Self::Not(inner) => write!(f, "!({inner})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, inner: &[Condition], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, condition) in inner.iter().enumerate() {
        if i > 0 {
            write!(f, "{sep}")?;
        }
        write!(f, "{condition}")?;
    }
    write!(f, ")")
}
