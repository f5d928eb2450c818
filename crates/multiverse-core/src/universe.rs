//! Universes: fully-resolved choice assignments

use std::fmt;

/// Ordered mapping from parameter name to chosen option name.
///
/// Entries are kept in declaration order; lookups are linear, which is
/// cheap for the handful of parameters a multiverse declares.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Assignment {
    choices: Vec<(String, String)>,
}

impl Assignment {
    /// Create an empty assignment
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a choice for a parameter not yet assigned
    pub fn push(&mut self, parameter: impl Into<String>, option: impl Into<String>) {
        self.choices.push((parameter.into(), option.into()));
    }

    /// Copy of this assignment extended with one more choice
    pub fn extended(&self, parameter: &str, option: &str) -> Self {
        let mut next = Self {
            choices: Vec::with_capacity(self.choices.len() + 1),
        };
        next.choices.extend(self.choices.iter().cloned());
        next.push(parameter, option);
        next
    }

    /// Chosen option for a parameter
    pub fn get(&self, parameter: &str) -> Option<&str> {
        self.choices
            .iter()
            .find(|(p, _)| p == parameter)
            .map(|(_, o)| o.as_str())
    }

    /// `(parameter, option)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.choices.iter().map(|(p, o)| (p.as_str(), o.as_str()))
    }

    /// Number of assigned parameters
    pub fn len(&self) -> usize {
        self.choices.len()
    }

    /// Whether nothing is assigned
    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (p, o)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}={o}")?;
        }
        write!(f, "}}")
    }
}

/// One concrete pipeline: a complete assignment with a stable identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Universe {
    id: usize,
    assignment: Assignment,
}

impl Universe {
    pub(crate) fn new(id: usize, assignment: Assignment) -> Self {
        Self { id, assignment }
    }

    /// 1-based identifier in expansion order
    pub fn id(&self) -> usize {
        self.id
    }

    /// Option chosen for a parameter
    pub fn choice(&self, parameter: &str) -> Option<&str> {
        self.assignment.get(parameter)
    }

    /// Full assignment
    pub fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// `(parameter, option)` pairs in declaration order
    pub fn choices(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assignment.iter()
    }
}

impl fmt::Display for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.assignment)
    }
}

/// The expanded, deterministically ordered set of universes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniverseSet {
    universes: Vec<Universe>,
}

impl UniverseSet {
    pub(crate) fn from_assignments(assignments: Vec<Assignment>) -> Self {
        let universes = assignments
            .into_iter()
            .enumerate()
            .map(|(i, a)| Universe::new(i + 1, a))
            .collect();
        Self { universes }
    }

    /// Number of universes
    pub fn len(&self) -> usize {
        self.universes.len()
    }

    /// Whether expansion pruned every combination
    pub fn is_empty(&self) -> bool {
        self.universes.is_empty()
    }

    /// Universe by 1-based identifier
    pub fn get(&self, id: usize) -> Option<&Universe> {
        id.checked_sub(1).and_then(|i| self.universes.get(i))
    }

    /// Universes in identifier order
    pub fn iter(&self) -> std::slice::Iter<'_, Universe> {
        self.universes.iter()
    }

    /// Universes as a slice
    pub fn as_slice(&self) -> &[Universe] {
        &self.universes
    }

    /// Identifiers in order
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.universes.iter().map(|u| u.id)
    }
}

impl<'a> IntoIterator for &'a UniverseSet {
    type Item = &'a Universe;
    type IntoIter = std::slice::Iter<'a, Universe>;

    fn into_iter(self) -> Self::IntoIter {
        self.universes.iter()
    }
}
