//! Mutable per-universe execution state

use multiverse_core::{Dataset, Error, Outcome, Result, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// State threaded through the steps of one universe.
///
/// The dataset starts as a shared handle to the run's input; the first step
/// that asks for [`UniverseState::data_mut`] gets a private copy, so the
/// input is never observed modified by another universe.
#[derive(Debug, Clone)]
pub struct UniverseState {
    universe_id: usize,
    data: Arc<Dataset>,
    values: HashMap<String, Value>,
    outcomes: Vec<Outcome>,
}

impl UniverseState {
    pub fn new(universe_id: usize, data: Arc<Dataset>) -> Self {
        Self {
            universe_id,
            data,
            values: HashMap::new(),
            outcomes: Vec::new(),
        }
    }

    /// Id of the universe this state belongs to
    pub fn universe_id(&self) -> usize {
        self.universe_id
    }

    /// Current dataset
    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// Dataset for modification; copies the shared input on first use
    pub fn data_mut(&mut self) -> &mut Dataset {
        Arc::make_mut(&mut self.data)
    }

    /// Replace the dataset wholesale
    pub fn replace_data(&mut self, data: Dataset) {
        self.data = Arc::new(data);
    }

    /// Whether this state still shares its dataset with the run input
    pub fn shares_data_with(&self, other: &Arc<Dataset>) -> bool {
        Arc::ptr_eq(&self.data, other)
    }

    /// Store an intermediate value for later steps
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Intermediate value stored by an earlier step
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Intermediate value that must exist
    pub fn require(&self, name: &str) -> Result<&Value> {
        self.values
            .get(name)
            .ok_or_else(|| Error::InvalidInput(format!("no value named '{name}' in universe state")))
    }

    /// Numeric intermediate value
    pub fn get_float(&self, name: &str) -> Result<f64> {
        let value = self.require(name)?;
        value
            .as_float()
            .ok_or_else(|| Error::InvalidInput(format!("value '{name}' is not numeric: {value}")))
    }

    /// Record an outcome term for the results export
    pub fn record(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// Outcomes recorded so far, in recording order
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Move this state to another universe id, keeping its contents
    pub(crate) fn rebind(mut self, universe_id: usize) -> Self {
        self.universe_id = universe_id;
        self
    }
}
