//! Immutable tabular input shared by every universe

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Column storage; every variant is nullable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnData {
    /// Logical values
    Boolean(Vec<Option<bool>>),
    /// Whole numbers
    Integer(Vec<Option<i64>>),
    /// Real numbers
    Float(Vec<Option<f64>>),
    /// Free text or categorical labels
    Text(Vec<Option<String>>),
}

impl ColumnData {
    /// Number of rows
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(v) => v.len(),
            Self::Integer(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Text(v) => v.len(),
        }
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    /// Keep the rows whose mask entry is true
    fn filter(&self, keep: &[bool]) -> Self {
        fn pick<T: Clone>(values: &[T], keep: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(keep)
                .filter_map(|(v, &k)| k.then(|| v.clone()))
                .collect()
        }
        match self {
            Self::Boolean(v) => Self::Boolean(pick(v, keep)),
            Self::Integer(v) => Self::Integer(pick(v, keep)),
            Self::Float(v) => Self::Float(pick(v, keep)),
            Self::Text(v) => Self::Text(pick(v, keep)),
        }
    }
}

/// A named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create a column from raw storage
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Non-null float column
    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(
            name,
            ColumnData::Float(values.into_iter().map(Some).collect()),
        )
    }

    /// Non-null integer column
    pub fn integer(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(
            name,
            ColumnData::Integer(values.into_iter().map(Some).collect()),
        )
    }

    /// Non-null boolean column
    pub fn boolean(name: impl Into<String>, values: impl IntoIterator<Item = bool>) -> Self {
        Self::new(
            name,
            ColumnData::Boolean(values.into_iter().map(Some).collect()),
        )
    }

    /// Non-null text column
    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            name,
            ColumnData::Text(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column storage
    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column has no rows
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Numeric view of the column, skipping nulls.
    ///
    /// Integer columns are widened; other types are rejected.
    pub fn numeric(&self) -> Result<Vec<f64>> {
        match &self.data {
            ColumnData::Float(v) => Ok(v.iter().flatten().copied().collect()),
            ColumnData::Integer(v) => Ok(v.iter().flatten().map(|&i| i as f64).collect()),
            other => Err(Error::InvalidInput(format!(
                "column '{}' is {}, not numeric",
                self.name,
                other.type_name()
            ))),
        }
    }
}

/// Immutable table of named, equal-length columns.
///
/// Universes share one dataset behind an `Arc`; a step needing a mutable
/// working copy clones it privately.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Build a dataset, checking for unique names and equal lengths
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map_or(0, Column::len);
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::InvalidInput(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            if column.len() != rows {
                return Err(Error::size_mismatch(
                    rows,
                    column.len(),
                    &format!("column '{}'", column.name),
                ));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Start a builder
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::default()
    }

    /// Columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column, failing when absent
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| Error::InvalidInput(format!("no column named '{name}'")))
    }

    /// Non-null numeric values of a column
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>> {
        self.require(name)?.numeric()
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Add a column, or replace the one with the same name in place
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.rows {
            return Err(Error::size_mismatch(
                self.rows,
                column.len(),
                &format!("column '{}'", column.name),
            ));
        }
        if self.columns.is_empty() {
            self.rows = column.len();
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// New dataset holding only the rows whose mask entry is true
    pub fn filter_rows(&self, keep: &[bool]) -> Result<Dataset> {
        if keep.len() != self.rows {
            return Err(Error::size_mismatch(self.rows, keep.len(), "row mask"));
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.data.filter(keep)))
            .collect();
        Ok(Dataset {
            columns,
            rows: keep.iter().filter(|&&k| k).count(),
        })
    }
}

/// Builder for datasets
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    columns: Vec<Column>,
}

impl DatasetBuilder {
    /// Append a column
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<Dataset> {
        Dataset::new(self.columns)
    }
}
