//! The data artifact: the analysis input, column by column

use crate::error::{ExportError, Result};
use crate::exporter::{Document, Exporter};
use multiverse_core::{Column, ColumnData, Dataset};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One column as written to `data.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub field: String,
    pub values: ColumnData,
}

/// `data.json`: every column in dataset order, missing values as `null`.
/// Float cells must be finite; JSON has no NaN or infinity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataDocument {
    pub fields: Vec<FieldRecord>,
}

impl Document for DataDocument {}

impl DataDocument {
    /// Rebuild the dataset, checking that all columns have the same length
    pub fn into_dataset(self) -> Result<Dataset> {
        if let Some(first) = self.fields.first() {
            let expected = first.values.len();
            if let Some(ragged) = self.fields.iter().find(|f| f.values.len() != expected) {
                return Err(ExportError::RaggedDataset {
                    column: ragged.field.clone(),
                    expected,
                    actual: ragged.values.len(),
                });
            }
        }
        let columns = self
            .fields
            .into_iter()
            .map(|f| Column::new(f.field, f.values))
            .collect();
        Ok(Dataset::new(columns)?)
    }
}

/// Builds `data.json` from the analysis input
#[derive(Debug, Clone)]
pub struct DataExporter<'a> {
    data: &'a Dataset,
}

impl<'a> DataExporter<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self { data }
    }
}

impl Exporter for DataExporter<'_> {
    type Document = DataDocument;

    const FILE_NAME: &'static str = "data.json";

    fn document(&self) -> Result<DataDocument> {
        let expected = self.data.n_rows();
        let fields = self
            .data
            .columns()
            .iter()
            .map(|column| {
                if column.len() != expected {
                    return Err(ExportError::RaggedDataset {
                        column: column.name().to_string(),
                        expected,
                        actual: column.len(),
                    });
                }
                if let ColumnData::Float(values) = column.data() {
                    let bad = values
                        .iter()
                        .enumerate()
                        .find_map(|(row, v)| v.filter(|v| !v.is_finite()).map(|v| (row, v)));
                    if let Some((row, value)) = bad {
                        return Err(ExportError::NonFiniteValue {
                            column: column.name().to_string(),
                            row,
                            value,
                        });
                    }
                }
                Ok(FieldRecord {
                    field: column.name().to_string(),
                    values: column.data().clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DataDocument { fields })
    }
}

/// Parse a `data.json` document into a dataset.
///
/// Column types are inferred from the values: all-boolean columns read as
/// boolean, whole numbers as integer, other numbers as float, strings as
/// text. A column holding only nulls reads back as boolean.
pub fn parse_data_json(json: &str) -> Result<Dataset> {
    let document: DataDocument = serde_json::from_str(json)?;
    document.into_dataset()
}

/// Read a `data.json` file into a dataset
pub fn read_data_json(path: &Path) -> Result<Dataset> {
    let json = std::fs::read_to_string(path)?;
    parse_data_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::new("score", ColumnData::Float(vec![Some(1.5), None, Some(3.0)])),
            Column::integer("age", [31, 45, 27]),
            Column::text("group", ["a", "b", "a"]),
            Column::boolean("treated", [true, false, true]),
        ])
        .unwrap()
    }

    #[test]
    fn test_document_shape() {
        let data = dataset();
        let doc = DataExporter::new(&data).document().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&doc.to_json().unwrap()).unwrap();

        let fields = value.as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0]["field"], "score");
        assert_eq!(fields[0]["values"][1], serde_json::Value::Null);
        assert_eq!(fields[1]["values"][0], 31);
        assert_eq!(fields[2]["values"][1], "b");
        assert_eq!(fields[3]["values"][2], true);
    }

    #[test]
    fn test_round_trip_preserves_types() {
        let data = dataset();
        let json = String::from_utf8(DataExporter::new(&data).document().unwrap().to_json().unwrap()).unwrap();
        let parsed = parse_data_json(&json).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_whole_floats_stay_float() {
        let data = Dataset::new(vec![Column::float("x", [1.0, 2.0])]).unwrap();
        let json = String::from_utf8(DataExporter::new(&data).document().unwrap().to_json().unwrap()).unwrap();
        let parsed = parse_data_json(&json).unwrap();
        assert!(matches!(
            parsed.column("x").unwrap().data(),
            ColumnData::Float(_)
        ));
    }

    #[test]
    fn test_non_finite_floats_rejected() {
        let data = Dataset::new(vec![
            Column::float("ok", [0.0, 1.0, 2.0]),
            Column::float("x", [1.5, f64::NAN, f64::INFINITY]),
        ])
        .unwrap();
        match DataExporter::new(&data).document() {
            Err(ExportError::NonFiniteValue { column, row, value }) => {
                assert_eq!(column, "x");
                assert_eq!(row, 1);
                assert!(value.is_nan());
            }
            other => panic!("expected NonFiniteValue, got {other:?}"),
        }

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        assert!(crate::export(&DataExporter::new(&data), Some(&path)).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_ragged_input_rejected() {
        let json = r#"[{"field": "a", "values": [1, 2]}, {"field": "b", "values": [1]}]"#;
        match parse_data_json(json) {
            Err(ExportError::RaggedDataset {
                column,
                expected,
                actual,
            }) => {
                assert_eq!(column, "b");
                assert_eq!((expected, actual), (2, 1));
            }
            other => panic!("expected RaggedDataset, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_input_rejected() {
        assert!(matches!(parse_data_json("{}"), Err(ExportError::Json(_))));
        assert!(matches!(
            parse_data_json(r#"[{"field": "a", "values": [1, "x"]}]"#),
            Err(ExportError::Json(_))
        ));
    }
}
