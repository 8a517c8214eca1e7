//! Result shape: rows of fields, one field per declared column.
//!
//! A `QueryResult` is what the external query engine hands over: an ordered
//! list of print requests (one per column) and an ordered list of rows. The
//! positional invariant is load-bearing - `row.fields[i]` always belongs to
//! `print_requests[i]`. The result is consumed once, forward-only, per
//! render call.

use serde::{Deserialize, Serialize};

use super::value::DataValue;
use crate::error::QueryfmtError;

/// What a column means, beyond its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnMode {
    /// The subject column
    This,
    /// A property column
    #[default]
    Prop,
    /// A categories column
    Cats,
    /// A category-membership (yes/no) column
    Ccat,
}

/// Declaration of one output column: label, semantic mode, value type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintRequest {
    /// Column label shown in headers
    pub label: String,
    /// Semantic mode of the column
    #[serde(default)]
    pub mode: ColumnMode,
    /// Declared value type id ("page", "number", ...)
    #[serde(default)]
    pub type_id: String,
}

impl PrintRequest {
    /// Declare a subject column.
    pub fn subject(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            mode: ColumnMode::This,
            type_id: "page".to_string(),
        }
    }

    /// Declare a property column.
    pub fn property(label: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            mode: ColumnMode::Prop,
            type_id: type_id.into(),
        }
    }
}

/// The per-row, per-column holder of one or more values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Field {
    /// Values of this field, in order
    pub values: Vec<DataValue>,
}

impl Field {
    /// Create a field from its values.
    pub fn new(values: Vec<DataValue>) -> Self {
        Self { values }
    }

    /// An empty field (the column has no value for this row).
    pub fn empty() -> Self {
        Self { values: Vec::new() }
    }

    /// First value, if any.
    pub fn first(&self) -> Option<&DataValue> {
        self.values.first()
    }

    /// True when the field holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Short texts of all values, in order.
    pub fn texts(&self) -> Vec<String> {
        self.values.iter().map(DataValue::short_text).collect()
    }
}

/// One result row: a fixed-length ordered sequence of fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    /// Fields, positionally matching the result's print requests
    pub fields: Vec<Field>,
}

impl Row {
    /// Create a row from its fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }
}

/// A materialized query result: columns, rows, and paging information.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// One print request per column
    pub print_requests: Vec<PrintRequest>,
    /// Result rows, in order
    pub rows: Vec<Row>,
    /// True when more rows exist beyond this page
    #[serde(default)]
    pub further_results: bool,
    /// Link target for the further-results link, if the engine provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub further_url: Option<String>,
    /// Error messages reported by the query engine
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl QueryResult {
    /// Create a result from columns and rows.
    pub fn new(print_requests: Vec<PrintRequest>, rows: Vec<Row>) -> Self {
        Self {
            print_requests,
            rows,
            further_results: false,
            further_url: None,
            errors: Vec::new(),
        }
    }

    /// Builder: mark the result as truncated, with a link target.
    pub fn with_further(mut self, url: impl Into<String>) -> Self {
        self.further_results = true;
        self.further_url = Some(url.into());
        self
    }

    /// Number of rows actually returned.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// True when more rows exist beyond the current page.
    pub fn has_further_results(&self) -> bool {
        self.further_results
    }

    /// Number of declared columns.
    pub fn column_count(&self) -> usize {
        self.print_requests.len()
    }

    /// Index of the subject column: the first `This` column, falling back
    /// to column 0.
    pub fn subject_index(&self) -> usize {
        self.print_requests
            .iter()
            .position(|pr| pr.mode == ColumnMode::This)
            .unwrap_or(0)
    }

    /// Check the positional invariant: every row has exactly one field per
    /// declared column.
    pub fn check_arity(&self) -> Result<(), QueryfmtError> {
        let columns = self.print_requests.len();
        for (index, row) in self.rows.iter().enumerate() {
            if row.fields.len() != columns {
                return Err(QueryfmtError::RowArity {
                    row: index,
                    fields: row.fields.len(),
                    columns,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> QueryResult {
        QueryResult::new(
            vec![
                PrintRequest::subject("City"),
                PrintRequest::property("Population", "number"),
            ],
            vec![
                Row::new(vec![
                    Field::new(vec![DataValue::page("Berlin")]),
                    Field::new(vec![DataValue::number(3_700_000.0)]),
                ]),
                Row::new(vec![
                    Field::new(vec![DataValue::page("Paris")]),
                    Field::empty(),
                ]),
            ],
        )
    }

    #[test]
    fn test_counts() {
        let result = sample_result();
        assert_eq!(result.count(), 2);
        assert_eq!(result.column_count(), 2);
        assert!(!result.has_further_results());
    }

    #[test]
    fn test_subject_index_prefers_this_column() {
        let mut result = sample_result();
        assert_eq!(result.subject_index(), 0);

        // Without an explicit subject column, fall back to column 0
        result.print_requests[0].mode = ColumnMode::Prop;
        assert_eq!(result.subject_index(), 0);
    }

    #[test]
    fn test_check_arity() {
        let mut result = sample_result();
        assert!(result.check_arity().is_ok());

        result.rows[1].fields.pop();
        let err = result.check_arity().unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_further_builder() {
        let result = sample_result().with_further("https://example.org/next");
        assert!(result.has_further_results());
        assert_eq!(
            result.further_url.as_deref(),
            Some("https://example.org/next")
        );
    }

    #[test]
    fn test_result_document_round_trip() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        let back: QueryResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
