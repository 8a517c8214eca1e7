//! Aggregation: turn a query result into a label -> number mapping.
//!
//! Two modes exist. Distribution counts how often each value occurs across
//! the whole result. Sum adds up every numeric leaf, keyed by the row's
//! subject (or by column label). Sum descends into nested container values
//! with an explicit worklist, so adversarially deep nesting cannot grow the
//! call stack.
//!
//! The mapping keeps insertion order until a sort is applied; an entry
//! limit truncates after sorting.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{AggregateBy, SortOrder};
use crate::data::{DataValue, QueryResult};

/// Which aggregation pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Count how often each value occurs
    Distribution,
    /// Add up numeric leaf values
    Sum,
}

/// Ordered label -> numeric value mapping produced by aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AggregationResult {
    entries: IndexMap<String, f64>,
}

impl AggregationResult {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `amount` to a label's total, creating it at zero on first sight.
    pub fn add(&mut self, label: &str, amount: f64) {
        if let Some(total) = self.entries.get_mut(label) {
            *total += amount;
        } else {
            self.entries.insert(label.to_string(), amount);
        }
    }

    /// Value recorded for a label, if present.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries.get(label).copied()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was aggregated. A distinct, valid outcome - the
    /// caller renders an empty-data notice instead of an empty body.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in current order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(label, value)| (label.as_str(), *value))
    }

    /// Reorder entries by numeric value. `SortOrder::None` keeps insertion
    /// order. The sort is stable, so equal values keep their relative order.
    pub fn sort(&mut self, order: SortOrder) {
        match order {
            SortOrder::None => {}
            SortOrder::Asc => self
                .entries
                .sort_by(|_, a, _, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)),
            SortOrder::Desc => self
                .entries
                .sort_by(|_, a, _, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal)),
        }
    }

    /// Keep only the first `limit` entries. Applied after sorting.
    pub fn truncate(&mut self, limit: usize) {
        self.entries.truncate(limit);
    }
}

impl<'a> IntoIterator for &'a AggregationResult {
    type Item = (&'a str, f64);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, f64)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// Count how often each value occurs across every field of every row.
///
/// Pages count under their title, everything else under its short text.
/// Labels compare by exact, case-sensitive string equality.
pub fn distribution(result: &QueryResult) -> AggregationResult {
    let mut counts = AggregationResult::new();
    for row in &result.rows {
        for field in &row.fields {
            for value in &field.values {
                counts.add(&value.label_text(), 1.0);
            }
        }
    }
    counts
}

/// Add up every numeric leaf value, keyed by row subject or column label.
///
/// Container values are descended depth-first through an explicit worklist;
/// only the data's own nesting bounds the traversal. Non-numeric leaves are
/// ignored.
pub fn sum(result: &QueryResult, by: AggregateBy) -> AggregationResult {
    let mut totals = AggregationResult::new();

    for row in &result.rows {
        let row_label = row
            .fields
            .first()
            .and_then(|field| field.first())
            .map(|value| value.short_text())
            .unwrap_or_default();

        for (index, field) in row.fields.iter().enumerate() {
            let label = match by {
                AggregateBy::Subject => row_label.clone(),
                AggregateBy::Property => result
                    .print_requests
                    .get(index)
                    .map(|pr| pr.label.clone())
                    .unwrap_or_default(),
            };

            let mut worklist: Vec<&DataValue> = field.values.iter().collect();
            while let Some(value) = worklist.pop() {
                if let DataValue::Container { values } = value {
                    worklist.extend(values.iter());
                } else if let Some(amount) = value.numeric() {
                    totals.add(&label, amount);
                }
            }
        }
    }

    totals
}

/// Run one aggregation pass in the requested mode.
pub fn aggregate(
    result: &QueryResult,
    mode: AggregationMode,
    by: AggregateBy,
) -> AggregationResult {
    match mode {
        AggregationMode::Distribution => distribution(result),
        AggregationMode::Sum => sum(result, by),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Field, PrintRequest, Row};

    fn text_rows(texts: &[&str]) -> QueryResult {
        QueryResult::new(
            vec![PrintRequest::property("Tag", "text")],
            texts
                .iter()
                .map(|t| Row::new(vec![Field::new(vec![DataValue::text(*t)])]))
                .collect(),
        )
    }

    #[test]
    fn test_distribution_counts() {
        let result = text_rows(&["foo", "bar", "baz", "foo", "bar", "bar", "ohi"]);
        let counts = distribution(&result);
        assert_eq!(counts.get("bar"), Some(3.0));
        assert_eq!(counts.get("foo"), Some(2.0));
        assert_eq!(counts.get("baz"), Some(1.0));
        assert_eq!(counts.get("ohi"), Some(1.0));
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_distribution_sort_desc_then_limit() {
        let result = text_rows(&["foo", "bar", "baz", "foo", "bar", "bar", "ohi"]);
        let mut counts = distribution(&result);
        counts.sort(SortOrder::Desc);
        counts.truncate(2);

        let entries: Vec<(&str, f64)> = counts.iter().collect();
        assert_eq!(entries, vec![("bar", 3.0), ("foo", 2.0)]);
    }

    #[test]
    fn test_distribution_is_case_sensitive() {
        let result = text_rows(&["Foo", "foo"]);
        let counts = distribution(&result);
        assert_eq!(counts.get("Foo"), Some(1.0));
        assert_eq!(counts.get("foo"), Some(1.0));
    }

    #[test]
    fn test_distribution_counts_pages_by_title() {
        let result = QueryResult::new(
            vec![PrintRequest::subject("City")],
            vec![Row::new(vec![Field::new(vec![DataValue::Page(
                crate::data::PageRef::new("Berlin").display("the capital"),
            )])])],
        );
        let counts = distribution(&result);
        assert_eq!(counts.get("Berlin"), Some(1.0));
        assert_eq!(counts.get("the capital"), None);
    }

    #[test]
    fn test_sum_descends_nested_containers() {
        // Leaves [3, container{2, container{5}}] under one label sum to 10
        let result = QueryResult::new(
            vec![
                PrintRequest::subject("Item"),
                PrintRequest::property("Amount", "number"),
            ],
            vec![Row::new(vec![
                Field::new(vec![DataValue::text("widget")]),
                Field::new(vec![
                    DataValue::number(3.0),
                    DataValue::container(vec![
                        DataValue::number(2.0),
                        DataValue::container(vec![DataValue::number(5.0)]),
                    ]),
                ]),
            ])],
        );

        let totals = sum(&result, AggregateBy::Subject);
        assert_eq!(totals.get("widget"), Some(10.0));
        assert_eq!(totals.len(), 1);
    }

    #[test]
    fn test_sum_ignores_non_numeric_leaves() {
        let result = QueryResult::new(
            vec![
                PrintRequest::subject("Item"),
                PrintRequest::property("Amount", "number"),
            ],
            vec![Row::new(vec![
                Field::new(vec![DataValue::text("widget")]),
                Field::new(vec![DataValue::container(vec![
                    DataValue::number(4.0),
                    DataValue::text("not a number"),
                    DataValue::Bool { value: true },
                ])]),
            ])],
        );

        let totals = sum(&result, AggregateBy::Subject);
        assert_eq!(totals.get("widget"), Some(4.0));
    }

    #[test]
    fn test_sum_survives_very_deep_nesting() {
        // One numeric leaf at the bottom of 10k nested containers
        let mut value = DataValue::number(1.0);
        for _ in 0..10_000 {
            value = DataValue::container(vec![value]);
        }
        let result = QueryResult::new(
            vec![
                PrintRequest::subject("Item"),
                PrintRequest::property("Amount", "number"),
            ],
            vec![Row::new(vec![
                Field::new(vec![DataValue::text("deep")]),
                Field::new(vec![value]),
            ])],
        );

        let totals = sum(&result, AggregateBy::Subject);
        assert_eq!(totals.get("deep"), Some(1.0));
    }

    #[test]
    fn test_sum_keyed_by_property() {
        let result = QueryResult::new(
            vec![
                PrintRequest::subject("Item"),
                PrintRequest::property("Price", "number"),
                PrintRequest::property("Weight", "number"),
            ],
            vec![
                Row::new(vec![
                    Field::new(vec![DataValue::text("a")]),
                    Field::new(vec![DataValue::number(2.0)]),
                    Field::new(vec![DataValue::number(10.0)]),
                ]),
                Row::new(vec![
                    Field::new(vec![DataValue::text("b")]),
                    Field::new(vec![DataValue::number(3.0)]),
                    Field::new(vec![DataValue::number(20.0)]),
                ]),
            ],
        );

        let totals = sum(&result, AggregateBy::Property);
        assert_eq!(totals.get("Price"), Some(5.0));
        assert_eq!(totals.get("Weight"), Some(30.0));
    }

    #[test]
    fn test_aggregate_dispatches_on_mode() {
        let result = text_rows(&["a", "a"]);
        let counts = aggregate(&result, AggregationMode::Distribution, AggregateBy::Subject);
        assert_eq!(counts.get("a"), Some(2.0));

        let sums = aggregate(&result, AggregationMode::Sum, AggregateBy::Subject);
        // Text leaves carry no numeric payload
        assert!(sums.is_empty());
    }

    #[test]
    fn test_empty_result_aggregates_to_empty() {
        let result = QueryResult::new(vec![PrintRequest::subject("Item")], vec![]);
        assert!(distribution(&result).is_empty());
        assert!(sum(&result, AggregateBy::Subject).is_empty());
    }
}
