//! CSV renderer: one output line per result row.
//!
//! Fields are quoted only when they contain the separator, a quote, or a
//! line break. A byte-order mark and a visible header row are optional.
//! The merge option folds rows sharing an identical first column into one
//! row, concatenating the remaining columns with the value separator.

use indexmap::IndexMap;

use crate::aggregate::AggregationResult;
use crate::config::{Format, HeaderMode, RenderConfig};
use crate::data::{format_number, QueryResult};
use crate::escape::csv_field;
use crate::render::{field_text, FormatRenderer, RenderContext, RenderError, Rendered};

/// Renders the `csv` format.
pub struct CsvRenderer;

impl FormatRenderer for CsvRenderer {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn mime_type(&self, _config: &RenderConfig) -> &'static str {
        "text/csv"
    }

    fn file_extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, RenderError> {
        let config = ctx.config;
        let sep = config.csv_sep();
        let mut lines: Vec<String> = Vec::new();

        if let Some(aggregated) = ctx.aggregated {
            lines.extend(aggregated_lines(aggregated, sep, config));
        } else {
            lines.extend(result_lines(ctx.result, sep, config));
        }

        let mut text = String::new();
        if config.bom {
            text.push('\u{FEFF}');
        }
        text.push_str(&lines.join("\n"));
        if !lines.is_empty() {
            text.push('\n');
        }

        Ok(Rendered::text(text))
    }
}

/// Header plus one line per row, with optional first-column merging.
fn result_lines(result: &QueryResult, sep: char, config: &RenderConfig) -> Vec<String> {
    let mut lines = Vec::new();

    if config.headers != HeaderMode::Hide && !result.print_requests.is_empty() {
        let header = result
            .print_requests
            .iter()
            .map(|request| csv_field(&request.label, sep))
            .collect::<Vec<_>>()
            .join(&sep.to_string());
        lines.push(header);
    }

    if config.merge {
        // Rows sharing a first column collapse into one record
        let mut merged: IndexMap<String, Vec<String>> = IndexMap::new();
        for row in &result.rows {
            let mut cells = row.fields.iter().map(|field| field_text(field, config));
            let key = cells.next().unwrap_or_default();
            let rest: Vec<String> = cells.collect();

            match merged.get_mut(&key) {
                Some(existing) => {
                    for (slot, cell) in existing.iter_mut().zip(rest) {
                        if cell.is_empty() {
                            continue;
                        }
                        if !slot.is_empty() {
                            slot.push_str(config.value_sep());
                        }
                        slot.push_str(&cell);
                    }
                }
                None => {
                    merged.insert(key, rest);
                }
            }
        }

        for (key, rest) in merged {
            let mut cells = vec![key];
            cells.extend(rest);
            lines.push(join_record(&cells, sep));
        }
    } else {
        for row in &result.rows {
            let cells: Vec<String> = row
                .fields
                .iter()
                .map(|field| field_text(field, config))
                .collect();
            lines.push(join_record(&cells, sep));
        }
    }

    lines
}

/// Aggregation output: label and value per line.
fn aggregated_lines(
    aggregated: &AggregationResult,
    sep: char,
    config: &RenderConfig,
) -> Vec<String> {
    let mut lines = Vec::new();
    if config.headers != HeaderMode::Hide {
        lines.push(join_record(
            &["Value".to_string(), "Count".to_string()],
            sep,
        ));
    }
    for (label, value) in aggregated.iter() {
        lines.push(join_record(
            &[label.to_string(), format_number(value)],
            sep,
        ));
    }
    lines
}

/// Quote each cell as needed and join on the separator.
fn join_record(cells: &[String], sep: char) -> String {
    cells
        .iter()
        .map(|cell| csv_field(cell, sep))
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{DataValue, Field, PrintRequest, QueryResult, Row};
    use crate::printer::Environment;

    fn sample_result() -> QueryResult {
        QueryResult::new(
            vec![
                PrintRequest::subject("City"),
                PrintRequest::property("Country", "page"),
            ],
            vec![
                Row::new(vec![
                    Field::new(vec![DataValue::page("Berlin")]),
                    Field::new(vec![DataValue::page("Germany")]),
                ]),
                Row::new(vec![
                    Field::new(vec![DataValue::text("San Juan, PR")]),
                    Field::new(vec![DataValue::page("United States")]),
                ]),
            ],
        )
    }

    fn render(result: &QueryResult, config: &RenderConfig) -> String {
        let env = Environment::default();
        CsvRenderer
            .render(&RenderContext {
                result,
                config,
                aggregated: None,
                env: &env,
            })
            .unwrap()
            .text
    }

    #[test]
    fn test_basic_csv() {
        let text = render(&sample_result(), &RenderConfig::default());
        assert_eq!(
            text,
            "City,Country\nBerlin,Germany\n\"San Juan, PR\",United States\n"
        );
    }

    #[test]
    fn test_hidden_headers() {
        let config = RenderConfig::default().with_headers(HeaderMode::Hide);
        let text = render(&sample_result(), &config);
        assert!(text.starts_with("Berlin"));
    }

    #[test]
    fn test_bom_prefix() {
        let mut config = RenderConfig::default();
        config.bom = true;
        let text = render(&sample_result(), &config);
        assert!(text.starts_with('\u{FEFF}'));
    }

    #[test]
    fn test_custom_separator() {
        let config = RenderConfig::default().with_sep(";");
        let text = render(&sample_result(), &config);
        assert!(text.contains("Berlin;Germany"));
        // The comma no longer forces quoting under ';'
        assert!(text.contains("San Juan, PR;United States"));
    }

    #[test]
    fn test_merge_combines_rows_by_first_column() {
        let result = QueryResult::new(
            vec![
                PrintRequest::subject("City"),
                PrintRequest::property("District", "text"),
            ],
            vec![
                Row::new(vec![
                    Field::new(vec![DataValue::page("Berlin")]),
                    Field::new(vec![DataValue::text("Mitte")]),
                ]),
                Row::new(vec![
                    Field::new(vec![DataValue::page("Berlin")]),
                    Field::new(vec![DataValue::text("Pankow")]),
                ]),
                Row::new(vec![
                    Field::new(vec![DataValue::page("Hamburg")]),
                    Field::new(vec![DataValue::text("Altona")]),
                ]),
            ],
        );
        let mut config = RenderConfig::default();
        config.merge = true;
        let text = render(&result, &config);
        assert!(text.contains("Berlin,\"Mitte, Pankow\""));
        assert!(text.contains("Hamburg,Altona"));
    }

    #[test]
    fn test_aggregated_csv() {
        let result = sample_result();
        let mut counts = AggregationResult::new();
        counts.add("Germany", 2.0);
        counts.add("France", 1.0);
        let env = Environment::default();
        let config = RenderConfig::default();
        let text = CsvRenderer
            .render(&RenderContext {
                result: &result,
                config: &config,
                aggregated: Some(&counts),
                env: &env,
            })
            .unwrap()
            .text;
        assert_eq!(text, "Value,Count\nGermany,2\nFrance,1\n");
    }

    #[test]
    fn test_empty_result_yields_header_only() {
        let result = QueryResult::new(
            vec![PrintRequest::subject("City")],
            vec![],
        );
        let text = render(&result, &RenderConfig::default());
        assert_eq!(text, "City\n");
    }
}
