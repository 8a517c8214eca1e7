//! Table renderer: one HTML table row per result row.
//!
//! Each cell holds all of a field's values joined by line breaks. When the
//! first value of a cell sorts numerically, a hidden `data-sort-value`
//! attribute carries the numeric key so client-side sorting works without
//! altering the visible text.

use crate::config::{Format, HeaderMode, RenderConfig};
use crate::data::format_number;
use crate::escape::xml_escape;
use crate::render::{value_html, FormatRenderer, RenderContext, RenderError, Rendered};

/// Renders the `table` format.
pub struct TableRenderer;

impl FormatRenderer for TableRenderer {
    fn format(&self) -> Format {
        Format::Table
    }

    fn mime_type(&self, _config: &RenderConfig) -> &'static str {
        "text/html"
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, RenderError> {
        if let Some(aggregated) = ctx.aggregated {
            return Ok(render_aggregated(aggregated, ctx.config));
        }

        let result = ctx.result;
        let config = ctx.config;
        let mut out = String::from("<table class=\"queryfmt-table\">\n");

        if config.headers != HeaderMode::Hide && !result.print_requests.is_empty() {
            out.push_str("<tr>");
            for request in &result.print_requests {
                let label = xml_escape(&request.label);
                match config.headers {
                    HeaderMode::Show => {
                        out.push_str(&format!(
                            "<th class=\"{}\">{}</th>",
                            column_class(&request.label),
                            label
                        ));
                    }
                    HeaderMode::Plain => out.push_str(&format!("<th>{}</th>", label)),
                    HeaderMode::Hide => unreachable!(),
                }
            }
            out.push_str("</tr>\n");
        }

        for row in &result.rows {
            out.push_str("<tr>");
            for (index, field) in row.fields.iter().enumerate() {
                let class = result
                    .print_requests
                    .get(index)
                    .map(|request| column_class(&request.label))
                    .unwrap_or_default();

                let sort_attr = field
                    .first()
                    .and_then(|value| value.sort_key().as_number())
                    .map(|key| format!(" data-sort-value=\"{}\"", format_number(key)))
                    .unwrap_or_default();

                let cell = field
                    .values
                    .iter()
                    .map(value_html)
                    .collect::<Vec<_>>()
                    .join("<br />");

                out.push_str(&format!(
                    "<td class=\"{}\"{}>{}</td>",
                    class, sort_attr, cell
                ));
            }
            out.push_str("</tr>\n");
        }

        out.push_str("</table>");
        Ok(Rendered::markup(out))
    }
}

/// Aggregation output as a two-column table: label, value.
fn render_aggregated(
    aggregated: &crate::aggregate::AggregationResult,
    config: &RenderConfig,
) -> Rendered {
    let mut out = String::from("<table class=\"queryfmt-table\">\n");

    if config.headers != HeaderMode::Hide {
        out.push_str("<tr><th>Value</th><th>Count</th></tr>\n");
    }
    for (label, value) in aggregated.iter() {
        out.push_str(&format!(
            "<tr><td>{}</td><td data-sort-value=\"{}\">{}</td></tr>\n",
            xml_escape(label),
            format_number(value),
            format_number(value)
        ));
    }

    out.push_str("</table>");
    Rendered::markup(out)
}

/// Derive a CSS-safe class name from a column label: lowercased, spaces
/// and underscores become dashes, everything else non-alphanumeric drops.
pub(crate) fn column_class(label: &str) -> String {
    let mut class = String::from("queryfmt-col-");
    for c in label.to_lowercase().chars() {
        match c {
            ' ' | '_' => class.push('-'),
            c if c.is_ascii_alphanumeric() || c == '-' => class.push(c),
            _ => {}
        }
    }
    class
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::distribution;
    use crate::data::{DataValue, Field, PageRef, PrintRequest, QueryResult, Row};
    use crate::printer::Environment;

    fn sample_result() -> QueryResult {
        QueryResult::new(
            vec![
                PrintRequest::subject("City"),
                PrintRequest::property("Population Count", "number"),
            ],
            vec![Row::new(vec![
                Field::new(vec![DataValue::Page(
                    PageRef::new("Berlin").url("https://example.org/Berlin"),
                )]),
                Field::new(vec![DataValue::number(3_700_000.0)]),
            ])],
        )
    }

    fn render(result: &QueryResult, config: &RenderConfig) -> Rendered {
        let env = Environment::default();
        TableRenderer
            .render(&RenderContext {
                result,
                config,
                aggregated: None,
                env: &env,
            })
            .unwrap()
    }

    #[test]
    fn test_table_structure() {
        let result = sample_result();
        let rendered = render(&result, &RenderConfig::default());
        assert!(rendered.is_final_markup);
        assert!(rendered.text.starts_with("<table"));
        assert!(rendered.text.contains("<th class=\"queryfmt-col-city\">City</th>"));
        assert!(rendered
            .text
            .contains("<a href=\"https://example.org/Berlin\">Berlin</a>"));
    }

    #[test]
    fn test_numeric_cells_carry_sort_keys() {
        let result = sample_result();
        let rendered = render(&result, &RenderConfig::default());
        assert!(rendered.text.contains("data-sort-value=\"3700000\""));
    }

    #[test]
    fn test_header_modes() {
        let result = sample_result();

        let hidden = render(
            &result,
            &RenderConfig::default().with_headers(HeaderMode::Hide),
        );
        assert!(!hidden.text.contains("<th"));

        let plain = render(
            &result,
            &RenderConfig::default().with_headers(HeaderMode::Plain),
        );
        assert!(plain.text.contains("<th>City</th>"));
        assert!(!plain.text.contains("<th class"));
    }

    #[test]
    fn test_multiple_values_join_with_breaks() {
        let result = QueryResult::new(
            vec![PrintRequest::property("Tags", "text")],
            vec![Row::new(vec![Field::new(vec![
                DataValue::text("red"),
                DataValue::text("blue"),
            ])])],
        );
        let rendered = render(&result, &RenderConfig::default());
        assert!(rendered.text.contains("red<br />blue"));
    }

    #[test]
    fn test_column_class_sanitizes_labels() {
        assert_eq!(column_class("Population Count"), "queryfmt-col-population-count");
        assert_eq!(column_class("has_area"), "queryfmt-col-has-area");
        assert_eq!(column_class("Größe!"), "queryfmt-col-gre");
    }

    #[test]
    fn test_aggregated_table() {
        let result = QueryResult::new(
            vec![PrintRequest::property("Tag", "text")],
            vec![
                Row::new(vec![Field::new(vec![DataValue::text("a")])]),
                Row::new(vec![Field::new(vec![DataValue::text("a")])]),
            ],
        );
        let counts = distribution(&result);
        let env = Environment::default();
        let config = RenderConfig::default();
        let rendered = TableRenderer
            .render(&RenderContext {
                result: &result,
                config: &config,
                aggregated: Some(&counts),
                env: &env,
            })
            .unwrap();
        assert!(rendered.text.contains("<td>a</td>"));
        assert!(rendered.text.contains("<td data-sort-value=\"2\">2</td>"));
    }
}
