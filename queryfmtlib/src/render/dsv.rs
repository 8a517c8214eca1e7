//! DSV renderer: delimiter-separated values with backslash escapes.
//!
//! Unlike CSV there is no quoting. Every field is escaped first - line
//! breaks, tabs, backspace, form feed, the backslash, and the separator
//! itself become backslash escapes - then fields join on the raw separator
//! character. The separator is configurable; the backslash is not allowed
//! as a separator and silently falls back to the default `:`.

use crate::aggregate::AggregationResult;
use crate::config::{Format, HeaderMode, RenderConfig};
use crate::data::format_number;
use crate::escape::dsv_escape;
use crate::render::{field_text, FormatRenderer, RenderContext, RenderError, Rendered};

/// Renders the `dsv` format.
pub struct DsvRenderer;

impl FormatRenderer for DsvRenderer {
    fn format(&self) -> Format {
        Format::Dsv
    }

    fn mime_type(&self, _config: &RenderConfig) -> &'static str {
        "text/dsv"
    }

    fn file_extension(&self) -> &'static str {
        "dsv"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, RenderError> {
        let config = ctx.config;
        let sep = config.dsv_sep;
        let mut lines: Vec<String> = Vec::new();

        if let Some(aggregated) = ctx.aggregated {
            lines.extend(aggregated_lines(aggregated, sep, config));
        } else {
            if config.headers != HeaderMode::Hide && !ctx.result.print_requests.is_empty() {
                lines.push(join_record(
                    ctx.result.print_requests.iter().map(|r| r.label.clone()),
                    sep,
                ));
            }
            for row in &ctx.result.rows {
                lines.push(join_record(
                    row.fields.iter().map(|field| field_text(field, config)),
                    sep,
                ));
            }
        }

        let mut text = lines.join("\n");
        if !lines.is_empty() {
            text.push('\n');
        }
        Ok(Rendered::text(text))
    }
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
            ["Value".to_string(), "Count".to_string()].into_iter(),
            sep,
        ));
    }
    for (label, value) in aggregated.iter() {
        lines.push(join_record(
            [label.to_string(), format_number(value)].into_iter(),
            sep,
        ));
    }
    lines
}

/// Escape each cell and join on the raw separator.
fn join_record(cells: impl Iterator<Item = String>, sep: char) -> String {
    cells
        .map(|cell| dsv_escape(&cell, sep))
        .collect::<Vec<_>>()
        .join(&sep.to_string())
}
