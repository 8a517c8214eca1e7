//! List renderers: plain, bulleted, numbered, and template-packed.
//!
//! Plain lists join row texts with a configurable separator; columns after
//! the first appear as a parenthesized suffix. Bulleted and numbered lists
//! emit HTML list markup, optionally split across visual columns by the
//! column layout engine - ordered lists re-emit a `start` attribute at each
//! column boundary so numbering stays contiguous. Template mode packs every
//! row into a template directive for downstream expansion.

use crate::aggregate::AggregationResult;
use crate::config::{Format, RenderConfig};
use crate::data::{format_number, QueryResult, Row};
use crate::layout::ColumnLayout;
use crate::render::{
    field_text, value_html, FormatRenderer, RenderContext, RenderError, Rendered,
};

/// Renders the `list`, `ul`, `ol`, and `template` formats.
pub struct ListRenderer {
    format: Format,
}

impl ListRenderer {
    /// Create a renderer for one of the list-family formats.
    pub fn new(format: Format) -> Self {
        Self { format }
    }
}

impl FormatRenderer for ListRenderer {
    fn format(&self) -> Format {
        self.format
    }

    fn mime_type(&self, _config: &RenderConfig) -> &'static str {
        match self.format {
            Format::Ul | Format::Ol => "text/html",
            _ => "text/plain",
        }
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, RenderError> {
        if self.format == Format::Template && ctx.config.template.is_none() {
            return Err(RenderError::Unsupported(
                "the template format requires a template name".to_string(),
            ));
        }

        if let Some(aggregated) = ctx.aggregated {
            return Ok(self.render_aggregated(aggregated, ctx.config));
        }

        if ctx.config.template.is_some() {
            return Ok(render_templates(ctx.result, ctx.config));
        }

        match self.format {
            Format::Ul | Format::Ol => Ok(self.render_html_list(ctx.result, ctx.config)),
            _ => Ok(render_plain(ctx.result, ctx.config)),
        }
    }
}

impl ListRenderer {
    /// Bulleted/numbered HTML list, split across columns when configured.
    fn render_html_list(&self, result: &QueryResult, config: &RenderConfig) -> Rendered {
        let tag = if self.format == Format::Ol { "ol" } else { "ul" };
        let layout = ColumnLayout::new(result.count(), config.columns);
        let mut out = String::new();

        if layout.is_active() {
            out.push_str("<div class=\"queryfmt-columns\">\n");
        }
        if layout.is_active() {
            out.push_str(&column_open(&layout));
        }
        out.push_str(&format!("<{}>\n", tag));

        for (index, row) in result.rows.iter().enumerate() {
            if layout.is_boundary(index) {
                out.push_str(&format!("</{}>\n</div>\n", tag));
                out.push_str(&column_open(&layout));
                if self.format == Format::Ol {
                    // Numbering continues visually across the boundary
                    out.push_str(&format!(
                        "<{} start=\"{}\">\n",
                        tag,
                        layout.continuation_start(index)
                    ));
                } else {
                    out.push_str(&format!("<{}>\n", tag));
                }
            }
            out.push_str(&format!("<li>{}</li>\n", row_html(row, config)));
        }

        out.push_str(&format!("</{}>", tag));
        if layout.is_active() {
            out.push_str("\n</div>\n</div>");
        }

        Rendered::markup(out)
    }

    /// Aggregation output as "label (count)" items.
    fn render_aggregated(&self, aggregated: &AggregationResult, config: &RenderConfig) -> Rendered {
        let items: Vec<String> = aggregated
            .iter()
            .map(|(label, value)| format!("{} ({})", label, format_number(value)))
            .collect();

        match self.format {
            Format::Ul | Format::Ol => {
                let tag = if self.format == Format::Ol { "ol" } else { "ul" };
                let body: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>\n", crate::escape::xml_escape(item)))
                    .collect();
                Rendered::markup(format!("<{}>\n{}</{}>", tag, body, tag))
            }
            _ => Rendered::text(items.join(config.list_sep())),
        }
    }
}

/// Open a column container with the layout's width hint.
fn column_open(layout: &ColumnLayout) -> String {
    format!(
        "<div class=\"queryfmt-column\" style=\"width:{}%\">\n",
        layout.width_percent()
    )
}

/// One row as inline HTML: first column, then the remaining columns as a
/// parenthesized suffix.
fn row_html(row: &Row, config: &RenderConfig) -> String {
    let mut fields = row.fields.iter();

    let first = fields
        .next()
        .map(|field| {
            field
                .values
                .iter()
                .map(value_html)
                .collect::<Vec<_>>()
                .join(config.value_sep())
        })
        .unwrap_or_default();

    let rest: Vec<String> = fields
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .values
                .iter()
                .map(value_html)
                .collect::<Vec<_>>()
                .join(config.value_sep())
        })
        .collect();

    if rest.is_empty() {
        first
    } else {
        format!("{} ({})", first, rest.join(", "))
    }
}

/// Plain-text list: rows joined by the list separator.
fn render_plain(result: &QueryResult, config: &RenderConfig) -> Rendered {
    let items: Vec<String> = result
        .rows
        .iter()
        .map(|row| {
            let mut fields = row.fields.iter();
            let first = fields
                .next()
                .map(|field| field_text(field, config))
                .unwrap_or_default();
            let rest: Vec<String> = fields
                .filter(|field| !field.is_empty())
                .map(|field| field_text(field, config))
                .collect();
            if rest.is_empty() {
                first
            } else {
                format!("{} ({})", first, rest.join(", "))
            }
        })
        .collect();

    Rendered::text(items.join(config.list_sep()))
}

/// Template mode: pack each row as a template directive with `label=value`
/// (or positional `1=`, `2=`, ...) arguments. The orchestrator expands the
/// directives, bounded by the recursion counter.
fn render_templates(result: &QueryResult, config: &RenderConfig) -> Rendered {
    let name = config.template.as_deref().unwrap_or_default();
    let sep = config.sep.as_deref().unwrap_or("");

    let items: Vec<String> = result
        .rows
        .iter()
        .map(|row| {
            let mut directive = format!("{{{{{}", name);
            for (index, field) in row.fields.iter().enumerate() {
                let value = field_text(field, config);
                if config.named_args {
                    let label = result
                        .print_requests
                        .get(index)
                        .map(|request| request.label.as_str())
                        .unwrap_or_default();
                    directive.push_str(&format!("|{}={}", label, value));
                } else {
                    directive.push_str(&format!("|{}={}", index + 1, value));
                }
            }
            if let Some(user_param) = &config.user_param {
                directive.push_str(&format!("|userparam={}", user_param));
            }
            directive.push_str("}}");
            directive
        })
        .collect();

    Rendered::text(items.join(sep)).with_templates()
}
