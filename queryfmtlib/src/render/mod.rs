//! Format renderers: one implementation per output format.
//!
//! This module handles the third stage of the pipeline - turning a query
//! result (or an aggregation of it) into format-specific text. It provides:
//!
//! - **FormatRenderer**: the single renderer trait
//! - **Dispatch**: a format-tag keyed registry (`renderer_for`)
//! - **Rendered**: text plus the flags the orchestrator acts on
//!
//! Renderers only format. Empty-result handling, intro/outro, links, and
//! template re-expansion all happen in the orchestrator.

pub mod csv;
pub mod dsv;
pub mod feed;
pub mod json;
pub mod list;
pub mod rdf;
pub mod table;

use thiserror::Error;

use crate::aggregate::AggregationResult;
use crate::config::{Format, RenderConfig};
use crate::data::{DataValue, Field, QueryResult};
use crate::error::QueryfmtError;
use crate::escape::xml_escape;
use crate::printer::Environment;

pub use csv::CsvRenderer;
pub use dsv::DsvRenderer;
pub use feed::FeedRenderer;
pub use json::JsonRenderer;
pub use list::ListRenderer;
pub use rdf::RdfRenderer;
pub use table::TableRenderer;

/// Everything a renderer may read while producing output.
pub struct RenderContext<'a> {
    /// The result being rendered
    pub result: &'a QueryResult,
    /// Resolved configuration
    pub config: &'a RenderConfig,
    /// Aggregation output, when an aggregation pass ran
    pub aggregated: Option<&'a AggregationResult>,
    /// External collaborators
    pub env: &'a Environment<'a>,
}

/// Renderer output: the text plus the flags the orchestrator acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// The rendered text
    pub text: String,
    /// True when the text contains unexpanded template directives that the
    /// orchestrator must re-expand (bounded)
    pub has_templates: bool,
    /// True when the text is final markup that must not be re-parsed or
    /// re-escaped downstream
    pub is_final_markup: bool,
    /// User-facing messages produced while rendering (data errors)
    pub messages: Vec<String>,
}

impl Rendered {
    /// Plain text output.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Final-markup output.
    pub fn markup(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final_markup: true,
            ..Self::default()
        }
    }

    /// Builder: flag unexpanded template directives.
    pub fn with_templates(mut self) -> Self {
        self.has_templates = true;
        self
    }

    /// Builder: attach a user-facing message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}

/// A renderer-level failure.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer cannot proceed with this configuration; the orchestrator
    /// converts this into inline error text, never a fatal abort
    #[error("{0}")]
    Unsupported(String),

    /// A collaborator failed; propagates out of the render call
    #[error(transparent)]
    Fatal(#[from] QueryfmtError),
}

/// One output format's renderer.
pub trait FormatRenderer {
    /// The format tag this renderer serves.
    fn format(&self) -> Format;

    /// MIME type of the produced output.
    fn mime_type(&self, _config: &RenderConfig) -> &'static str {
        "text/plain"
    }

    /// File extension for file-mode output.
    fn file_extension(&self) -> &'static str {
        "txt"
    }

    /// Render the result (or its aggregation) to text.
    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, RenderError>;
}

/// Look up the renderer for a format tag.
pub fn renderer_for(format: Format) -> Box<dyn FormatRenderer> {
    match format {
        Format::Table => Box::new(TableRenderer),
        Format::List | Format::Ul | Format::Ol | Format::Template => {
            Box::new(ListRenderer::new(format))
        }
        Format::Csv => Box::new(CsvRenderer),
        Format::Dsv => Box::new(DsvRenderer),
        Format::Json => Box::new(JsonRenderer),
        Format::Rdf => Box::new(RdfRenderer),
        Format::Feed => Box::new(FeedRenderer),
    }
}

/// All of a field's values as one plain-text cell, joined by the value
/// separator.
pub(crate) fn field_text(field: &Field, config: &RenderConfig) -> String {
    field.texts().join(config.value_sep())
}

/// One value as inline HTML: pages with a known URL become links,
/// everything else is escaped short text.
pub(crate) fn value_html(value: &DataValue) -> String {
    match value {
        DataValue::Page(page) => match &page.url {
            Some(url) => format!(
                "<a href=\"{}\">{}</a>",
                xml_escape(url),
                xml_escape(page.short_text())
            ),
            None => xml_escape(page.short_text()),
        },
        other => xml_escape(&other.short_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PageRef;

    #[test]
    fn test_renderer_registry_covers_every_format() {
        for format in [
            Format::Table,
            Format::List,
            Format::Ul,
            Format::Ol,
            Format::Template,
            Format::Csv,
            Format::Dsv,
            Format::Json,
            Format::Rdf,
            Format::Feed,
        ] {
            let renderer = renderer_for(format);
            // Template shares the list renderer; every other tag maps to itself
            if format == Format::Template {
                assert_eq!(renderer.format(), Format::Template);
            } else {
                assert_eq!(renderer.format(), format);
            }
        }
    }

    #[test]
    fn test_field_text_joins_values() {
        let field = Field::new(vec![DataValue::text("a"), DataValue::text("b")]);
        let config = RenderConfig::default();
        assert_eq!(field_text(&field, &config), "a, b");

        let config = config.with_value_sep("; ");
        assert_eq!(field_text(&field, &config), "a; b");
    }

    #[test]
    fn test_value_html_links_pages() {
        let linked = DataValue::Page(PageRef::new("Berlin").url("https://example.org/Berlin"));
        assert_eq!(
            value_html(&linked),
            "<a href=\"https://example.org/Berlin\">Berlin</a>"
        );
        assert_eq!(value_html(&DataValue::page("Berlin")), "Berlin");
        assert_eq!(value_html(&DataValue::text("a < b")), "a &lt; b");
    }
}
