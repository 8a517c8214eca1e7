//! Result printer: the orchestration layer every render call goes through.
//!
//! The printer resolves what the renderer cannot decide on its own: the
//! empty-result short-circuit, inline error text, intro/outro strings,
//! the further-results link, file output metadata, and the bounded
//! re-expansion of renderer output that still contains template directives.
//!
//! Re-expansion is guarded by a process-wide counter so re-entrant renders
//! across different printer instances stay bounded. The counter is only
//! touched through an RAII guard, so increments and decrements stay
//! symmetric even on early returns.

use std::sync::atomic::{AtomicUsize, Ordering};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::aggregate;
use crate::config::RenderConfig;
use crate::data::QueryResult;
use crate::error::QueryfmtError;
use crate::escape::xml_escape;
use crate::render::{renderer_for, FormatRenderer, RenderContext, RenderError, Rendered};

/// How the caller wants the output delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Raw text for a wiki-markup context
    Wiki,
    /// Markup for an HTML context
    Html,
    /// A downloadable byte stream
    File,
}

/// The printer's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Plain text; the caller may parse or escape it further
    Text(String),
    /// Pre-rendered final markup; downstream callers must not re-escape it
    Markup(String),
    /// File bytes with download metadata
    File(FileOutput),
}

impl Output {
    /// The textual payload, regardless of variant.
    pub fn as_text(&self) -> &str {
        match self {
            Output::Text(text) | Output::Markup(text) => text,
            Output::File(file) => std::str::from_utf8(&file.bytes).unwrap_or_default(),
        }
    }
}

/// File-mode output: bytes plus download metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutput {
    /// The file content
    pub bytes: Vec<u8>,
    /// MIME type of the content
    pub mime_type: String,
    /// Suggested filename
    pub filename: String,
}

/// Characters that survive unencoded in the RFC 6266 `filename*` value.
const FILENAME_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_');

impl FileOutput {
    /// RFC 6266 `Content-Disposition` value: an ASCII-transliterated
    /// `filename` plus a percent-encoded UTF-8 `filename*` fallback when
    /// the name is not plain ASCII.
    pub fn content_disposition(&self) -> String {
        let ascii: String = self
            .filename
            .chars()
            .map(|c| {
                if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if ascii == self.filename {
            format!("attachment; filename=\"{}\"", ascii)
        } else {
            format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                ascii,
                utf8_percent_encode(&self.filename, FILENAME_SET)
            )
        }
    }
}

/// Template expansion and markup parsing, provided by the host wiki engine.
pub trait MarkupContext {
    /// Expand embedded template directives once.
    fn expand_templates(&self, text: &str) -> String;
    /// Parse markup into final output for the requested context.
    fn parse(&self, text: &str) -> String;
}

/// Page content lookup, provided by the host storage layer.
pub trait PageStore {
    /// Full content of a page, if it exists.
    fn content(&self, title: &str) -> Option<String>;
}

/// The external collaborators a render call may use. All optional; absent
/// collaborators degrade the affected feature instead of failing.
#[derive(Clone, Copy, Default)]
pub struct Environment<'a> {
    /// Template expansion and markup parsing
    pub markup: Option<&'a dyn MarkupContext>,
    /// Page content lookup for feed output
    pub pages: Option<&'a dyn PageStore>,
    /// RDF byte emission
    pub serializer: Option<&'a dyn crate::render::rdf::TripleSerializer>,
}

/// Process-wide count of active template re-expansions. Shared across
/// printer instances so nested re-entrant renders stay bounded.
static ACTIVE_EXPANSIONS: AtomicUsize = AtomicUsize::new(0);

/// RAII guard around [`ACTIVE_EXPANSIONS`]: increments on enter, decrements
/// on drop, so the pair stays symmetric on every path out.
struct RecursionGuard;

impl RecursionGuard {
    /// Enter one expansion level and report the depth now active.
    fn enter() -> (Self, usize) {
        let depth = ACTIVE_EXPANSIONS.fetch_add(1, Ordering::SeqCst) + 1;
        (Self, depth)
    }
}

impl Drop for RecursionGuard {
    fn drop(&mut self) {
        ACTIVE_EXPANSIONS.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Orchestrates one render call per [`QueryResult`].
pub struct ResultPrinter {
    config: RenderConfig,
}

impl ResultPrinter {
    /// Create a printer for a resolved configuration.
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// The printer's configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render a result for the requested output mode.
    ///
    /// Renderer-recoverable problems become inline error text; only
    /// collaborator failures surface as `Err`.
    pub fn render(
        &self,
        result: &QueryResult,
        env: &Environment<'_>,
        mode: OutputMode,
    ) -> Result<Output, QueryfmtError> {
        let config = &self.config;
        let mut messages: Vec<String> = result.errors.clone();

        // Empty-result short-circuit: no format body is emitted at all
        if mode != OutputMode::File && result.count() == 0 {
            if !result.has_further_results() {
                let mut text = config.default_text.clone();
                text.push_str(&error_text(&messages, mode, config.show_errors));
                return Ok(Output::Text(text));
            }
            if config.inline {
                let mut text = further_link(result, config, mode).unwrap_or_default();
                text.push_str(&error_text(&messages, mode, config.show_errors));
                return Ok(Output::Text(text));
            }
            // Non-inline renders with further results still show the body
        }

        let renderer = renderer_for(config.format);

        let aggregated = if config.aggregates() {
            let agg_mode = if config.distribution {
                aggregate::AggregationMode::Distribution
            } else {
                aggregate::AggregationMode::Sum
            };
            let mut agg = aggregate::aggregate(
                result,
                agg_mode,
                config.aggregate_by.unwrap_or_default(),
            );
            agg.sort(config.distribution_sort);
            if let Some(limit) = config.distribution_limit {
                agg.truncate(limit);
            }
            if agg.is_empty() && mode != OutputMode::File {
                // Valid outcome: render the empty-data notice, not an
                // empty format body
                messages.push("the query produced no values to aggregate".to_string());
                let mut text = config.default_text.clone();
                text.push_str(&error_text(&messages, mode, config.show_errors));
                return Ok(Output::Text(text));
            }
            Some(agg)
        } else {
            None
        };

        let ctx = RenderContext {
            result,
            config,
            aggregated: aggregated.as_ref(),
            env,
        };
        let rendered = match renderer.render(&ctx) {
            Ok(rendered) => rendered,
            Err(RenderError::Unsupported(message)) => {
                messages.push(message);
                Rendered::default()
            }
            Err(RenderError::Fatal(error)) => return Err(error),
        };
        messages.extend(rendered.messages);

        if mode == OutputMode::File {
            return Ok(Output::File(self.file_output(renderer.as_ref(), rendered.text)));
        }

        let mut text = rendered.text;
        text.push_str(&error_text(&messages, mode, config.show_errors));

        // Intro/outro are parsed as markup only for HTML output with a
        // markup context available
        let (intro, outro) = match (mode, env.markup) {
            (OutputMode::Html, Some(markup)) => {
                (markup.parse(&config.intro), markup.parse(&config.outro))
            }
            _ => (config.intro.clone(), config.outro.clone()),
        };
        text = format!("{}{}{}", intro, text, outro);

        // Re-expand embedded directives exactly once, bounded by the
        // process-wide counter
        if rendered.has_templates {
            if let Some(markup) = env.markup {
                let (guard, depth) = RecursionGuard::enter();
                text = if depth > config.max_recursion_depth {
                    String::new()
                } else {
                    markup.expand_templates(&text)
                };
                drop(guard);
            }
        }

        if result.has_further_results() && config.inline {
            if let Some(link) = further_link(result, config, mode) {
                text.push_str(&link);
            }
        }

        if rendered.is_final_markup && mode == OutputMode::Html {
            Ok(Output::Markup(text))
        } else {
            Ok(Output::Text(text))
        }
    }

    /// Render straight to file output, regardless of format.
    pub fn render_file(
        &self,
        result: &QueryResult,
        env: &Environment<'_>,
    ) -> Result<FileOutput, QueryfmtError> {
        match self.render(result, env, OutputMode::File)? {
            Output::File(file) => Ok(file),
            // render() always returns File in file mode
            _ => unreachable!(),
        }
    }

    fn file_output(&self, renderer: &dyn FormatRenderer, text: String) -> FileOutput {
        let filename = self
            .config
            .filename
            .clone()
            .unwrap_or_else(|| format!("result.{}", renderer.file_extension()));
        FileOutput {
            bytes: text.into_bytes(),
            mime_type: renderer.mime_type(&self.config).to_string(),
            filename,
        }
    }
}

/// Collected messages as inline error text; empty when display is off or
/// nothing was collected.
fn error_text(messages: &[String], mode: OutputMode, show: bool) -> String {
    if !show || messages.is_empty() {
        return String::new();
    }
    let joined = messages.join("; ");
    match mode {
        OutputMode::Html => format!(
            "<span class=\"queryfmt-errors\">{}</span>",
            xml_escape(&joined)
        ),
        _ => format!(" {}", joined),
    }
}

/// The further-results link, when the result is truncated and linking is
/// enabled and a target is known.
fn further_link(result: &QueryResult, config: &RenderConfig, mode: OutputMode) -> Option<String> {
    if !config.link_further {
        return None;
    }
    let url = result.further_url.as_deref()?;
    let label = config.search_label.as_deref().unwrap_or("… further results");
    Some(match mode {
        OutputMode::Html => format!(
            "<a class=\"queryfmt-further\" href=\"{}\">{}</a>",
            xml_escape(url),
            xml_escape(label)
        ),
        _ => format!("[{} {}]", url, label),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AggregateBy, Format, SortOrder};
    use crate::data::{DataValue, Field, PrintRequest, Row};
    use std::cell::Cell;

    fn sample_result() -> QueryResult {
        QueryResult::new(
            vec![
                PrintRequest::subject("City"),
                PrintRequest::property("Country", "page"),
            ],
            vec![Row::new(vec![
                Field::new(vec![DataValue::page("Berlin")]),
                Field::new(vec![DataValue::page("Germany")]),
            ])],
        )
    }

    fn empty_result() -> QueryResult {
        QueryResult::new(vec![PrintRequest::subject("City")], vec![])
    }

    #[test]
    fn test_empty_inline_render_returns_default_text_only() {
        let config = RenderConfig::new(Format::Table).with_default_text("nothing found");
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&empty_result(), &Environment::default(), OutputMode::Wiki)
            .unwrap();
        // Exactly the default text: no table markup, no extras
        assert_eq!(output, Output::Text("nothing found".to_string()));
    }

    #[test]
    fn test_empty_result_appends_query_errors() {
        let mut result = empty_result();
        result.errors.push("unknown property".to_string());
        let config = RenderConfig::new(Format::Table).with_default_text("nothing");
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&result, &Environment::default(), OutputMode::Wiki)
            .unwrap();
        assert_eq!(output.as_text(), "nothing unknown property");
    }

    #[test]
    fn test_empty_with_further_results_links_instead() {
        let result = empty_result().with_further("https://example.org/next");
        let config = RenderConfig::new(Format::Table).with_search_label("more");
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&result, &Environment::default(), OutputMode::Html)
            .unwrap();
        assert_eq!(
            output.as_text(),
            "<a class=\"queryfmt-further\" href=\"https://example.org/next\">more</a>"
        );
    }

    #[test]
    fn test_intro_and_outro_wrap_the_body() {
        let config = RenderConfig::new(Format::List)
            .with_intro("Cities: ")
            .with_outro(".");
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&sample_result(), &Environment::default(), OutputMode::Wiki)
            .unwrap();
        assert_eq!(output.as_text(), "Cities: Berlin (Germany).");
    }

    #[test]
    fn test_further_link_appended_after_body() {
        let result = sample_result().with_further("https://example.org/next");
        let config = RenderConfig::new(Format::List);
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&result, &Environment::default(), OutputMode::Wiki)
            .unwrap();
        assert_eq!(
            output.as_text(),
            "Berlin (Germany)[https://example.org/next … further results]"
        );
    }

    #[test]
    fn test_link_can_be_disabled() {
        let result = sample_result().with_further("https://example.org/next");
        let config = RenderConfig::new(Format::List).without_link();
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&result, &Environment::default(), OutputMode::Wiki)
            .unwrap();
        assert_eq!(output.as_text(), "Berlin (Germany)");
    }

    #[test]
    fn test_html_table_output_is_wrapped_as_markup() {
        let printer = ResultPrinter::new(RenderConfig::new(Format::Table));
        let output = printer
            .render(&sample_result(), &Environment::default(), OutputMode::Html)
            .unwrap();
        assert!(matches!(output, Output::Markup(_)));
    }

    #[test]
    fn test_unsupported_feed_type_becomes_inline_error() {
        let mut config = RenderConfig::new(Format::Feed);
        config.feed_kind = "gopher".to_string();
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&sample_result(), &Environment::default(), OutputMode::Wiki)
            .unwrap();
        assert!(output.as_text().contains("unsupported feed type 'gopher'"));
    }

    #[test]
    fn test_empty_aggregation_renders_notice() {
        // Rows exist but no field carries a value to count
        let result = QueryResult::new(
            vec![PrintRequest::subject("City")],
            vec![Row::new(vec![Field::empty()])],
        );
        let config = RenderConfig::new(Format::Table)
            .with_distribution()
            .with_default_text("no data");
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&result, &Environment::default(), OutputMode::Wiki)
            .unwrap();
        assert!(output.as_text().starts_with("no data"));
        assert!(output.as_text().contains("no values to aggregate"));
    }

    #[test]
    fn test_distribution_pipeline_sorts_and_limits() {
        let result = QueryResult::new(
            vec![PrintRequest::property("Tag", "text")],
            ["foo", "bar", "baz", "foo", "bar", "bar", "ohi"]
                .iter()
                .map(|t| Row::new(vec![Field::new(vec![DataValue::text(*t)])]))
                .collect(),
        );
        let config = RenderConfig::new(Format::List)
            .with_distribution()
            .with_distribution_sort(SortOrder::Desc)
            .with_distribution_limit(2);
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&result, &Environment::default(), OutputMode::Wiki)
            .unwrap();
        assert_eq!(output.as_text(), "bar (3), foo (2)");
    }

    #[test]
    fn test_sum_aggregation_by_subject() {
        let result = QueryResult::new(
            vec![
                PrintRequest::subject("Item"),
                PrintRequest::property("Amount", "number"),
            ],
            vec![
                Row::new(vec![
                    Field::new(vec![DataValue::text("widget")]),
                    Field::new(vec![DataValue::number(3.0)]),
                ]),
                Row::new(vec![
                    Field::new(vec![DataValue::text("widget")]),
                    Field::new(vec![DataValue::number(7.0)]),
                ]),
            ],
        );
        let config = RenderConfig::new(Format::List).with_aggregation(AggregateBy::Subject);
        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&result, &Environment::default(), OutputMode::Wiki)
            .unwrap();
        assert_eq!(output.as_text(), "widget (10)");
    }

    #[test]
    fn test_file_output_metadata() {
        let printer = ResultPrinter::new(RenderConfig::new(Format::Csv));
        let file = printer
            .render_file(&sample_result(), &Environment::default())
            .unwrap();
        assert_eq!(file.mime_type, "text/csv");
        assert_eq!(file.filename, "result.csv");
        assert!(String::from_utf8(file.bytes).unwrap().contains("Berlin"));
    }

    #[test]
    fn test_content_disposition_ascii() {
        let file = FileOutput {
            bytes: Vec::new(),
            mime_type: "text/csv".to_string(),
            filename: "cities.csv".to_string(),
        };
        assert_eq!(
            file.content_disposition(),
            "attachment; filename=\"cities.csv\""
        );
    }

    #[test]
    fn test_content_disposition_utf8_fallback() {
        let file = FileOutput {
            bytes: Vec::new(),
            mime_type: "text/csv".to_string(),
            filename: "städte.csv".to_string(),
        };
        assert_eq!(
            file.content_disposition(),
            "attachment; filename=\"st_dte.csv\"; filename*=UTF-8''st%C3%A4dte.csv"
        );
    }

    /// A markup context whose template expansion re-enters the printer,
    /// the way an embedded directive referencing another query would.
    struct ReentrantMarkup {
        config: RenderConfig,
        result: QueryResult,
        calls: Cell<usize>,
    }

    impl MarkupContext for ReentrantMarkup {
        fn expand_templates(&self, _text: &str) -> String {
            self.calls.set(self.calls.get() + 1);
            let printer = ResultPrinter::new(self.config.clone());
            let env = Environment {
                markup: Some(self),
                ..Environment::default()
            };
            match printer.render(&self.result, &env, OutputMode::Wiki) {
                Ok(output) => output.as_text().to_string(),
                Err(_) => String::new(),
            }
        }

        fn parse(&self, text: &str) -> String {
            text.to_string()
        }
    }

    #[test]
    fn test_reentrant_expansion_is_bounded() {
        let config = RenderConfig::new(Format::List).with_template("Echo");
        let markup = ReentrantMarkup {
            config: config.clone(),
            result: sample_result(),
            calls: Cell::new(0),
        };
        let env = Environment {
            markup: Some(&markup),
            ..Environment::default()
        };

        let printer = ResultPrinter::new(config);
        let output = printer
            .render(&sample_result(), &env, OutputMode::Wiki)
            .unwrap();

        // Expansion ran exactly to the depth limit, then produced empty
        // text instead of recursing further
        assert_eq!(markup.calls.get(), 2);
        assert_eq!(output.as_text(), "");
        // The guard released every level on the way out
        assert_eq!(ACTIVE_EXPANSIONS.load(Ordering::SeqCst), 0);
    }
}
