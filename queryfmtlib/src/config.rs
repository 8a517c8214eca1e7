//! Render configuration: every recognized option, typed, with defaults.
//!
//! Configuration is resolved once per render call from caller-supplied
//! key/value parameters merged with per-format defaults, and is read-only
//! afterwards. Unsupported values never fail resolution - they are
//! normalized to the nearest valid default.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default DSV separator, also the fallback when a caller asks for an
/// unusable one.
pub const DEFAULT_DSV_SEPARATOR: char = ':';

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// HTML table, one row per result row
    #[default]
    Table,
    /// Plain list with separators
    List,
    /// Unordered (bulleted) list
    Ul,
    /// Ordered (numbered) list
    Ol,
    /// List rendering through a named template
    Template,
    /// Comma-separated values
    Csv,
    /// Delimiter-separated values with backslash escapes
    Dsv,
    /// JSON document
    Json,
    /// RDF export through the external serializer
    Rdf,
    /// RSS/Atom feed
    Feed,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "broadtable" => Ok(Format::Table),
            "list" => Ok(Format::List),
            "ul" | "itemized" => Ok(Format::Ul),
            "ol" | "ordered" | "numbered" => Ok(Format::Ol),
            "template" => Ok(Format::Template),
            "csv" => Ok(Format::Csv),
            "dsv" => Ok(Format::Dsv),
            "json" => Ok(Format::Json),
            "rdf" | "turtle" => Ok(Format::Rdf),
            "feed" | "rss" | "atom" => Ok(Format::Feed),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl Format {
    /// True for formats whose natural output is a downloadable file.
    pub fn is_file_format(self) -> bool {
        matches!(
            self,
            Format::Csv | Format::Dsv | Format::Json | Format::Rdf
        )
    }
}

/// Header row behavior for tables and CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    /// Show styled headers (default)
    #[default]
    Show,
    /// No header row at all
    Hide,
    /// Show headers without styling
    Plain,
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "show" => Ok(HeaderMode::Show),
            "hide" | "none" => Ok(HeaderMode::Hide),
            "plain" => Ok(HeaderMode::Plain),
            _ => Err(format!("Unknown header mode: {}", s)),
        }
    }
}

/// Sort direction for aggregation output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Keep insertion order
    #[default]
    None,
    /// Smallest value first
    Asc,
    /// Largest value first
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(SortOrder::None),
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// What sum-mode aggregation keys its totals by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateBy {
    /// Key totals by each row's subject
    #[default]
    Subject,
    /// Key totals by each column's label
    Property,
}

impl FromStr for AggregateBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "subject" => Ok(AggregateBy::Subject),
            "property" => Ok(AggregateBy::Property),
            _ => Err(format!("Unknown aggregation subject: {}", s)),
        }
    }
}

/// Resolved render configuration.
///
/// Renderers only read from this; nothing mutates it after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Selected output format
    pub format: Format,
    /// Row limit requested from the query engine (pass-through only)
    pub limit: Option<usize>,
    /// Row offset requested from the query engine (pass-through only)
    pub offset: usize,
    /// Header row behavior
    pub headers: HeaderMode,
    /// Separator between list items / CSV columns (per-format default
    /// applies when unset)
    pub sep: Option<String>,
    /// Separator between multiple values of one field
    pub value_sep: Option<String>,
    /// DSV field separator (backslash is not allowed and falls back to `:`)
    pub dsv_sep: char,
    /// Template name for template-packed list output
    pub template: Option<String>,
    /// Pack template arguments as `label=value` instead of `1=`, `2=`, ...
    pub named_args: bool,
    /// Extra parameter handed to every template call
    pub user_param: Option<String>,
    /// Number of columns for multi-column list layout
    pub columns: usize,
    /// Distribution mode: count value occurrences instead of listing them
    pub distribution: bool,
    /// Sort applied to aggregation output
    pub distribution_sort: SortOrder,
    /// Entry limit applied to aggregation output, after sorting
    pub distribution_limit: Option<usize>,
    /// Sum mode: aggregate numeric leaves, keyed by subject or property
    pub aggregate_by: Option<AggregateBy>,
    /// Whether to append a further-results link when rows were truncated
    pub link_further: bool,
    /// Label of the further-results link
    pub search_label: Option<String>,
    /// Text prepended to non-empty output
    pub intro: String,
    /// Text appended to non-empty output
    pub outro: String,
    /// Text shown when the result is empty
    pub default_text: String,
    /// Whether collected error messages are shown inline
    pub show_errors: bool,
    /// Whether this render is embedded inline (affects empty-result output)
    pub inline: bool,
    /// Emit a UTF-8 byte-order mark in CSV output
    pub bom: bool,
    /// Merge CSV rows sharing an identical first column
    pub merge: bool,
    /// Suggested download filename (overrides the per-format default)
    pub filename: Option<String>,
    /// Feed flavor: "rss" or "atom"; anything else is a caller error the
    /// feed renderer reports
    pub feed_kind: String,
    /// Feed channel title
    pub feed_title: Option<String>,
    /// Feed channel description
    pub feed_description: Option<String>,
    /// Prefix feed item descriptions with full page content
    pub page_content: bool,
    /// Pretty-print JSON output
    pub pretty: bool,
    /// Maximum depth for re-entrant template expansion
    pub max_recursion_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: Format::default(),
            limit: None,
            offset: 0,
            headers: HeaderMode::default(),
            sep: None,
            value_sep: None,
            dsv_sep: DEFAULT_DSV_SEPARATOR,
            template: None,
            named_args: false,
            user_param: None,
            columns: 1,
            distribution: false,
            distribution_sort: SortOrder::None,
            distribution_limit: None,
            aggregate_by: None,
            link_further: true,
            search_label: None,
            intro: String::new(),
            outro: String::new(),
            default_text: String::new(),
            show_errors: true,
            inline: true,
            bom: false,
            merge: false,
            filename: None,
            feed_kind: "rss".to_string(),
            feed_title: None,
            feed_description: None,
            page_content: false,
            pretty: true,
            max_recursion_depth: 2,
        }
    }
}

impl RenderConfig {
    /// Create a default configuration for a format.
    pub fn new(format: Format) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Resolve a configuration from caller-supplied key/value parameters.
    ///
    /// Unknown keys are ignored; unsupported values are normalized to the
    /// option's default. This never fails.
    pub fn from_params<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut config = Self::default();

        for (key, value) in params {
            match key.to_lowercase().as_str() {
                "format" => {
                    config.format = value.parse().unwrap_or_default();
                    // "rss"/"atom" double as feed-kind shorthands
                    let lowered = value.to_lowercase();
                    if lowered == "rss" || lowered == "atom" {
                        config.feed_kind = lowered;
                    }
                }
                "limit" => config.limit = value.parse().ok(),
                "offset" => config.offset = value.parse().unwrap_or(0),
                "headers" => config.headers = value.parse().unwrap_or_default(),
                "sep" => config.sep = Some(value.to_string()),
                "valuesep" => config.value_sep = Some(value.to_string()),
                "separator" => config = config.with_dsv_sep(value),
                "template" => {
                    config.template = non_empty(value);
                }
                "named args" | "namedargs" => config.named_args = parse_flag(value, false),
                "userparam" => config.user_param = non_empty(value),
                "columns" => {
                    config.columns = value.parse().unwrap_or(1);
                }
                "distribution" => config.distribution = parse_flag(value, false),
                "distributionsort" => {
                    config.distribution_sort = value.parse().unwrap_or_default();
                }
                "distributionlimit" => config.distribution_limit = value.parse().ok(),
                "aggregation" => config.aggregate_by = value.parse().ok(),
                "link" => config.link_further = !matches!(value.to_lowercase().as_str(), "none"),
                "searchlabel" => config.search_label = Some(value.to_string()),
                "intro" => config.intro = value.to_string(),
                "outro" => config.outro = value.to_string(),
                "default" => config.default_text = value.to_string(),
                "bom" => config.bom = parse_flag(value, false),
                "merge" => config.merge = parse_flag(value, false),
                "filename" => config.filename = non_empty(value),
                "type" => config.feed_kind = value.to_lowercase(),
                "title" => config.feed_title = non_empty(value),
                "description" => config.feed_description = non_empty(value),
                "page content" | "pagecontent" => config.page_content = parse_flag(value, false),
                "prettyprint" => config.pretty = parse_flag(value, true),
                _ => {}
            }
        }

        config
    }

    /// Separator between list items (default `", "`).
    pub fn list_sep(&self) -> &str {
        self.sep.as_deref().unwrap_or(", ")
    }

    /// CSV column separator: first character of `sep`, default `,`.
    pub fn csv_sep(&self) -> char {
        self.sep
            .as_deref()
            .and_then(|s| s.chars().next())
            .unwrap_or(',')
    }

    /// Separator between multiple values of one field (default `", "`).
    pub fn value_sep(&self) -> &str {
        self.value_sep.as_deref().unwrap_or(", ")
    }

    /// Builder: select a format.
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Builder: set header behavior.
    pub fn with_headers(mut self, headers: HeaderMode) -> Self {
        self.headers = headers;
        self
    }

    /// Builder: set the item separator.
    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = Some(sep.into());
        self
    }

    /// Builder: set the value separator.
    pub fn with_value_sep(mut self, sep: impl Into<String>) -> Self {
        self.value_sep = Some(sep.into());
        self
    }

    /// Builder: set the DSV separator.
    ///
    /// Backslash and multi-character separators are unusable; the previous
    /// separator is kept silently, matching how other unsupported option
    /// values degrade.
    pub fn with_dsv_sep(mut self, sep: &str) -> Self {
        let mut chars = sep.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c != '\\' {
                self.dsv_sep = c;
            }
        }
        self
    }

    /// Builder: set the template name.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Builder: set the column count.
    pub fn with_columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// Builder: enable distribution mode.
    pub fn with_distribution(mut self) -> Self {
        self.distribution = true;
        self
    }

    /// Builder: set the aggregation sort order.
    pub fn with_distribution_sort(mut self, sort: SortOrder) -> Self {
        self.distribution_sort = sort;
        self
    }

    /// Builder: set the aggregation entry limit.
    pub fn with_distribution_limit(mut self, limit: usize) -> Self {
        self.distribution_limit = Some(limit);
        self
    }

    /// Builder: enable sum-mode aggregation.
    pub fn with_aggregation(mut self, by: AggregateBy) -> Self {
        self.aggregate_by = Some(by);
        self
    }

    /// Builder: set the empty-result text.
    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = text.into();
        self
    }

    /// Builder: set the intro text.
    pub fn with_intro(mut self, text: impl Into<String>) -> Self {
        self.intro = text.into();
        self
    }

    /// Builder: set the outro text.
    pub fn with_outro(mut self, text: impl Into<String>) -> Self {
        self.outro = text.into();
        self
    }

    /// Builder: set the further-results link label.
    pub fn with_search_label(mut self, label: impl Into<String>) -> Self {
        self.search_label = Some(label.into());
        self
    }

    /// Builder: disable the further-results link.
    pub fn without_link(mut self) -> Self {
        self.link_further = false;
        self
    }

    /// Builder: set the suggested download filename.
    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    /// True when an aggregation pass runs before rendering.
    pub fn aggregates(&self) -> bool {
        self.distribution || self.aggregate_by.is_some()
    }
}

/// Parse a boolean-ish option value, falling back to a default.
fn parse_flag(value: &str, default: bool) -> bool {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => true,
        "false" | "no" | "off" | "0" => false,
        _ => default,
    }
}

/// Treat empty strings as unset.
fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
