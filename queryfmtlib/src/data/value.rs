//! Typed values: the smallest unit a query result contains.
//!
//! Every cell of a result row holds zero or more `DataValue`s. A value knows
//! its type id, a short and a long text representation, an optional numeric
//! payload, and a sort key used for alphabetic/numeric ordering. Container
//! values own a nested sequence of child values and may nest arbitrarily
//! deep - aggregation visits every leaf.

use serde::{Deserialize, Serialize};

/// A page reference: wiki-style subject with an optional display text
/// and an optional resolved URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRef {
    /// Canonical page title
    pub title: String,
    /// Display text shown instead of the title, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Resolved URL for links, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl PageRef {
    /// Create a page reference with no display text or URL.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            display: None,
            url: None,
        }
    }

    /// Builder: set the display text.
    pub fn display(mut self, text: impl Into<String>) -> Self {
        self.display = Some(text.into());
        self
    }

    /// Builder: set the URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Text shown in short contexts: display text when present, title otherwise.
    pub fn short_text(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.title)
    }
}

/// Sort key for a value: either a number or a string.
///
/// Numeric keys sort numerically, string keys alphabetically. Renderers use
/// this to emit hidden sort hints without altering the visible text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortKey {
    /// Numeric ordering
    Number(f64),
    /// Alphabetic ordering
    Text(String),
}

impl SortKey {
    /// The numeric payload, if this key is numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SortKey::Number(n) => Some(*n),
            SortKey::Text(_) => None,
        }
    }
}

/// A single typed value.
///
/// The `type` tag in the serialized form matches [`DataValue::type_id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataValue {
    /// A page reference (subject-like value)
    Page(PageRef),
    /// Plain text
    Text {
        /// The text itself
        text: String,
    },
    /// A number with an optional preformatted display text
    Number {
        /// Numeric payload
        value: f64,
        /// Preformatted display text (unit suffixes etc.), if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
    },
    /// A boolean
    Bool {
        /// The flag itself
        value: bool,
    },
    /// A point in time
    Time {
        /// Seconds since the Unix epoch
        timestamp: i64,
        /// Human-readable form
        #[serde(default)]
        text: String,
    },
    /// A compound value owning nested child values
    Container {
        /// Child values, in order
        values: Vec<DataValue>,
    },
}

impl DataValue {
    /// Convenience constructor for text values.
    pub fn text(text: impl Into<String>) -> Self {
        DataValue::Text { text: text.into() }
    }

    /// Convenience constructor for bare numbers.
    pub fn number(value: f64) -> Self {
        DataValue::Number { value, text: None }
    }

    /// Convenience constructor for page values.
    pub fn page(title: impl Into<String>) -> Self {
        DataValue::Page(PageRef::new(title))
    }

    /// Convenience constructor for container values.
    pub fn container(values: Vec<DataValue>) -> Self {
        DataValue::Container { values }
    }

    /// Type id of this value ("page", "text", "number", "bool", "time",
    /// "container").
    pub fn type_id(&self) -> &'static str {
        match self {
            DataValue::Page(_) => "page",
            DataValue::Text { .. } => "text",
            DataValue::Number { .. } => "number",
            DataValue::Bool { .. } => "bool",
            DataValue::Time { .. } => "time",
            DataValue::Container { .. } => "container",
        }
    }

    /// Short text representation, used in cells, list items, and labels.
    pub fn short_text(&self) -> String {
        match self {
            DataValue::Page(page) => page.short_text().to_string(),
            DataValue::Text { text } => text.clone(),
            DataValue::Number { value, text } => text
                .clone()
                .unwrap_or_else(|| format_number(*value)),
            DataValue::Bool { value } => value.to_string(),
            DataValue::Time { text, timestamp } => {
                if text.is_empty() {
                    timestamp.to_string()
                } else {
                    text.clone()
                }
            }
            DataValue::Container { values } => values
                .iter()
                .map(DataValue::short_text)
                .collect::<Vec<_>>()
                .join("; "),
        }
    }

    /// Long text representation. Pages expose their canonical title here
    /// even when a display text overrides it in short contexts.
    pub fn long_text(&self) -> String {
        match self {
            DataValue::Page(page) => page.title.clone(),
            DataValue::Container { values } => values
                .iter()
                .map(DataValue::long_text)
                .collect::<Vec<_>>()
                .join("; "),
            other => other.short_text(),
        }
    }

    /// Label used by distribution counting: the title for pages, the short
    /// text for everything else.
    pub fn label_text(&self) -> String {
        match self {
            DataValue::Page(page) => page.title.clone(),
            other => other.short_text(),
        }
    }

    /// Numeric payload. Only number values carry one; time values sort
    /// numerically but do not aggregate.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            DataValue::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Sort key: numeric for numbers and times, textual otherwise.
    pub fn sort_key(&self) -> SortKey {
        match self {
            DataValue::Number { value, .. } => SortKey::Number(*value),
            DataValue::Time { timestamp, .. } => SortKey::Number(*timestamp as f64),
            other => SortKey::Text(other.short_text()),
        }
    }

    /// Child values of a container; empty for every other type.
    pub fn children(&self) -> &[DataValue] {
        match self {
            DataValue::Container { values } => values,
            _ => &[],
        }
    }
}

/// Format a number the way cells display it: integers without a decimal
/// point, everything else with the shortest round-trip form.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_short_text_prefers_display() {
        let plain = DataValue::page("Berlin");
        assert_eq!(plain.short_text(), "Berlin");

        let display = DataValue::Page(PageRef::new("Berlin").display("the capital"));
        assert_eq!(display.short_text(), "the capital");
        assert_eq!(display.long_text(), "Berlin");
        assert_eq!(display.label_text(), "Berlin");
    }

    #[test]
    fn test_number_text_override() {
        let bare = DataValue::number(12.0);
        assert_eq!(bare.short_text(), "12");

        let unit = DataValue::Number {
            value: 12.0,
            text: Some("12 km".to_string()),
        };
        assert_eq!(unit.short_text(), "12 km");
        assert_eq!(unit.numeric(), Some(12.0));
    }

    #[test]
    fn test_container_joins_children() {
        let value = DataValue::container(vec![
            DataValue::text("a"),
            DataValue::number(2.0),
        ]);
        assert_eq!(value.short_text(), "a; 2");
        assert_eq!(value.type_id(), "container");
        assert_eq!(value.children().len(), 2);
    }

    #[test]
    fn test_sort_keys() {
        assert_eq!(DataValue::number(3.5).sort_key(), SortKey::Number(3.5));
        assert_eq!(
            DataValue::text("abc").sort_key(),
            SortKey::Text("abc".to_string())
        );
        let time = DataValue::Time {
            timestamp: 86400,
            text: String::new(),
        };
        assert_eq!(time.sort_key().as_number(), Some(86400.0));
        // Times sort numerically but never aggregate
        assert_eq!(time.numeric(), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-7.0), "-7");
        assert_eq!(format_number(2.5), "2.5");
    }

    #[test]
    fn test_value_json_round_trip() {
        let value = DataValue::container(vec![
            DataValue::page("Alpha"),
            DataValue::Number {
                value: 1.5,
                text: None,
            },
        ]);
        let json = serde_json::to_string(&value).unwrap();
        let back: DataValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_value_json_tag_shape() {
        let parsed: DataValue =
            serde_json::from_str(r#"{"type":"page","title":"Alpha"}"#).unwrap();
        assert_eq!(parsed, DataValue::page("Alpha"));
    }
}
