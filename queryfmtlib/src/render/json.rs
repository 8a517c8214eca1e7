//! JSON renderer: the full result shape as a document.
//!
//! Serializes print requests and rows (or the aggregation mapping) through
//! serde. Pretty-printing is on by default and can be turned off.

use crate::config::{Format, RenderConfig};
use crate::error::QueryfmtError;
use crate::render::{FormatRenderer, RenderContext, RenderError, Rendered};

/// Renders the `json` format.
pub struct JsonRenderer;

impl FormatRenderer for JsonRenderer {
    fn format(&self) -> Format {
        Format::Json
    }

    fn mime_type(&self, _config: &RenderConfig) -> &'static str {
        "application/json"
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, RenderError> {
        let text = match ctx.aggregated {
            Some(aggregated) => serialize(aggregated, ctx.config.pretty),
            None => serialize(ctx.result, ctx.config.pretty),
        }
        .map_err(|e| RenderError::Fatal(QueryfmtError::Json(e)))?;

        Ok(Rendered::text(text))
    }
}

fn serialize<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
