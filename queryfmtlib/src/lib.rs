//! # queryfmtlib
//!
//! A rendering library that turns structured query results - rows of typed,
//! multi-valued fields - into tables, lists, CSV, DSV, JSON, feeds, and RDF
//! exports, or into a numeric distribution/aggregation report.
//!
//! ## Overview
//!
//! The pipeline has four stages:
//!
//! - **Data**: a `QueryResult` produced by an external query engine - print
//!   requests describing columns, rows of `Field`s holding typed
//!   `DataValue`s
//! - **Configuration**: a typed `RenderConfig` resolved once per render
//!   call, with per-format defaults and silent normalization of bad values
//! - **Rendering**: one `FormatRenderer` per output format, selected
//!   through a format-tag registry
//! - **Orchestration**: the `ResultPrinter`, which owns the empty-result
//!   short-circuit, inline error text, intro/outro, the further-results
//!   link, file metadata, and the recursion-bounded re-expansion of
//!   template directives
//!
//! Aggregation (distribution counting and numeric summing through nested
//! container values) and multi-column list layout sit beside the renderers
//! and are driven by configuration.
//!
//! ## Example
//!
//! ```rust
//! use queryfmtlib::{
//!     DataValue, Environment, Field, Format, OutputMode, PrintRequest, QueryResult,
//!     RenderConfig, ResultPrinter, Row,
//! };
//!
//! let result = QueryResult::new(
//!     vec![
//!         PrintRequest::subject("City"),
//!         PrintRequest::property("Country", "page"),
//!     ],
//!     vec![Row::new(vec![
//!         Field::new(vec![DataValue::page("Berlin")]),
//!         Field::new(vec![DataValue::page("Germany")]),
//!     ])],
//! );
//!
//! let printer = ResultPrinter::new(RenderConfig::new(Format::Csv));
//! let output = printer
//!     .render(&result, &Environment::default(), OutputMode::Wiki)
//!     .unwrap();
//! assert_eq!(output.as_text(), "City,Country\nBerlin,Germany\n");
//! ```

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod escape;
pub mod layout;
pub mod printer;
pub mod render;

pub use aggregate::{aggregate, distribution, sum, AggregationMode, AggregationResult};
pub use config::{
    AggregateBy, Format, HeaderMode, RenderConfig, SortOrder, DEFAULT_DSV_SEPARATOR,
};
pub use data::{
    format_number, ColumnMode, DataValue, Field, PageRef, PrintRequest, QueryResult, Row, SortKey,
};
pub use error::QueryfmtError;
pub use escape::{csv_field, csv_split, decode_entities, dsv_escape, dsv_unescape, xml_escape};
pub use layout::ColumnLayout;
pub use printer::{
    Environment, FileOutput, MarkupContext, Output, OutputMode, PageStore, ResultPrinter,
};
pub use render::rdf::{OntologyHeader, RdfObject, Statement, SubjectGraph, TripleSerializer};
pub use render::{renderer_for, FormatRenderer, RenderContext, RenderError, Rendered};

/// Result type for queryfmtlib operations
pub type Result<T> = std::result::Result<T, QueryfmtError>;
