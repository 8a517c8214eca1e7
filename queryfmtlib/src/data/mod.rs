//! Data model: what a query result looks like before rendering.
//!
//! This module defines the first stage of the pipeline - the shape of the
//! data every renderer consumes. It provides:
//!
//! - **Values**: typed `DataValue`s with text, numeric, and sort-key views
//! - **Columns**: `PrintRequest` declarations (label, mode, value type)
//! - **Rows**: `Field` holders and the `QueryResult` container
//!
//! ## Example
//!
//! ```rust,ignore
//! use queryfmtlib::data::{DataValue, Field, PrintRequest, QueryResult, Row};
//!
//! let result = QueryResult::new(
//!     vec![PrintRequest::subject("City")],
//!     vec![Row::new(vec![Field::new(vec![DataValue::page("Berlin")])])],
//! );
//! ```

pub mod result;
pub mod value;

pub use result::{ColumnMode, Field, PrintRequest, QueryResult, Row};
pub use value::{format_number, DataValue, PageRef, SortKey};
