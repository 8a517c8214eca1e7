//! RDF renderer: subject-centric statement graphs for an external serializer.
//!
//! For each row, a graph is keyed by the row's subject column. Property
//! columns contribute one statement per value, category columns contribute
//! is-a statements, and the subject/category-count columns are skipped.
//! The accumulated graphs plus an ontology header go to the opaque
//! [`TripleSerializer`] collaborator; the low-level Turtle grammar is not
//! this crate's concern.

use serde::Serialize;

use crate::config::{Format, RenderConfig};
use crate::data::{ColumnMode, DataValue, Field, QueryResult};
use crate::error::QueryfmtError;
use crate::render::{FormatRenderer, RenderContext, RenderError, Rendered};

/// Namespace/base information handed to the serializer ahead of the graphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OntologyHeader {
    /// Base IRI for relative subject names, if any
    pub base: Option<String>,
    /// Prefix declarations as (prefix, IRI) pairs
    pub prefixes: Vec<(String, String)>,
}

/// Object position of a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RdfObject {
    /// A named resource (page URL or title)
    Resource(String),
    /// A typed literal
    Literal {
        /// Lexical form
        value: String,
        /// Value type id ("number", "text", ...)
        type_id: String,
    },
}

/// One statement about a subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    /// `subject property object`
    Property {
        /// Property name (the column label)
        name: String,
        /// Object value
        object: RdfObject,
    },
    /// `subject is-a category`
    IsA {
        /// Category name
        category: String,
    },
}

/// All statements collected for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectGraph {
    /// The subject's name (page title)
    pub subject: String,
    /// Statements in column order
    pub statements: Vec<Statement>,
}

/// The external serializer collaborator. Receives pre-built structured
/// triples and an ontology header, returns serialized bytes.
pub trait TripleSerializer {
    /// Serialize the graphs to output bytes.
    fn serialize(
        &self,
        header: &OntologyHeader,
        graphs: &[SubjectGraph],
    ) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Renders the `rdf` format.
pub struct RdfRenderer;

impl FormatRenderer for RdfRenderer {
    fn format(&self) -> Format {
        Format::Rdf
    }

    fn mime_type(&self, _config: &RenderConfig) -> &'static str {
        "text/turtle"
    }

    fn file_extension(&self) -> &'static str {
        "ttl"
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<Rendered, RenderError> {
        let serializer = ctx
            .env
            .serializer
            .ok_or(RenderError::Fatal(QueryfmtError::SerializerMissing))?;

        let graphs = build_graphs(ctx.result);
        let header = OntologyHeader::default();

        let bytes = serializer
            .serialize(&header, &graphs)
            .map_err(QueryfmtError::Serializer)
            .map_err(RenderError::Fatal)?;

        let mut rendered = Rendered::text(String::from_utf8_lossy(&bytes).into_owned());
        if ctx.result.count() == 0 {
            rendered = rendered.with_message("the export is empty because the result has no rows");
        }
        Ok(rendered)
    }
}

/// Build one graph per row, keyed by the subject column.
pub fn build_graphs(result: &QueryResult) -> Vec<SubjectGraph> {
    let subject_index = result.subject_index();

    result
        .rows
        .iter()
        .map(|row| {
            let subject = row
                .fields
                .get(subject_index)
                .and_then(Field::first)
                .map(DataValue::label_text)
                .unwrap_or_default();

            let mut statements = Vec::new();
            for (index, field) in row.fields.iter().enumerate() {
                if index == subject_index {
                    continue;
                }
                let Some(request) = result.print_requests.get(index) else {
                    continue;
                };
                match request.mode {
                    ColumnMode::Prop => {
                        for value in flatten(field) {
                            statements.push(Statement::Property {
                                name: request.label.clone(),
                                object: to_object(value),
                            });
                        }
                    }
                    ColumnMode::Cats => {
                        for value in flatten(field) {
                            statements.push(Statement::IsA {
                                category: value.label_text(),
                            });
                        }
                    }
                    // The subject itself and category-count columns carry
                    // no statements
                    ColumnMode::This | ColumnMode::Ccat => {}
                }
            }

            SubjectGraph {
                subject,
                statements,
            }
        })
        .collect()
}

/// Leaf values of a field, descending through containers.
fn flatten(field: &Field) -> Vec<&DataValue> {
    let mut leaves = Vec::new();
    let mut worklist: Vec<&DataValue> = field.values.iter().rev().collect();
    while let Some(value) = worklist.pop() {
        if let DataValue::Container { values } = value {
            worklist.extend(values.iter().rev());
        } else {
            leaves.push(value);
        }
    }
    leaves
}

/// Map a leaf value into statement-object position.
fn to_object(value: &DataValue) -> RdfObject {
    match value {
        DataValue::Page(page) => {
            RdfObject::Resource(page.url.clone().unwrap_or_else(|| page.title.clone()))
        }
        other => RdfObject::Literal {
            value: other.long_text(),
            type_id: other.type_id().to_string(),
        },
    }
}
