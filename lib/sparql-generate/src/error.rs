use sparql_generate_execution::GenerationError;
use sparql_generate_logical::{PlanError, QueryParseError};

/// An error raised by the [`SparqlGenerate`](crate::SparqlGenerate) engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SparqlGenerateError {
    /// The query could not be compiled.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// The query text could not be parsed.
    #[error(transparent)]
    Parse(#[from] QueryParseError),
    /// The execution of the query failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// Parsing a query requires a query parser.
    #[error("No query parser is configured")]
    NoQueryParser,
    /// Only queries with a name can be registered.
    #[error("Only named queries can be registered")]
    UnnamedQuery,
    /// The initial values do not fit the signature of the query.
    #[error("Invalid initial values: {0}")]
    InvalidInitialValues(String),
    /// The task running the query panicked or was aborted.
    #[error("The generation task failed: {0}")]
    Task(String),
}
