use sparql_generate_common::error::EngineError;
use sparql_generate_logical::{PlanError, QueryParseError};
use sparql_generate_model::NamedNode;

/// A fatal error of a generation run.
///
/// Failures while evaluating expressions, fetching sources, or iterating over a single input are
/// not fatal. They leave the affected bindings out and are only logged.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GenerationError {
    /// A named query could not be compiled.
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// A named query could not be parsed.
    #[error(transparent)]
    QueryParse(#[from] QueryParseError),
    /// The graph-pattern engine failed to evaluate the select part of a query.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The query has a select part but no graph-pattern engine is configured.
    #[error("The query requires a graph pattern engine but none is configured")]
    NoGraphPatternEngine,
    /// A named query is neither registered nor loadable.
    #[error("The named query {0} could not be found")]
    QueryNotFound(NamedNode),
    /// A named query must be loaded but no query parser is configured.
    #[error("Loading the named query {0} requires a query parser but none is configured")]
    NoQueryParser(NamedNode),
    /// A named query without signature is called with arguments.
    #[error("The query {0} does not declare a signature but is called with arguments")]
    ArgumentsWithoutSignature(NamedNode),
    /// A named query with a signature is called without arguments.
    #[error("The query {0} declares a signature but is called without arguments")]
    MissingArguments(NamedNode),
    /// The number of call arguments does not match the signature.
    #[error("The query {name} expects {expected} arguments but {actual} were given")]
    ArityMismatch {
        name: NamedNode,
        expected: usize,
        actual: usize,
    },
    /// No iterator function is registered under this IRI.
    #[error("The iterator function {0} is unknown")]
    UnknownIteratorFunction(NamedNode),
    /// A plan node appeared in a position where it cannot be executed.
    #[error("A {0} node cannot be executed at this position of the plan")]
    UnexpectedPlanNode(&'static str),
    #[error("An internal error that likely indicates a bug in the generate engine: {0}")]
    Internal(String),
}
