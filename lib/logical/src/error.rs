use sparql_generate_model::Variable;

/// A structural error detected while compiling a query into a plan.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PlanError {
    /// A `LIST(...)` construct is only allowed in the object position of a triple.
    #[error("LIST(...) may only be used in the object position of a generated triple")]
    ListOutsideObjectPosition,
    /// A `LIST(...)` construct contains another `LIST(...)`.
    #[error("LIST(...) may not be nested")]
    NestedList,
    /// A variable occurs more than once in the signature of a named query.
    #[error("The variable {0} is declared more than once in the query signature")]
    DuplicateSignatureVariable(Variable),
    /// An expression is left in a position that only accepts terms.
    #[error("An expression is used where only an IRI, a literal, or a variable is allowed")]
    EmbeddedExpression,
    /// Lifting embedded expressions did not reach a fixed point.
    #[error("Normalization of embedded expressions did not terminate after {0} passes")]
    NormalizationDidNotConverge(usize),
}

/// An error returned by a [QueryParser](crate::QueryParser).
#[derive(Debug, thiserror::Error)]
#[error("Unable to parse the query: {message}")]
pub struct QueryParseError {
    message: String,
}

impl QueryParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
