use sparql_generate_model::{NamedNode, Term, ThinResult};
use std::fmt::Debug;
use std::sync::Arc;

/// A custom function that can be called from the expressions of a query (e.g., in a BIND).
pub trait ScalarFunction: Debug + Send + Sync {
    /// Returns the IRI of the function.
    fn name(&self) -> &str;

    /// Evaluates the function. An error leaves the result unbound.
    fn evaluate(&self, arguments: &[Term]) -> ThinResult<Term>;
}

pub type ScalarFunctionRef = Arc<dyn ScalarFunction>;

/// Allows looking up custom functions by their IRI.
pub trait ScalarFunctionRegistry: Debug + Send + Sync {
    /// Returns the custom function with the given `name`.
    fn lookup(&self, name: &NamedNode) -> Option<ScalarFunctionRef>;
}

pub type ScalarFunctionRegistryRef = Arc<dyn ScalarFunctionRegistry>;
