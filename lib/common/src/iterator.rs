use crate::error::FunctionError;
use futures::stream::BoxStream;
use sparql_generate_model::{NamedNode, Term};
use std::fmt::Debug;
use std::sync::Arc;

/// A fixed-arity tuple produced by an iterator function. Positions may be absent.
pub type Tuple = Vec<Option<Term>>;

/// Ordered tuples emitted together by an iterator function.
pub type TupleBatch = Vec<Tuple>;

/// The asynchronous output of one iterator function invocation.
///
/// Bounded functions (e.g., iterating over the rows of a document) finish quickly. Unbounded
/// functions (e.g., subscribing to a live feed) may keep emitting batches until the stream is
/// dropped.
pub type TupleStream = BoxStream<'static, Result<TupleBatch, FunctionError>>;

/// A function that produces a stream of tuples for a given list of arguments.
pub trait IteratorFunction: Debug + Send + Sync {
    /// Returns the IRI of the function.
    fn name(&self) -> &str;

    /// Starts the iteration for the given arguments.
    fn invoke(&self, arguments: Vec<Term>) -> Result<TupleStream, FunctionError>;
}

pub type IteratorFunctionRef = Arc<dyn IteratorFunction>;

/// Allows looking up iterator functions by their IRI.
pub trait IteratorFunctionRegistry: Debug + Send + Sync {
    /// Returns the iterator function with the given `name`.
    fn lookup(&self, name: &NamedNode) -> Option<IteratorFunctionRef>;
}

pub type IteratorFunctionRegistryRef = Arc<dyn IteratorFunctionRegistry>;
