#![doc(test(attr(deny(warnings))))]

//! This crate defines the execution engine of SPARQL-Generate.
//!
//! # Execution Context
//!
//! Every run of a query is driven by an [`ExecutionContext`]. The context holds the external
//! collaborators of the run (document resolver, function registries, graph-pattern engine, and
//! query parser), the output sink, the blank node scope, and the registry of named queries. It is
//! forked for sub-computations and closed once the run is over, or when it times out.
//!
//! # Executing Plans
//!
//! Queries are compiled into plans by the `sparql-generate-logical` crate. A plan is executed
//! through the following pipeline:
//!
//! ```text
//! Binding Clauses (Iterator, Source, Bind) -> Select Part (optional) -> Output Assembly
//! ```
//!
//! The binding clauses extend each solution. Iterators produce their results incrementally, and
//! each closed [batch](Batches) of results continues through the remaining pipeline
//! independently. The select part is forwarded to the external graph-pattern engine. Finally, the
//! output is assembled as triples (GENERATE), text (TEMPLATE), or solutions (SELECT) and written
//! to the output sink.
//!
//! Failures while evaluating expressions, fetching documents, or iterating over a single input
//! are not fatal: the affected bindings stay unbound. Contract violations abort the run with a
//! [`GenerationError`].

mod batches;
mod clauses;
mod context;
mod error;
mod expression;
mod generate;
mod named;
mod options;
mod root;
mod scope;
mod select;
mod template;

pub use batches::{Batches, ClosedBatch};
pub use context::{AbortGuard, ContextCloser, ExecutionContext, ExecutionServices};
pub use error::GenerationError;
pub use expression::ExpressionEvaluator;
pub use named::{CallKey, QueryRegistry};
pub use options::{GenerateOptions, DEFAULT_QUERY_MEDIA_TYPE};
pub use root::execute_plan;
pub use scope::{allocate_list, BNodeScope};
