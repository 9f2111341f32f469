//! Built-in iterator and binding functions.
//!
//! Functions that parse concrete document formats are provided by other crates through the
//! registry traits of `sparql-generate-common`.

mod args;
pub mod iterators;
mod registry;
pub mod scalars;

pub use registry::DefaultFunctionRegistry;
