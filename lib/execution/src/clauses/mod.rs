//! The binding clauses that extend each solution before the select part is evaluated.

mod bind;
mod iterator;
mod source;

pub use bind::execute_bind;
pub use iterator::execute_iterator;
pub use source::execute_source;
