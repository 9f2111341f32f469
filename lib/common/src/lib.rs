//! Interfaces between the generate engine and the surrounding system.
//!
//! The engine does not parse documents, evaluate graph patterns, or serialize its output itself.
//! These concerns are delegated to implementations of the traits in this crate.

mod engine;
pub mod error;
mod function;
mod iterator;
mod resolver;
mod sink;

pub use engine::*;
pub use function::*;
pub use iterator::*;
pub use resolver::*;
pub use sink::*;
