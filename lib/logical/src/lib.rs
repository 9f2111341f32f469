mod builder;
mod error;
mod normalizer;
mod parser;
pub mod plan;
mod query;

pub use builder::PlanBuilder;
pub use error::{PlanError, QueryParseError};
pub use normalizer::Normalizer;
pub use parser::{QueryParser, QueryParserRef};
pub use query::*;
