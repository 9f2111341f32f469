use crate::error::QueryParseError;
use crate::GenerateQuery;
use std::fmt::Debug;
use std::sync::Arc;

/// Parses the text of a generate query.
///
/// The engine uses a parser to load named queries that are not registered in advance.
pub trait QueryParser: Debug + Send + Sync {
    /// Parses `text`. Relative IRIs are resolved against `base_iri`.
    fn parse(&self, text: &str, base_iri: Option<&str>) -> Result<GenerateQuery, QueryParseError>;
}

pub type QueryParserRef = Arc<dyn QueryParser>;
