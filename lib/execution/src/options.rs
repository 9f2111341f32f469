use std::num::NonZeroUsize;
use std::thread::available_parallelism;
use std::time::Duration;

/// The media type requested when a named query is loaded through the document resolver.
pub const DEFAULT_QUERY_MEDIA_TYPE: &str = "application/vnd.sparql-generate";

/// Options for a generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateOptions {
    /// The maximum number of concurrent source fetches and graph-pattern engine calls.
    pub max_concurrency: usize,
    /// Closes the run after this duration. Output produced until then is kept.
    pub timeout: Option<Duration>,
    /// The accept hint used when named queries are loaded.
    pub query_media_type: Option<String>,
}

impl GenerateOptions {
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_concurrency: available_parallelism().map_or(1, NonZeroUsize::get),
            timeout: None,
            query_media_type: Some(DEFAULT_QUERY_MEDIA_TYPE.to_owned()),
        }
    }
}
