use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// The media type that matches any document.
pub const ANY_MEDIA_TYPE: &str = "*/*";

/// A document returned by a [DocumentResolver].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// The content of the document.
    pub content: String,
    /// The media type of the document, if known (e.g., `text/csv`).
    pub media_type: Option<String>,
}

impl Document {
    /// Creates a new [Document].
    pub fn new(content: impl Into<String>, media_type: Option<&str>) -> Self {
        Self {
            content: content.into(),
            media_type: media_type.map(ToOwned::to_owned),
        }
    }

    /// Returns whether this document is acceptable for the given `accept` media type.
    ///
    /// A document without a media type is acceptable for any request.
    pub fn matches(&self, accept: Option<&str>) -> bool {
        match (accept, self.media_type.as_deref()) {
            (None | Some(ANY_MEDIA_TYPE), _) | (_, None) => true,
            (Some(accept), Some(media_type)) => accept.eq_ignore_ascii_case(media_type),
        }
    }
}

/// Resolves documents by their URI.
///
/// Failing to find or read a document is not an error: the resolver simply returns `None`.
#[async_trait]
pub trait DocumentResolver: Debug + Send + Sync {
    /// Opens the document identified by `uri`. If `accept` is given, only a document of this
    /// media type is returned.
    async fn open(&self, uri: &str, accept: Option<&str>) -> Option<Document>;
}

pub type DocumentResolverRef = Arc<dyn DocumentResolver>;

/// A [DocumentResolver] that serves documents from memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryResolver {
    documents: HashMap<String, Document>,
}

impl InMemoryResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `document` under `uri`, replacing any previous document.
    #[must_use]
    pub fn with_document(mut self, uri: impl Into<String>, document: Document) -> Self {
        self.insert(uri, document);
        self
    }

    /// Registers `document` under `uri`, replacing any previous document.
    pub fn insert(&mut self, uri: impl Into<String>, document: Document) {
        self.documents.insert(uri.into(), document);
    }
}

#[async_trait]
impl DocumentResolver for InMemoryResolver {
    async fn open(&self, uri: &str, accept: Option<&str>) -> Option<Document> {
        self.documents
            .get(uri)
            .filter(|document| document.matches(accept))
            .cloned()
    }
}

/// A [DocumentResolver] that reads `file:` URIs from the local file system.
///
/// Relative URIs (without a scheme) are resolved against the base directory.
#[derive(Clone, Debug)]
pub struct FileResolver {
    base_directory: PathBuf,
}

impl FileResolver {
    /// Creates a new resolver that resolves relative paths against `base_directory`.
    pub fn new(base_directory: impl Into<PathBuf>) -> Self {
        Self {
            base_directory: base_directory.into(),
        }
    }

    fn path_of(&self, uri: &str) -> Option<PathBuf> {
        if let Some(path) = uri.strip_prefix("file://") {
            return Some(PathBuf::from(path));
        }
        if let Some(path) = uri.strip_prefix("file:") {
            return Some(PathBuf::from(path));
        }
        if uri.contains(':') {
            return None;
        }
        Some(self.base_directory.join(uri))
    }
}

#[async_trait]
impl DocumentResolver for FileResolver {
    async fn open(&self, uri: &str, accept: Option<&str>) -> Option<Document> {
        let path = self.path_of(uri)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(error) => {
                debug!("Could not read {}: {error}", path.display());
                return None;
            }
        };
        let document = Document::new(content, guess_media_type(&path));
        document.matches(accept).then_some(document)
    }
}

fn guess_media_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "csv" => Some("text/csv"),
        "tsv" => Some("text/tab-separated-values"),
        "json" => Some("application/json"),
        "xml" => Some("application/xml"),
        "html" => Some("text/html"),
        "ttl" => Some("text/turtle"),
        "txt" => Some("text/plain"),
        "rqg" => Some("application/vnd.sparql-generate"),
        _ => None,
    }
}
