//! Vocabularies used by the generate engine.

pub use oxrdf::vocab::{rdf, xsd};

/// The IANA media types registry. A media type `a/b` is identified by `{NAMESPACE}a/b`.
pub mod media_types {
    /// The namespace of media type IRIs.
    pub const NAMESPACE: &str = "http://www.iana.org/assignments/media-types/";
}

/// The namespace of the built-in iterator functions.
pub mod iter {
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "http://w3id.org/sparql-generate/iter/";

    /// Iterates over a range of integers.
    pub const FOR: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://w3id.org/sparql-generate/iter/for");
    /// Iterates over the parts of a string.
    pub const SPLIT: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://w3id.org/sparql-generate/iter/Split");
}

/// The namespace of the built-in binding functions.
pub mod fun {
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "http://w3id.org/sparql-generate/fn/";

    /// Returns the part of a string at a given position.
    pub const SPLIT_AT_POSITION: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://w3id.org/sparql-generate/fn/SplitAtPosition");
}
