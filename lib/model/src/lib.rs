mod error;
mod numeric;
mod sequence;
mod solution;
mod typed_value;
pub mod vocab;

pub use error::*;
pub use numeric::*;
pub use sequence::SolutionSequence;
pub use solution::Solution;
pub use typed_value::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::{
    BlankNode, BlankNodeRef, Graph, IriParseError, Literal, LiteralRef, NamedNode, NamedNodeRef,
    Subject, SubjectRef, Term, TermRef, Triple, TripleRef, Variable, VariableNameParseError,
    VariableRef,
};
pub use oxsdatatypes::{Boolean, Decimal, Double, Float, Integer};
