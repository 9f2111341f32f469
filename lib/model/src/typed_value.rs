use crate::{Numeric, ThinError, ThinResult};
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Literal, NamedNode, Term};
use std::cmp::Ordering;

/// A term interpreted according to its datatype.
///
/// Expressions operate on [TypedValue]s instead of on plain [Term]s, so that numbers, booleans,
/// and strings can be compared and combined according to their value.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedValue {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    BooleanLiteral(bool),
    NumericLiteral(Numeric),
    SimpleLiteral(String),
    LanguageStringLiteral { value: String, language: String },
    /// A literal with another datatype, or with an invalid lexical form.
    OtherLiteral(Literal),
}

impl TypedValue {
    /// Returns the plain string of a simple literal, an `xsd:string`, or a language-tagged
    /// string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypedValue::SimpleLiteral(value)
            | TypedValue::LanguageStringLiteral { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the language tag of a language-tagged string.
    pub fn language(&self) -> Option<&str> {
        match self {
            TypedValue::LanguageStringLiteral { language, .. } => Some(language),
            _ => None,
        }
    }

    /// Returns whether this value is a literal.
    pub fn is_literal(&self) -> bool {
        !matches!(self, TypedValue::NamedNode(_) | TypedValue::BlankNode(_))
    }

    /// The [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of the value.
    pub fn effective_boolean_value(&self) -> ThinResult<bool> {
        match self {
            TypedValue::BooleanLiteral(value) => Ok(*value),
            TypedValue::NumericLiteral(value) => Ok(value.is_truthy()),
            TypedValue::SimpleLiteral(value) => Ok(!value.is_empty()),
            _ => ThinError::expected(),
        }
    }

    /// Compares two values as defined by the SPARQL `<`, `=`, and `>` operators.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::NumericLiteral(lhs), TypedValue::NumericLiteral(rhs)) => {
                lhs.compare(*rhs)
            }
            (TypedValue::BooleanLiteral(lhs), TypedValue::BooleanLiteral(rhs)) => {
                Some(lhs.cmp(rhs))
            }
            (TypedValue::SimpleLiteral(lhs), TypedValue::SimpleLiteral(rhs)) => Some(lhs.cmp(rhs)),
            (
                TypedValue::LanguageStringLiteral {
                    value: lhs,
                    language: lhs_language,
                },
                TypedValue::LanguageStringLiteral {
                    value: rhs,
                    language: rhs_language,
                },
            ) if lhs_language == rhs_language => Some(lhs.cmp(rhs)),
            (TypedValue::NamedNode(lhs), TypedValue::NamedNode(rhs)) => {
                (lhs == rhs).then_some(Ordering::Equal)
            }
            (TypedValue::BlankNode(lhs), TypedValue::BlankNode(rhs)) => {
                (lhs == rhs).then_some(Ordering::Equal)
            }
            (TypedValue::OtherLiteral(lhs), TypedValue::OtherLiteral(rhs)) => {
                (lhs == rhs).then_some(Ordering::Equal)
            }
            _ => None,
        }
    }
}

impl From<Term> for TypedValue {
    fn from(term: Term) -> Self {
        match term {
            Term::NamedNode(node) => TypedValue::NamedNode(node),
            Term::BlankNode(node) => TypedValue::BlankNode(node),
            Term::Literal(literal) => TypedValue::from(literal),
        }
    }
}

impl From<Literal> for TypedValue {
    fn from(literal: Literal) -> Self {
        if let Some(language) = literal.language() {
            return TypedValue::LanguageStringLiteral {
                value: literal.value().to_owned(),
                language: language.to_owned(),
            };
        }

        let datatype = literal.datatype();
        if datatype == xsd::STRING {
            return TypedValue::SimpleLiteral(literal.value().to_owned());
        }
        if datatype == xsd::BOOLEAN {
            return match literal.value() {
                "true" | "1" => TypedValue::BooleanLiteral(true),
                "false" | "0" => TypedValue::BooleanLiteral(false),
                _ => TypedValue::OtherLiteral(literal),
            };
        }
        match Numeric::from_literal(&literal) {
            Some(Ok(numeric)) => TypedValue::NumericLiteral(numeric),
            Some(Err(_)) | None => TypedValue::OtherLiteral(literal),
        }
    }
}

impl From<TypedValue> for Term {
    fn from(value: TypedValue) -> Self {
        match value {
            TypedValue::NamedNode(node) => Term::NamedNode(node),
            TypedValue::BlankNode(node) => Term::BlankNode(node),
            TypedValue::BooleanLiteral(value) => Term::Literal(Literal::from(value)),
            TypedValue::NumericLiteral(value) => Term::Literal(value.to_literal()),
            TypedValue::SimpleLiteral(value) => Term::Literal(Literal::new_simple_literal(value)),
            TypedValue::LanguageStringLiteral { value, language } => Term::Literal(
                Literal::new_language_tagged_literal_unchecked(value, language),
            ),
            TypedValue::OtherLiteral(literal) => Term::Literal(literal),
        }
    }
}

impl From<Numeric> for TypedValue {
    fn from(value: Numeric) -> Self {
        TypedValue::NumericLiteral(value)
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        TypedValue::BooleanLiteral(value)
    }
}

/// Returns the datatype IRI of a literal value.
pub fn datatype_of(value: &TypedValue) -> Option<NamedNode> {
    match value {
        TypedValue::NamedNode(_) | TypedValue::BlankNode(_) => None,
        TypedValue::BooleanLiteral(_) => Some(xsd::BOOLEAN.into_owned()),
        TypedValue::NumericLiteral(numeric) => Some(numeric.to_literal().datatype().into_owned()),
        TypedValue::SimpleLiteral(_) => Some(xsd::STRING.into_owned()),
        TypedValue::LanguageStringLiteral { .. } => Some(rdf::LANG_STRING.into_owned()),
        TypedValue::OtherLiteral(literal) => Some(literal.datatype().into_owned()),
    }
}
