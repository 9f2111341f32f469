//! Evaluation of SPARQL expressions against a single solution.
//!
//! Expressions of BIND clauses, iterator and call arguments, and template parts are evaluated
//! here. Graph-pattern related expressions (e.g., `EXISTS`) are the concern of the graph-pattern
//! engine and fail to evaluate.

use crate::context::ExecutionContext;
use sparql_generate_model::vocab::xsd;
use sparql_generate_model::{
    datatype_of, BlankNode, Literal, NamedNode, Numeric, Solution, Term, ThinError, ThinResult,
    TypedValue,
};
use spargebra::algebra::{Expression, Function};
use std::cmp::Ordering;

/// Evaluates expressions within an [ExecutionContext].
///
/// Custom functions are looked up in the scalar function registry of the context, blank nodes
/// created by `BNODE(label)` are minted in the scope of the context, and relative IRIs are
/// resolved against its base IRI.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionEvaluator<'ctx> {
    ctx: &'ctx ExecutionContext,
}

impl<'ctx> ExpressionEvaluator<'ctx> {
    pub fn new(ctx: &'ctx ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Evaluates `expression` against `solution`.
    pub fn evaluate(&self, expression: &Expression, solution: &Solution) -> ThinResult<Term> {
        match expression {
            Expression::NamedNode(node) => Ok(node.clone().into()),
            Expression::Literal(literal) => Ok(literal.clone().into()),
            Expression::Variable(variable) => solution.get(variable).cloned().ok_or(ThinError {}),
            Expression::Or(lhs, rhs) => {
                let lhs = self.effective_boolean_value(lhs, solution);
                let rhs = self.effective_boolean_value(rhs, solution);
                match (lhs, rhs) {
                    (Ok(true), _) | (_, Ok(true)) => Ok(Literal::from(true).into()),
                    (Ok(false), Ok(false)) => Ok(Literal::from(false).into()),
                    _ => ThinError::expected(),
                }
            }
            Expression::And(lhs, rhs) => {
                let lhs = self.effective_boolean_value(lhs, solution);
                let rhs = self.effective_boolean_value(rhs, solution);
                match (lhs, rhs) {
                    (Ok(false), _) | (_, Ok(false)) => Ok(Literal::from(false).into()),
                    (Ok(true), Ok(true)) => Ok(Literal::from(true).into()),
                    _ => ThinError::expected(),
                }
            }
            Expression::Equal(lhs, rhs) => {
                let lhs = self.typed_value(lhs, solution)?;
                let rhs = self.typed_value(rhs, solution)?;
                Ok(Literal::from(equals(&lhs, &rhs)).into())
            }
            Expression::SameTerm(lhs, rhs) => {
                let lhs = self.evaluate(lhs, solution)?;
                let rhs = self.evaluate(rhs, solution)?;
                Ok(Literal::from(lhs == rhs).into())
            }
            Expression::Greater(lhs, rhs) => self.compare(lhs, rhs, solution, Ordering::is_gt),
            Expression::GreaterOrEqual(lhs, rhs) => {
                self.compare(lhs, rhs, solution, Ordering::is_ge)
            }
            Expression::Less(lhs, rhs) => self.compare(lhs, rhs, solution, Ordering::is_lt),
            Expression::LessOrEqual(lhs, rhs) => self.compare(lhs, rhs, solution, Ordering::is_le),
            Expression::In(needle, haystack) => {
                let needle = self.typed_value(needle, solution)?;
                let mut has_error = false;
                for candidate in haystack {
                    match self.typed_value(candidate, solution) {
                        Ok(candidate) if equals(&needle, &candidate) => {
                            return Ok(Literal::from(true).into());
                        }
                        Ok(_) => {}
                        Err(_) => has_error = true,
                    }
                }
                if has_error {
                    ThinError::expected()
                } else {
                    Ok(Literal::from(false).into())
                }
            }
            Expression::Add(lhs, rhs) => self.arithmetic(lhs, rhs, solution, Numeric::checked_add),
            Expression::Subtract(lhs, rhs) => {
                self.arithmetic(lhs, rhs, solution, Numeric::checked_sub)
            }
            Expression::Multiply(lhs, rhs) => {
                self.arithmetic(lhs, rhs, solution, Numeric::checked_mul)
            }
            Expression::Divide(lhs, rhs) => {
                self.arithmetic(lhs, rhs, solution, Numeric::checked_div)
            }
            Expression::UnaryPlus(inner) => {
                let value = self.numeric(inner, solution)?;
                Ok(value.to_literal().into())
            }
            Expression::UnaryMinus(inner) => {
                let value = self.numeric(inner, solution)?.checked_neg()?;
                Ok(value.to_literal().into())
            }
            Expression::Not(inner) => {
                let value = self.effective_boolean_value(inner, solution)?;
                Ok(Literal::from(!value).into())
            }
            Expression::Bound(variable) => Ok(Literal::from(solution.contains(variable)).into()),
            Expression::If(condition, then, otherwise) => {
                if self.effective_boolean_value(condition, solution)? {
                    self.evaluate(then, solution)
                } else {
                    self.evaluate(otherwise, solution)
                }
            }
            Expression::Coalesce(alternatives) => alternatives
                .iter()
                .find_map(|alternative| self.evaluate(alternative, solution).ok())
                .ok_or(ThinError {}),
            Expression::FunctionCall(function, arguments) => {
                self.call(function, arguments, solution)
            }
            Expression::Exists(_) => ThinError::expected(),
        }
    }

    /// Evaluates `expression` and returns its effective boolean value.
    pub fn effective_boolean_value(
        &self,
        expression: &Expression,
        solution: &Solution,
    ) -> ThinResult<bool> {
        self.typed_value(expression, solution)?
            .effective_boolean_value()
    }

    fn typed_value(&self, expression: &Expression, solution: &Solution) -> ThinResult<TypedValue> {
        self.evaluate(expression, solution).map(TypedValue::from)
    }

    fn numeric(&self, expression: &Expression, solution: &Solution) -> ThinResult<Numeric> {
        match self.typed_value(expression, solution)? {
            TypedValue::NumericLiteral(value) => Ok(value),
            _ => ThinError::expected(),
        }
    }

    fn string(&self, expression: &Expression, solution: &Solution) -> ThinResult<StringValue> {
        match self.typed_value(expression, solution)? {
            TypedValue::SimpleLiteral(value) => Ok(StringValue {
                value,
                language: None,
            }),
            TypedValue::LanguageStringLiteral { value, language } => Ok(StringValue {
                value,
                language: Some(language),
            }),
            _ => ThinError::expected(),
        }
    }

    fn integer(&self, expression: &Expression, solution: &Solution) -> ThinResult<i64> {
        match self.numeric(expression, solution)? {
            Numeric::Integer(value) => Ok(i64::from(value)),
            _ => ThinError::expected(),
        }
    }

    fn compare(
        &self,
        lhs: &Expression,
        rhs: &Expression,
        solution: &Solution,
        test: impl FnOnce(Ordering) -> bool,
    ) -> ThinResult<Term> {
        let lhs = self.typed_value(lhs, solution)?;
        let rhs = self.typed_value(rhs, solution)?;
        let ordering = lhs.compare(&rhs).ok_or(ThinError {})?;
        Ok(Literal::from(test(ordering)).into())
    }

    fn arithmetic(
        &self,
        lhs: &Expression,
        rhs: &Expression,
        solution: &Solution,
        operation: impl FnOnce(Numeric, Numeric) -> ThinResult<Numeric>,
    ) -> ThinResult<Term> {
        let lhs = self.numeric(lhs, solution)?;
        let rhs = self.numeric(rhs, solution)?;
        Ok(operation(lhs, rhs)?.to_literal().into())
    }

    fn call(
        &self,
        function: &Function,
        arguments: &[Expression],
        solution: &Solution,
    ) -> ThinResult<Term> {
        match (function, arguments) {
            (Function::Str, [arg]) => {
                let value = match self.evaluate(arg, solution)? {
                    Term::NamedNode(node) => node.into_string(),
                    Term::Literal(literal) => literal.value().to_owned(),
                    Term::BlankNode(_) => return ThinError::expected(),
                };
                Ok(Literal::new_simple_literal(value).into())
            }
            (Function::Lang, [arg]) => match self.evaluate(arg, solution)? {
                Term::Literal(literal) => {
                    Ok(Literal::new_simple_literal(literal.language().unwrap_or_default()).into())
                }
                _ => ThinError::expected(),
            },
            (Function::LangMatches, [tag, range]) => {
                let tag = self.string(tag, solution)?.value;
                let range = self.string(range, solution)?.value;
                Ok(Literal::from(lang_matches(&tag, &range)).into())
            }
            (Function::Datatype, [arg]) => {
                let value = self.typed_value(arg, solution)?;
                datatype_of(&value).map(Term::from).ok_or(ThinError {})
            }
            (Function::Iri, [arg]) => match self.evaluate(arg, solution)? {
                Term::NamedNode(node) => Ok(node.into()),
                Term::Literal(literal) => Ok(self.resolve_iri(literal.value())?.into()),
                Term::BlankNode(_) => ThinError::expected(),
            },
            (Function::BNode, []) => Ok(BlankNode::default().into()),
            (Function::BNode, [label]) => {
                let label = self.string(label, solution)?;
                if label.language.is_some() {
                    return ThinError::expected();
                }
                Ok(self.ctx.scope().mint(&label.value))
            }
            (Function::Abs, [arg]) => {
                Ok(self.numeric(arg, solution)?.checked_abs()?.to_literal().into())
            }
            (Function::Ceil, [arg]) => {
                Ok(self.numeric(arg, solution)?.checked_ceil()?.to_literal().into())
            }
            (Function::Floor, [arg]) => {
                Ok(self.numeric(arg, solution)?.checked_floor()?.to_literal().into())
            }
            (Function::Round, [arg]) => {
                Ok(self.numeric(arg, solution)?.checked_round()?.to_literal().into())
            }
            (Function::Concat, args) => {
                let mut result = String::new();
                let mut language: Option<Option<String>> = None;
                for arg in args {
                    let part = self.string(arg, solution)?;
                    result.push_str(&part.value);
                    language = match language {
                        None => Some(part.language),
                        Some(current) if current == part.language => Some(current),
                        Some(_) => Some(None),
                    };
                }
                Ok(StringValue {
                    value: result,
                    language: language.flatten(),
                }
                .into_term())
            }
            (Function::SubStr, [source, start]) => {
                let source = self.string(source, solution)?;
                let start = self.integer(start, solution)?;
                Ok(source.map(|value| substring(value, start, None)).into_term())
            }
            (Function::SubStr, [source, start, length]) => {
                let source = self.string(source, solution)?;
                let start = self.integer(start, solution)?;
                let length = self.integer(length, solution)?;
                Ok(source
                    .map(|value| substring(value, start, Some(length)))
                    .into_term())
            }
            (Function::StrLen, [arg]) => {
                let length = i64::try_from(self.string(arg, solution)?.value.chars().count())?;
                Ok(Literal::from(length).into())
            }
            (Function::UCase, [arg]) => Ok(self
                .string(arg, solution)?
                .map(str::to_uppercase)
                .into_term()),
            (Function::LCase, [arg]) => Ok(self
                .string(arg, solution)?
                .map(str::to_lowercase)
                .into_term()),
            (Function::EncodeForUri, [arg]) => {
                let value = self.string(arg, solution)?.value;
                Ok(Literal::new_simple_literal(encode_for_uri(&value)).into())
            }
            (Function::Contains, [haystack, needle]) => {
                let (haystack, needle) = self.compatible_strings(haystack, needle, solution)?;
                Ok(Literal::from(haystack.value.contains(&needle)).into())
            }
            (Function::StrStarts, [haystack, needle]) => {
                let (haystack, needle) = self.compatible_strings(haystack, needle, solution)?;
                Ok(Literal::from(haystack.value.starts_with(&needle)).into())
            }
            (Function::StrEnds, [haystack, needle]) => {
                let (haystack, needle) = self.compatible_strings(haystack, needle, solution)?;
                Ok(Literal::from(haystack.value.ends_with(&needle)).into())
            }
            (Function::StrBefore, [haystack, needle]) => {
                let (haystack, needle) = self.compatible_strings(haystack, needle, solution)?;
                Ok(match haystack.value.find(&needle) {
                    Some(position) => haystack
                        .map(|value| value[..position].to_owned())
                        .into_term(),
                    None => Literal::new_simple_literal("").into(),
                })
            }
            (Function::StrAfter, [haystack, needle]) => {
                let (haystack, needle) = self.compatible_strings(haystack, needle, solution)?;
                Ok(match haystack.value.find(&needle) {
                    Some(position) => haystack
                        .map(|value| value[position + needle.len()..].to_owned())
                        .into_term(),
                    None => Literal::new_simple_literal("").into(),
                })
            }
            (Function::StrDt, [value, datatype]) => {
                let value = self.string(value, solution)?;
                let Term::NamedNode(datatype) = self.evaluate(datatype, solution)? else {
                    return ThinError::expected();
                };
                if value.language.is_some() {
                    return ThinError::expected();
                }
                Ok(Literal::new_typed_literal(value.value, datatype).into())
            }
            (Function::StrLang, [value, language]) => {
                let value = self.string(value, solution)?;
                let language = self.string(language, solution)?;
                if value.language.is_some() || language.value.is_empty() {
                    return ThinError::expected();
                }
                Literal::new_language_tagged_literal(value.value, language.value)
                    .map(Term::from)
                    .map_err(|_| ThinError {})
            }
            (Function::IsIri, [arg]) => {
                let value = self.evaluate(arg, solution)?;
                Ok(Literal::from(matches!(value, Term::NamedNode(_))).into())
            }
            (Function::IsBlank, [arg]) => {
                let value = self.evaluate(arg, solution)?;
                Ok(Literal::from(matches!(value, Term::BlankNode(_))).into())
            }
            (Function::IsLiteral, [arg]) => {
                let value = self.evaluate(arg, solution)?;
                Ok(Literal::from(matches!(value, Term::Literal(_))).into())
            }
            (Function::IsNumeric, [arg]) => {
                let value = self.typed_value(arg, solution)?;
                Ok(Literal::from(matches!(value, TypedValue::NumericLiteral(_))).into())
            }
            (Function::Custom(name), args) => self.call_custom(name, args, solution),
            _ => ThinError::expected(),
        }
    }

    fn call_custom(
        &self,
        name: &NamedNode,
        arguments: &[Expression],
        solution: &Solution,
    ) -> ThinResult<Term> {
        let arguments = arguments
            .iter()
            .map(|argument| self.evaluate(argument, solution))
            .collect::<ThinResult<Vec<_>>>()?;

        if let Some(function) = self.ctx.services().scalars.lookup(name) {
            return function.evaluate(&arguments);
        }
        match arguments.as_slice() {
            [argument] => cast(name, argument),
            _ => ThinError::expected(),
        }
    }

    /// Evaluates the arguments of a string function that takes two compatible arguments.
    fn compatible_strings(
        &self,
        lhs: &Expression,
        rhs: &Expression,
        solution: &Solution,
    ) -> ThinResult<(StringValue, String)> {
        let lhs = self.string(lhs, solution)?;
        let rhs = self.string(rhs, solution)?;
        match (&lhs.language, &rhs.language) {
            (_, None) => Ok((lhs, rhs.value)),
            (Some(lhs_language), Some(rhs_language)) if lhs_language == rhs_language => {
                Ok((lhs, rhs.value))
            }
            _ => ThinError::expected(),
        }
    }

    fn resolve_iri(&self, value: &str) -> ThinResult<NamedNode> {
        match self.ctx.base_iri() {
            Some(base) => Ok(NamedNode::new_unchecked(base.resolve(value)?.into_inner())),
            None => Ok(NamedNode::new(value)?),
        }
    }
}

/// A string literal, optionally with a language tag.
struct StringValue {
    value: String,
    language: Option<String>,
}

impl StringValue {
    fn map(self, f: impl FnOnce(&str) -> String) -> Self {
        Self {
            value: f(&self.value),
            language: self.language,
        }
    }

    fn into_term(self) -> Term {
        match self.language {
            Some(language) => {
                Literal::new_language_tagged_literal_unchecked(self.value, language).into()
            }
            None => Literal::new_simple_literal(self.value).into(),
        }
    }
}

/// RDF term equality extended to values. Values that cannot be compared are different.
fn equals(lhs: &TypedValue, rhs: &TypedValue) -> bool {
    match lhs.compare(rhs) {
        Some(ordering) => ordering == Ordering::Equal,
        None => lhs == rhs,
    }
}

fn lang_matches(tag: &str, range: &str) -> bool {
    if range == "*" {
        return !tag.is_empty();
    }
    let tag = tag.to_ascii_lowercase();
    let range = range.to_ascii_lowercase();
    tag == range
        || tag
            .strip_prefix(&range)
            .is_some_and(|rest| rest.starts_with('-'))
}

/// `SUBSTR` with 1-based character positions.
fn substring(value: &str, start: i64, length: Option<i64>) -> String {
    let end = length.map(|length| start.saturating_add(length));
    value
        .chars()
        .zip(1_i64..)
        .filter(|(_, position)| *position >= start && end.map_or(true, |end| *position < end))
        .map(|(c, _)| c)
        .collect()
}

fn encode_for_uri(value: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut result = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
            result.push(char::from(byte));
        } else {
            result.push('%');
            result.push(char::from(HEX[usize::from(byte >> 4)]));
            result.push(char::from(HEX[usize::from(byte & 0x0F)]));
        }
    }
    result
}

/// Casts `value` to the XSD datatype `target`.
fn cast(target: &NamedNode, value: &Term) -> ThinResult<Term> {
    let lexical = match value {
        Term::NamedNode(node) if target.as_ref() == xsd::STRING => node.as_str().to_owned(),
        Term::Literal(literal) => literal.value().to_owned(),
        _ => return ThinError::expected(),
    };
    if target.as_ref() == xsd::STRING {
        return Ok(Literal::new_simple_literal(lexical).into());
    }
    let is_supported = [xsd::BOOLEAN, xsd::INTEGER, xsd::DECIMAL, xsd::FLOAT, xsd::DOUBLE]
        .contains(&target.as_ref());
    if !is_supported {
        return ThinError::expected();
    }

    let candidate = Literal::new_typed_literal(lexical.trim(), target.clone());
    match TypedValue::from(candidate) {
        TypedValue::OtherLiteral(_) => ThinError::expected(),
        value => Ok(value.into()),
    }
}
