use sparql_generate_common::ScalarFunction;
use sparql_generate_model::vocab::fun;
use sparql_generate_model::{Literal, Numeric, Term, ThinError, ThinResult, TypedValue};

/// Splits a string at a separator and returns the part at a zero-based position.
///
/// `fun:SplitAtPosition(text, separator, position)`
#[derive(Debug, Default)]
pub struct SplitAtPositionFunction;

impl SplitAtPositionFunction {
    pub fn new() -> Self {
        Self
    }
}

impl ScalarFunction for SplitAtPositionFunction {
    fn name(&self) -> &str {
        fun::SPLIT_AT_POSITION.as_str()
    }

    fn evaluate(&self, arguments: &[Term]) -> ThinResult<Term> {
        let [text, separator, position] = arguments else {
            return ThinError::expected();
        };
        let text = TypedValue::from(text.clone());
        let separator = TypedValue::from(separator.clone());
        let TypedValue::NumericLiteral(Numeric::Integer(position)) =
            TypedValue::from(position.clone())
        else {
            return ThinError::expected();
        };

        let (Some(text), Some(separator)) = (text.as_str(), separator.as_str()) else {
            return ThinError::expected();
        };
        if separator.is_empty() {
            return ThinError::expected();
        }
        let position = usize::try_from(i64::from(position))?;
        text.split(separator)
            .nth(position)
            .map(|part| Term::from(Literal::new_simple_literal(part)))
            .ok_or(ThinError::default())
    }
}
