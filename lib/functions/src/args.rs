use sparql_generate_common::error::FunctionError;
use sparql_generate_model::vocab::media_types;
use sparql_generate_model::{Numeric, Term, TypedValue};

/// Extracts the string value of the argument at `index`. Documents fetched by a source clause
/// (literals with a media type datatype) count as strings.
pub(crate) fn string_arg(
    function: &str,
    arguments: &[Term],
    index: usize,
) -> Result<String, FunctionError> {
    let value = arguments
        .get(index)
        .cloned()
        .map(TypedValue::from)
        .ok_or_else(|| missing(function, index))?;
    match value {
        TypedValue::OtherLiteral(literal)
            if literal
                .datatype()
                .as_str()
                .starts_with(media_types::NAMESPACE) =>
        {
            Ok(literal.value().to_owned())
        }
        value => value.as_str().map(ToOwned::to_owned).ok_or_else(|| {
            FunctionError::invalid_arguments(function, format!("argument {index} must be a string"))
        }),
    }
}

/// Extracts the integer value of the argument at `index`.
pub(crate) fn integer_arg(
    function: &str,
    arguments: &[Term],
    index: usize,
) -> Result<i64, FunctionError> {
    let value = arguments
        .get(index)
        .cloned()
        .map(TypedValue::from)
        .ok_or_else(|| missing(function, index))?;
    match value {
        TypedValue::NumericLiteral(Numeric::Integer(value)) => Ok(value.into()),
        _ => Err(FunctionError::invalid_arguments(
            function,
            format!("argument {index} must be an integer"),
        )),
    }
}

fn missing(function: &str, index: usize) -> FunctionError {
    FunctionError::invalid_arguments(function, format!("argument {index} is missing"))
}
