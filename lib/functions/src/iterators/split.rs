use crate::args::string_arg;
use futures::stream;
use futures::StreamExt;
use sparql_generate_common::error::FunctionError;
use sparql_generate_common::{IteratorFunction, TupleStream};
use sparql_generate_model::vocab::iter;
use sparql_generate_model::{Literal, Term};

/// Iterates over the parts of a string separated by a separator.
///
/// `iter:Split(text, separator)`. Each part is emitted as a simple literal.
#[derive(Debug, Default)]
pub struct SplitIterator;

impl SplitIterator {
    pub fn new() -> Self {
        Self
    }
}

impl IteratorFunction for SplitIterator {
    fn name(&self) -> &str {
        iter::SPLIT.as_str()
    }

    fn invoke(&self, arguments: Vec<Term>) -> Result<TupleStream, FunctionError> {
        let text = string_arg(self.name(), &arguments, 0)?;
        let separator = string_arg(self.name(), &arguments, 1)?;
        if separator.is_empty() {
            return Err(FunctionError::invalid_arguments(
                self.name(),
                "the separator must not be empty",
            ));
        }

        let batch = text
            .split(separator.as_str())
            .map(|part| vec![Some(Term::from(Literal::new_simple_literal(part)))])
            .collect::<Vec<_>>();
        Ok(stream::iter([Ok::<_, FunctionError>(batch)]).boxed())
    }
}
