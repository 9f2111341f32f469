use crate::args::integer_arg;
use crate::iterators::BATCH_SIZE;
use futures::stream;
use futures::StreamExt;
use sparql_generate_common::error::FunctionError;
use sparql_generate_common::{IteratorFunction, TupleBatch, TupleStream};
use sparql_generate_model::vocab::iter;
use sparql_generate_model::{Literal, Term};

/// Iterates over the integers from `start` to `end` (inclusive), increasing by `step`.
///
/// `iter:for(start, end, step?)`. The step defaults to 1 and may be negative.
#[derive(Debug, Default)]
pub struct ForIterator;

impl ForIterator {
    pub fn new() -> Self {
        Self
    }
}

impl IteratorFunction for ForIterator {
    fn name(&self) -> &str {
        iter::FOR.as_str()
    }

    fn invoke(&self, arguments: Vec<Term>) -> Result<TupleStream, FunctionError> {
        let start = integer_arg(self.name(), &arguments, 0)?;
        let end = integer_arg(self.name(), &arguments, 1)?;
        let step = if arguments.len() > 2 {
            integer_arg(self.name(), &arguments, 2)?
        } else {
            1
        };
        if step == 0 {
            return Err(FunctionError::invalid_arguments(
                self.name(),
                "the step must not be zero",
            ));
        }

        let values = std::iter::successors(Some(start), move |value| value.checked_add(step))
            .take_while(move |value| if step > 0 { *value <= end } else { *value >= end })
            .map(|value| vec![Some(Term::from(Literal::from(value)))]);
        Ok(stream::iter(values)
            .chunks(BATCH_SIZE)
            .map(Ok::<TupleBatch, FunctionError>)
            .boxed())
    }
}
