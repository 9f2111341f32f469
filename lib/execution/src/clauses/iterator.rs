use crate::batches::Batches;
use crate::context::ExecutionContext;
use crate::error::GenerationError;
use crate::expression::ExpressionEvaluator;
use futures::future::{abortable, BoxFuture};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use sparql_generate_common::{TupleBatch, TupleStream};
use sparql_generate_logical::plan::IteratorPlan;
use sparql_generate_model::{Solution, SolutionSequence, ThinResult};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{debug, trace, warn};

enum Event {
    Batch(usize, TupleBatch),
    Done(usize),
}

/// Invokes the iterator function of `plan` for each solution of `input`.
///
/// Every invocation runs as its own task. The tuples produced for an input are zipped onto the
/// iterator variables of `plan` and grouped into batches (see [Batches]). Each closed batch is
/// handed to `downstream`, which continues the remaining clauses of the query independently of
/// other batches. Batches without results are only handed on if `forward_empty` is set, so that a
/// select part that follows still sees them.
///
/// Once the context is closed, no new invocations are started. Batches that are still open when
/// the context closes are closed and handed to `downstream` with the results collected so far.
///
/// An input whose arguments cannot be evaluated, or whose invocation or stream fails, yields no
/// results. The first error of a `downstream` continuation is returned once all batches have
/// been processed.
pub async fn execute_iterator<F>(
    plan: &IteratorPlan,
    ctx: &ExecutionContext,
    input: SolutionSequence,
    forward_empty: bool,
    downstream: F,
) -> Result<(), GenerationError>
where
    F: Fn(SolutionSequence) -> BoxFuture<'static, Result<(), GenerationError>>,
{
    let function = ctx
        .services()
        .iterators
        .lookup(&plan.function)
        .ok_or_else(|| GenerationError::UnknownIteratorFunction(plan.function.clone()))?;

    if ctx.is_closed() {
        trace!("Context closed, not invoking {}", plan.function);
        return Ok(());
    }

    let (mut variables, solutions) = input.into_parts();
    for variable in &plan.variables {
        if variables.contains(variable) {
            warn!("Iterator {} overrides the variable {variable}", plan.function);
        } else {
            variables.push(variable.clone());
        }
    }

    let mut batches = Batches::new(0..solutions.len());
    let (sender, mut receiver) = unbounded_channel();
    let evaluator = ExpressionEvaluator::new(ctx);
    for (index, solution) in solutions.iter().enumerate() {
        let arguments = plan
            .arguments
            .iter()
            .map(|argument| evaluator.evaluate(argument, solution))
            .collect::<ThinResult<Vec<_>>>();
        let Ok(arguments) = arguments else {
            debug!("Arguments of {} are unbound for input {index}", plan.function);
            batches.complete(index);
            continue;
        };

        match function.invoke(arguments) {
            Ok(stream) => spawn_forward(ctx, index, stream, sender.clone()),
            Err(error) => {
                debug!("Iterator {} failed for input {index}: {error}", plan.function);
                batches.complete(index);
            }
        }
    }
    drop(sender);

    let mut continuations = FuturesUnordered::new();
    let mut first_error = None;
    let mut receiving = true;
    loop {
        tokio::select! {
            event = receiver.recv(), if receiving => match event {
                Some(Event::Batch(index, tuples)) => {
                    if let Some(solution) = solutions.get(index) {
                        batches.add(index, bind_tuples(plan, solution, tuples));
                    }
                }
                Some(Event::Done(index)) => batches.complete(index),
                None => {
                    receiving = false;
                    batches.force_close();
                }
            },
            Some(result) = continuations.next(), if !continuations.is_empty() => {
                if let Err(error) = result {
                    first_error.get_or_insert(error);
                }
            }
            else => break,
        }

        for batch in batches.take_closed() {
            if batch.items.is_empty() && !forward_empty {
                trace!("Skipping empty batch {}", batch.id);
                continue;
            }
            let sequence = SolutionSequence::new(variables.clone(), batch.items);
            continuations.push(downstream(sequence));
        }
    }

    first_error.map_or(Ok(()), Err)
}

/// Forwards the batches of `stream` to the event channel until the stream ends, fails, or the
/// context closes.
fn spawn_forward(
    ctx: &ExecutionContext,
    index: usize,
    mut stream: TupleStream,
    sender: UnboundedSender<Event>,
) {
    let (forward, handle) = abortable(async move {
        while let Some(batch) = stream.next().await {
            match batch {
                Ok(tuples) => {
                    if sender.send(Event::Batch(index, tuples)).is_err() {
                        return;
                    }
                    // Streams that are always ready must not starve the consumer.
                    tokio::task::yield_now().await;
                }
                Err(error) => {
                    debug!("Iteration of input {index} failed: {error}");
                    break;
                }
            }
        }
        if sender.send(Event::Done(index)).is_err() {
            trace!("Iteration of input {index} finished after its consumer");
        }
    });
    let guard = ctx.register_abort_handle(handle);
    tokio::spawn(async move {
        if forward.await.is_err() {
            trace!("Iteration of input {index} was aborted");
        }
        drop(guard);
    });
}

/// Extends `solution` with each tuple.
///
/// Tuple positions are zipped onto the iterator variables. A tuple with fewer values than
/// variables still yields a solution in which the remaining variables are unbound, and values
/// beyond the last variable are dropped. Both cases are reported with a warning.
fn bind_tuples(plan: &IteratorPlan, solution: &Solution, tuples: TupleBatch) -> Vec<Solution> {
    if tuples
        .iter()
        .any(|tuple| tuple.len() != plan.variables.len())
    {
        warn!(
            "Iterator {} produced tuples that do not match its {} variables",
            plan.function,
            plan.variables.len()
        );
    }

    tuples
        .into_iter()
        .map(|tuple| {
            let bindings = plan
                .variables
                .iter()
                .cloned()
                .zip(tuple)
                .filter_map(|(variable, value)| value.map(|value| (variable, value)));
            solution.extend(bindings)
        })
        .collect()
}
