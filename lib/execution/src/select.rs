use crate::context::ExecutionContext;
use crate::error::GenerationError;
use sparql_generate_common::restore_blank_nodes;
use sparql_generate_logical::plan::SelectPlan;
use sparql_generate_model::SolutionSequence;
use std::sync::Arc;
use tracing::{debug, trace};

/// Evaluates the select part of a query with `input` as inline solutions.
///
/// The graph-pattern engine runs on a blocking worker thread. An empty input is replaced by a
/// single empty solution, as the engine is never called without solutions. Once the context is
/// closed, the engine is called without waiting for a permit, so that the output of a teardown is
/// still complete. Blank nodes that the engine returns in their VALUES form are restored.
pub async fn execute_select(
    plan: &SelectPlan,
    ctx: &ExecutionContext,
    input: SolutionSequence,
) -> Result<SolutionSequence, GenerationError> {
    let engine = ctx
        .services()
        .engine
        .as_ref()
        .map(Arc::clone)
        .ok_or(GenerationError::NoGraphPatternEngine)?;
    let input = if input.is_empty() {
        SolutionSequence::unit()
    } else {
        input
    };

    let permit = ctx.acquire_permit().await.ok();
    if permit.is_none() {
        debug!("Context closed, evaluating the select part without a permit");
    }

    trace!("Evaluating select part with {} inline solutions", input.len());
    let select = plan.select.clone();
    let result = tokio::task::spawn_blocking(move || engine.execute(&select, &input))
        .await
        .map_err(|error| GenerationError::Internal(error.to_string()))??;
    drop(permit);
    trace!("Select part returned {} solutions", result.len());
    Ok(restore_blank_nodes(result))
}
