//! The orchestration of complete queries.

use crate::clauses::{execute_bind, execute_iterator, execute_source};
use crate::context::ExecutionContext;
use crate::error::GenerationError;
use crate::generate::execute_generate;
use crate::named::CallKey;
use crate::select::execute_select;
use crate::template::execute_template;
use futures::future::BoxFuture;
use futures::FutureExt;
use sparql_generate_logical::plan::{OutputPlan, PlanNode, RootPlan};
use sparql_generate_model::SolutionSequence;
use std::sync::Arc;
use tracing::{debug, trace};

/// Executes `plan` as a top-level run that writes into the sink of `ctx`.
///
/// The sink receives its prologue (start, prefixes, and base) before the body, and `finish` after
/// the body, even if the run fails. The context is closed once the run is over. If the options of
/// the context define a timeout, the context is closed when it expires. The output produced
/// until then is kept and the run completes without an error.
///
/// If `plan` is a named query, it is registered and its calls with the solutions of `input` are
/// recorded, so that recursive calls with equal parameters are not executed again.
pub async fn execute_plan(
    plan: Arc<RootPlan>,
    ctx: ExecutionContext,
    input: SolutionSequence,
) -> Result<(), GenerationError> {
    let sink = Arc::clone(ctx.sink());
    sink.start();
    for (name, iri) in &plan.prefixes {
        sink.prefix(name, iri);
    }
    if let Some(base_iri) = &plan.base_iri {
        sink.base(base_iri.as_str());
    }

    if let Some(name) = &plan.name {
        let plan = ctx.registry().register(name.clone(), Arc::clone(&plan));
        for solution in &input {
            ctx.record_call(CallKey::for_solution(name.clone(), &plan, solution));
        }
    }

    if let Some(timeout) = ctx.options().timeout {
        let closer = ctx.closer();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            debug!("Generation timed out after {timeout:?}");
            closer.close();
        });
        let timer = timer.abort_handle();
        ctx.on_close(move || timer.abort());
    }

    trace!("Starting top-level run");
    let result = execute_query(plan, ctx.clone(), input).await;
    trace!("Finished top-level run");

    sink.finish();
    ctx.close();
    result
}

/// Executes `plan` with `input` within the run of `ctx`. The sink is neither started nor
/// finished.
pub fn execute_query(
    plan: Arc<RootPlan>,
    ctx: ExecutionContext,
    input: SolutionSequence,
) -> BoxFuture<'static, Result<(), GenerationError>> {
    let ctx = match &plan.base_iri {
        Some(base_iri) => ctx.with_base_iri(base_iri.clone()),
        None => ctx,
    };
    run_clauses(plan, 0, input, ctx)
}

/// Runs the binding clauses of `plan` from `index` on, followed by the select part and the
/// output.
///
/// Bind and Source clauses transform the whole sequence. An Iterator clause continues the
/// remaining clauses for each of its batches.
///
/// A closed context does not stop the pipeline: batches that were closed by the teardown still
/// reach the output. Only new fetches and iterations are skipped.
fn run_clauses(
    plan: Arc<RootPlan>,
    index: usize,
    input: SolutionSequence,
    ctx: ExecutionContext,
) -> BoxFuture<'static, Result<(), GenerationError>> {
    async move {
        let mut sequence = input;
        for (position, node) in plan.bindings.iter().enumerate().skip(index) {
            sequence = match node {
                PlanNode::Bind(bind) => execute_bind(bind, &ctx, sequence),
                PlanNode::Source(source) => execute_source(source, &ctx, sequence).await,
                PlanNode::Iterator(iterator) => {
                    let downstream = |batch| {
                        run_clauses(Arc::clone(&plan), position + 1, batch, ctx.clone())
                    };
                    let forward_empty = plan.select.is_some();
                    return execute_iterator(iterator, &ctx, sequence, forward_empty, downstream)
                        .await;
                }
                node => return Err(GenerationError::UnexpectedPlanNode(node.kind())),
            };
        }
        finish_query(&plan, &ctx, sequence).await
    }
    .boxed()
}

/// Evaluates the select part, the post-select bindings, and the output of `plan`.
async fn finish_query(
    plan: &RootPlan,
    ctx: &ExecutionContext,
    input: SolutionSequence,
) -> Result<(), GenerationError> {
    let mut sequence = match &plan.select {
        Some(PlanNode::Select(select)) => execute_select(select, ctx, input).await?,
        Some(node) => return Err(GenerationError::UnexpectedPlanNode(node.kind())),
        None => input,
    };
    for node in &plan.post_select {
        let PlanNode::Bind(bind) = node else {
            return Err(GenerationError::UnexpectedPlanNode(node.kind()));
        };
        sequence = execute_bind(bind, ctx, sequence);
    }

    trace!("Assembling output for {} solutions", sequence.len());
    match &plan.output {
        OutputPlan::Generate(nodes) => execute_generate(nodes, ctx, &sequence).await,
        OutputPlan::Template(node) => match node.as_ref() {
            PlanNode::Template(template) => execute_template(template, ctx, &sequence).await,
            node => Err(GenerationError::UnexpectedPlanNode(node.kind())),
        },
        OutputPlan::Select(variables) => {
            let variables = variables.as_deref().unwrap_or(sequence.variables());
            for solution in &sequence {
                ctx.sink().solution(variables, solution);
            }
            Ok(())
        }
    }
}
