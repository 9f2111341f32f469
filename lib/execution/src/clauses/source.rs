use crate::context::ExecutionContext;
use futures::future::abortable;
use futures::{stream, StreamExt};
use sparql_generate_common::Document;
use sparql_generate_logical::plan::SourcePlan;
use sparql_generate_model::vocab::media_types;
use sparql_generate_model::{Literal, NamedNode, Solution, SolutionSequence, Term};
use spargebra::term::NamedNodePattern;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fetches the document of `plan` for each solution of `input` and binds its content.
///
/// Fetches run concurrently, bounded by the concurrency limit of the context. The order of the
/// solutions is kept. A document that cannot be found, or a fetch that is aborted because the
/// context closed, leaves the variable unbound.
pub async fn execute_source(
    plan: &SourcePlan,
    ctx: &ExecutionContext,
    input: SolutionSequence,
) -> SolutionSequence {
    let (mut variables, solutions) = input.into_parts();
    if !variables.contains(&plan.variable) {
        variables.push(plan.variable.clone());
    }

    let solutions = stream::iter(solutions)
        .map(|solution| fetch(plan, ctx, solution))
        .buffered(ctx.options().max_concurrency.max(1))
        .collect::<Vec<_>>()
        .await;
    SolutionSequence::new(variables, solutions)
}

async fn fetch(plan: &SourcePlan, ctx: &ExecutionContext, solution: Solution) -> Solution {
    let Some(uri) = resolve_pattern(&plan.source, &solution) else {
        debug!("Source of {} is not bound to an IRI", plan.variable);
        return solution;
    };
    let accept = plan
        .accept
        .as_ref()
        .and_then(|accept| resolve_pattern(accept, &solution))
        .and_then(|accept| media_type(&accept));

    let Ok(_permit) = ctx.acquire_permit().await else {
        debug!("Context closed before fetching {uri}");
        return solution;
    };

    let resolver = Arc::clone(&ctx.services().resolver);
    let request_uri = uri.clone();
    let (request, handle) = abortable(async move {
        let document = resolver.open(&request_uri, accept.as_deref()).await;
        match document {
            None if accept.is_some() => resolver.open(&request_uri, None).await,
            document => document,
        }
    });
    let guard = ctx.register_abort_handle(handle);
    let response = request.await;
    drop(guard);

    match response {
        Ok(Some(document)) => solution.overlay(plan.variable.clone(), document_literal(document)),
        Ok(None) => {
            debug!("Source {uri} could not be resolved");
            solution
        }
        Err(_) => {
            debug!("Fetching {uri} was aborted");
            solution
        }
    }
}

/// Returns the IRI or string a source or accept pattern stands for in `solution`.
fn resolve_pattern(pattern: &NamedNodePattern, solution: &Solution) -> Option<String> {
    match pattern {
        NamedNodePattern::NamedNode(node) => Some(node.as_str().to_owned()),
        NamedNodePattern::Variable(variable) => match solution.get(variable)? {
            Term::NamedNode(node) => Some(node.as_str().to_owned()),
            Term::Literal(literal) if literal.is_plain() && literal.language().is_none() => {
                Some(literal.value().to_owned())
            }
            _ => None,
        },
    }
}

/// Extracts the media type from a media type IRI.
fn media_type(accept: &str) -> Option<String> {
    let media_type = accept.strip_prefix(media_types::NAMESPACE);
    if media_type.is_none() {
        warn!("Ignoring accept hint {accept} that is not a media type IRI");
    }
    media_type.map(ToOwned::to_owned)
}

/// Turns a fetched document into a literal whose datatype identifies the media type.
fn document_literal(document: Document) -> Term {
    match document.media_type {
        Some(media_type) => Literal::new_typed_literal(
            document.content,
            NamedNode::new_unchecked(format!("{}{media_type}", media_types::NAMESPACE)),
        )
        .into(),
        None => Literal::new_simple_literal(document.content).into(),
    }
}
