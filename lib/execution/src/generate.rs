//! Assembly of the output of GENERATE queries.

use crate::context::ExecutionContext;
use crate::error::GenerationError;
use crate::named;
use crate::root::execute_query;
use crate::scope::BNodeScope;
use futures::future::join_all;
use itertools::Itertools;
use sparql_generate_logical::plan::{
    GenerateTriplesPlan, ListTemplate, NamedCallPlan, PlanNode, RootPlan, TemplateTerm,
    TripleTemplate,
};
use sparql_generate_model::vocab::rdf;
use sparql_generate_model::{NamedNode, Solution, SolutionSequence, Subject, Term, Triple};
use spargebra::term::NamedNodePattern;
use std::sync::Arc;
use tracing::warn;

/// Instantiates the elements of a GENERATE template for the solutions of `input`.
///
/// The context is forked for the solutions of `input` and each solution gets its own child
/// scope, so blank node placeholders are fresh per solution. Nested queries and named calls run
/// concurrently for all solutions. Their first error is returned after all of them finished.
pub async fn execute_generate(
    nodes: &[PlanNode],
    ctx: &ExecutionContext,
    input: &SolutionSequence,
) -> Result<(), GenerationError> {
    let fork = ctx.fork(input.len());
    let contexts = input
        .iter()
        .map(|_| fork.with_scope(fork.scope().child()))
        .collect::<Vec<_>>();

    let mut first_error = None;
    for node in nodes {
        let result = match node {
            PlanNode::GenerateTriples(plan) => {
                emit_triples(plan, &fork, &contexts, input);
                Ok(())
            }
            PlanNode::Root(plan) => execute_nested(plan, &contexts, input).await,
            PlanNode::GenerateNamedCall(plan) => execute_calls(plan, &fork, input).await,
            node => Err(GenerationError::UnexpectedPlanNode(node.kind())),
        };
        if let Err(error) = result {
            first_error.get_or_insert(error);
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn emit_triples(
    plan: &GenerateTriplesPlan,
    fork: &ExecutionContext,
    contexts: &[ExecutionContext],
    input: &SolutionSequence,
) {
    let sink = fork.sink();
    for (index, (solution, ctx)) in input.iter().zip(contexts).enumerate() {
        for template in &plan.triples {
            if let Some(triple) = instantiate_triple(template, solution, ctx.scope()) {
                sink.triple(triple);
            }
        }
        for list in &plan.lists {
            for triple in instantiate_list(list, fork, index, solution, ctx.scope()) {
                sink.triple(triple);
            }
        }
    }
}

fn instantiate_triple(
    template: &TripleTemplate,
    solution: &Solution,
    scope: &BNodeScope,
) -> Option<Triple> {
    build_triple(
        instantiate(&template.subject, solution, scope)?,
        instantiate(&template.predicate, solution, scope)?,
        instantiate(&template.object, solution, scope)?,
    )
}

/// Returns the triples that the solution at `index` contributes to a list construct.
fn instantiate_list(
    list: &ListTemplate,
    fork: &ExecutionContext,
    index: usize,
    solution: &Solution,
    scope: &BNodeScope,
) -> Vec<Triple> {
    let nodes = fork.list_nodes(list.id);
    let (Some(node), Some(next)) = (nodes.get(index), nodes.get(index + 1)) else {
        return Vec::new();
    };

    let mut triples = Vec::with_capacity(3);
    if index == 0 {
        let head = instantiate(&list.subject, solution, scope)
            .zip(instantiate(&list.predicate, solution, scope))
            .and_then(|(subject, predicate)| build_triple(subject, predicate, node.clone()));
        triples.extend(head);
    }
    if let Some(value) = instantiate(&list.element, solution, scope) {
        triples.extend(build_triple(
            node.clone(),
            rdf::FIRST.into_owned().into(),
            value,
        ));
    }
    triples.extend(build_triple(
        node.clone(),
        rdf::REST.into_owned().into(),
        next.clone(),
    ));
    triples
}

fn instantiate(term: &TemplateTerm, solution: &Solution, scope: &BNodeScope) -> Option<Term> {
    match term {
        TemplateTerm::NamedNode(node) => Some(node.clone().into()),
        TemplateTerm::BlankNode(node) => Some(scope.mint(node.as_str())),
        TemplateTerm::Literal(literal) => Some(literal.clone().into()),
        TemplateTerm::Variable(variable) => solution.get(variable).cloned(),
    }
}

/// Builds a triple if each term is valid for its position.
fn build_triple(subject: Term, predicate: Term, object: Term) -> Option<Triple> {
    let subject = match subject {
        Term::NamedNode(node) => Subject::NamedNode(node),
        Term::BlankNode(node) => Subject::BlankNode(node),
        Term::Literal(_) => return None,
    };
    let Term::NamedNode(predicate) = predicate else {
        return None;
    };
    Some(Triple::new(subject, predicate, object))
}

/// Runs a nested anonymous query once per solution, in the scope of that solution.
async fn execute_nested(
    plan: &Arc<RootPlan>,
    contexts: &[ExecutionContext],
    input: &SolutionSequence,
) -> Result<(), GenerationError> {
    let runs = input.iter().zip(contexts).map(|(solution, ctx)| {
        let input = input.with_solutions(vec![solution.clone()]);
        execute_query(Arc::clone(plan), ctx.clone(), input)
    });
    join_all(runs).await.into_iter().collect()
}

/// Calls a named query for each solution. Equal calls are executed only once per run.
async fn execute_calls(
    plan: &NamedCallPlan,
    ctx: &ExecutionContext,
    input: &SolutionSequence,
) -> Result<(), GenerationError> {
    let calls = input
        .iter()
        .filter_map(|solution| Some((call_name(&plan.name, solution)?, solution)))
        .collect::<Vec<_>>();

    let resolved = join_all(
        calls
            .iter()
            .map(|(name, _)| name)
            .unique()
            .map(|name| named::resolve(ctx, name)),
    )
    .await;
    let first_error = resolved.into_iter().find_map(Result::err);

    let results = join_all(calls.iter().map(|(name, solution)| {
        named::call(ctx, name, plan.arguments.as_deref(), solution, true)
    }))
    .await;
    match first_error {
        Some(error) => Err(error),
        None => results.into_iter().collect(),
    }
}

/// Returns the name of the query to call for `solution`.
pub(crate) fn call_name(name: &NamedNodePattern, solution: &Solution) -> Option<NamedNode> {
    match name {
        NamedNodePattern::NamedNode(node) => Some(node.clone()),
        NamedNodePattern::Variable(variable) => match solution.get(variable) {
            Some(Term::NamedNode(node)) => Some(node.clone()),
            Some(_) => {
                warn!("Skipping call because {variable} is not bound to an IRI");
                None
            }
            None => {
                warn!("Skipping call because {variable} is unbound");
                None
            }
        },
    }
}
