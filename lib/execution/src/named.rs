//! Named queries: loading, registration, and calls.

use crate::context::ExecutionContext;
use crate::error::GenerationError;
use crate::expression::ExpressionEvaluator;
use crate::root::execute_query;
use dashmap::DashMap;
use sparql_generate_logical::plan::RootPlan;
use sparql_generate_logical::PlanBuilder;
use sparql_generate_model::{NamedNode, Solution, SolutionSequence, Term};
use spargebra::algebra::Expression;
use std::sync::Arc;
use tracing::{debug, trace};

/// The named queries known to a generation run.
///
/// Queries are registered when a run starts with a named query, or when a call loads a query
/// through the document resolver. A name is never re-registered: the first plan wins.
#[derive(Clone, Debug, Default)]
pub struct QueryRegistry {
    plans: Arc<DashMap<NamedNode, Arc<RootPlan>>>,
}

impl QueryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &NamedNode) -> Option<Arc<RootPlan>> {
        self.plans.get(name).map(|plan| Arc::clone(plan.value()))
    }

    /// Registers `plan` under `name`, unless another plan has been registered before. Returns the
    /// plan registered under `name`.
    pub fn register(&self, name: NamedNode, plan: Arc<RootPlan>) -> Arc<RootPlan> {
        let entry = self.plans.entry(name).or_insert(plan);
        Arc::clone(entry.value())
    }

    /// Returns the names of all registered queries.
    pub fn names(&self) -> Vec<NamedNode> {
        self.plans.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

/// Identifies a call of a named query by the name and the bound parameter values.
///
/// Two calls with the same key produce the same output, so each key is executed at most once per
/// run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallKey {
    name: NamedNode,
    parameters: Vec<Option<Term>>,
}

impl CallKey {
    pub fn new(name: NamedNode, parameters: Vec<Option<Term>>) -> Self {
        Self { name, parameters }
    }

    /// Creates the key of the call that executes `plan` with `solution`.
    pub fn for_solution(name: NamedNode, plan: &RootPlan, solution: &Solution) -> Self {
        let parameters = plan
            .signature
            .iter()
            .flatten()
            .map(|variable| solution.get(variable).cloned())
            .collect();
        Self::new(name, parameters)
    }
}

/// Returns the plan of the named query `name`.
///
/// Queries that are not registered yet are loaded through the document resolver, parsed with
/// `name` as their base IRI, and registered.
pub async fn resolve(
    ctx: &ExecutionContext,
    name: &NamedNode,
) -> Result<Arc<RootPlan>, GenerationError> {
    if let Some(plan) = ctx.registry().get(name) {
        return Ok(plan);
    }

    let resolver = &ctx.services().resolver;
    let accept = ctx.options().query_media_type.as_deref();
    let mut document = resolver.open(name.as_str(), accept).await;
    if document.is_none() && accept.is_some() {
        debug!("No query with media type {accept:?} at {name}, retrying without media type");
        document = resolver.open(name.as_str(), None).await;
    }
    let document = document.ok_or_else(|| GenerationError::QueryNotFound(name.clone()))?;

    let parser = ctx
        .services()
        .parser
        .as_ref()
        .ok_or_else(|| GenerationError::NoQueryParser(name.clone()))?;
    let mut query = parser.parse(&document.content, Some(name.as_str()))?;
    if query.name.is_none() {
        query.name = Some(name.clone());
    }
    let plan = PlanBuilder::new().build(query)?;

    debug!("Loaded named query {name}");
    Ok(ctx.registry().register(name.clone(), plan))
}

/// Calls the named query `name` with `arguments` evaluated against `caller`.
///
/// The callee runs with its own blank node scope. Arguments that fail to evaluate leave the
/// parameter unbound. If `memoize` is set, a call whose parameters equal those of an earlier call
/// in the same run is skipped.
pub async fn call(
    ctx: &ExecutionContext,
    name: &NamedNode,
    arguments: Option<&[Expression]>,
    caller: &Solution,
    memoize: bool,
) -> Result<(), GenerationError> {
    let plan = resolve(ctx, name).await?;
    let input = parameters(ctx, name, &plan, arguments, caller)?;

    if memoize {
        let key = input
            .solutions()
            .first()
            .map(|solution| CallKey::for_solution(name.clone(), &plan, solution))
            .unwrap_or_else(|| CallKey::new(name.clone(), Vec::new()));
        if !ctx.record_call(key) {
            trace!("Skipping repeated call of {name}");
            return Ok(());
        }
    }

    execute_query(plan, ctx.with_fresh_scope(), input).await
}

/// Binds the signature variables of `plan` to the evaluated `arguments`.
fn parameters(
    ctx: &ExecutionContext,
    name: &NamedNode,
    plan: &RootPlan,
    arguments: Option<&[Expression]>,
    caller: &Solution,
) -> Result<SolutionSequence, GenerationError> {
    let signature = match (&plan.signature, arguments) {
        (None, None) => return Ok(SolutionSequence::unit()),
        (None, Some(_)) => return Err(GenerationError::ArgumentsWithoutSignature(name.clone())),
        (Some(_), None) => return Err(GenerationError::MissingArguments(name.clone())),
        (Some(signature), Some(arguments)) if signature.len() != arguments.len() => {
            return Err(GenerationError::ArityMismatch {
                name: name.clone(),
                expected: signature.len(),
                actual: arguments.len(),
            });
        }
        (Some(signature), Some(_)) => signature,
    };

    let evaluator = ExpressionEvaluator::new(ctx);
    let bindings = signature
        .iter()
        .zip(arguments.into_iter().flatten())
        .filter_map(|(variable, argument)| match evaluator.evaluate(argument, caller) {
            Ok(value) => Some((variable.clone(), value)),
            Err(_) => {
                debug!("Argument for {variable} of {name} is unbound");
                None
            }
        });
    let solution = Solution::from_bindings(bindings);
    Ok(SolutionSequence::new(signature.clone(), vec![solution]))
}
