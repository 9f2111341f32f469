use crate::context::ExecutionContext;
use crate::expression::ExpressionEvaluator;
use sparql_generate_logical::plan::BindPlan;
use sparql_generate_model::SolutionSequence;
use tracing::{debug, warn};

/// Binds the value of the expression of `plan` in each solution of `input`.
///
/// Solutions for which the expression fails to evaluate keep the variable unbound.
pub fn execute_bind(
    plan: &BindPlan,
    ctx: &ExecutionContext,
    input: SolutionSequence,
) -> SolutionSequence {
    let (mut variables, solutions) = input.into_parts();
    if variables.contains(&plan.variable) {
        warn!("BIND overrides the already declared variable {}", plan.variable);
    } else {
        variables.push(plan.variable.clone());
    }

    let evaluator = ExpressionEvaluator::new(ctx);
    let solutions = solutions
        .into_iter()
        .map(
            |solution| match evaluator.evaluate(&plan.expression, &solution) {
                Ok(value) => solution.overlay(plan.variable.clone(), value),
                Err(_) => {
                    debug!("Expression of {} is unbound", plan.variable);
                    solution
                }
            },
        )
        .collect();
    SolutionSequence::new(variables, solutions)
}
