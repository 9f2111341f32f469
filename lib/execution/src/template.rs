//! Assembly of the output of TEMPLATE queries.

use crate::context::ExecutionContext;
use crate::error::GenerationError;
use crate::expression::ExpressionEvaluator;
use crate::generate::call_name;
use crate::named;
use crate::root::execute_query;
use sparql_generate_common::{CollectingSink, OutputSinkRef};
use sparql_generate_logical::plan::{TemplatePart, TemplatePlan};
use sparql_generate_model::{Solution, SolutionSequence, Term};
use spargebra::algebra::Expression;
use std::sync::Arc;
use tracing::debug;

/// Writes the text of a template for the solutions of `input`.
///
/// The solutions are processed in order. `before` is written for the first solution, `separator`
/// between two solutions, and `after` for the last solution. Parts that do not evaluate to a
/// literal contribute no text.
pub async fn execute_template(
    plan: &TemplatePlan,
    ctx: &ExecutionContext,
    input: &SolutionSequence,
) -> Result<(), GenerationError> {
    let last = input.len().saturating_sub(1);
    for (index, solution) in input.iter().enumerate() {
        let mut text = String::new();
        if index == 0 {
            push_expression(&mut text, plan.before.as_ref(), ctx, solution);
        } else {
            push_expression(&mut text, plan.separator.as_ref(), ctx, solution);
        }

        for part in &plan.parts {
            match part {
                TemplatePart::Expression(expression) => {
                    push_expression(&mut text, Some(expression), ctx, solution);
                }
                TemplatePart::SubTemplate(plan) => {
                    let sink = Arc::new(CollectingSink::new());
                    let sub_sink: OutputSinkRef = Arc::<CollectingSink>::clone(&sink);
                    let input = input.with_solutions(vec![solution.clone()]);
                    let sub_ctx = ctx.with_sink(sub_sink);
                    execute_query(Arc::clone(plan), sub_ctx, input).await?;
                    text.push_str(&sink.text());
                }
                TemplatePart::Call(call) => {
                    let Some(name) = call_name(&call.name, solution) else {
                        continue;
                    };
                    let sink = Arc::new(CollectingSink::new());
                    let sub_sink: OutputSinkRef = Arc::<CollectingSink>::clone(&sink);
                    let sub_ctx = ctx.with_sink(sub_sink);
                    named::call(&sub_ctx, &name, call.arguments.as_deref(), solution, false)
                        .await?;
                    text.push_str(&sink.text());
                }
            }
        }

        if index == last {
            push_expression(&mut text, plan.after.as_ref(), ctx, solution);
        }
        ctx.sink().text(&text);
    }
    Ok(())
}

fn push_expression(
    text: &mut String,
    expression: Option<&Expression>,
    ctx: &ExecutionContext,
    solution: &Solution,
) {
    let Some(expression) = expression else {
        return;
    };
    match ExpressionEvaluator::new(ctx).evaluate(expression, solution) {
        Ok(Term::Literal(literal)) => text.push_str(literal.value()),
        Ok(_) => debug!("Template part {expression} is not a literal"),
        Err(_) => debug!("Template part {expression} is unbound"),
    }
}
