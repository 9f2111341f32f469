use crate::test_utils::{int, iri, triple, var, CountingEngine, RowsIterator, TestRun};
use sparql_generate_common::ProjectionItem;
use sparql_generate_execution::GenerationError;
use sparql_generate_logical::{
    BindingClause, GenerateElement, GenerateQuery, QueryForm, SelectForm,
};
use sparql_generate_model::{Literal, Solution, SolutionSequence};
use spargebra::algebra::GraphPattern;
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use std::error::Error;
use std::sync::Arc;

/// `?x <urn:p> ?y`
fn pattern() -> GraphPattern {
    GraphPattern::Bgp {
        patterns: vec![TriplePattern {
            subject: TermPattern::Variable(var("x")),
            predicate: NamedNodePattern::NamedNode(iri("urn:p")),
            object: TermPattern::Variable(var("y")),
        }],
    }
}

#[tokio::test]
async fn test_where_clause_requires_engine() {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:p", "x",
    )])])
    .with_pattern(pattern());

    let result = TestRun::new().run(query).await;

    assert!(matches!(result, Err(GenerationError::NoGraphPatternEngine)));
}

#[tokio::test]
async fn test_empty_input_is_replaced_by_unit() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(CountingEngine::default());
    let query = GenerateQuery::generate(Vec::new()).with_pattern(pattern());

    TestRun::new()
        .with_engine(Arc::clone(&engine))
        .run_with(query, SolutionSequence::new(Vec::new(), Vec::new()))
        .await?;

    assert_eq!(engine.inline_sizes(), vec![1]);
    Ok(())
}

#[tokio::test]
async fn test_select_form_emits_projected_solutions() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(CountingEngine::default());
    let query = GenerateQuery::new(QueryForm::Select(SelectForm {
        projection: Some(vec![ProjectionItem::variable(var("x"))]),
        ..SelectForm::default()
    }))
    .with_binding(BindingClause::Bind {
        expression: Literal::from(1).into(),
        variable: var("x"),
    })
    .with_binding(BindingClause::Bind {
        expression: Literal::from(2).into(),
        variable: var("z"),
    })
    .with_pattern(pattern());

    let output = TestRun::new()
        .with_engine(Arc::clone(&engine))
        .run(query)
        .await?;

    assert_eq!(engine.calls(), 1);
    assert_eq!(
        output.solutions,
        vec![Solution::new().overlay(var("x"), int(1))]
    );
    Ok(())
}

#[tokio::test]
async fn test_empty_iterator_batch_reaches_select() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(CountingEngine::default());
    let query = GenerateQuery::generate(Vec::new())
        .with_binding(BindingClause::Iterator {
            function: iri("urn:rows"),
            arguments: Vec::new(),
            variables: vec![var("row")],
        })
        .with_pattern(pattern());

    TestRun::new()
        .with_iterator(RowsIterator::new("urn:rows", vec![Vec::new()]))
        .with_engine(Arc::clone(&engine))
        .run(query)
        .await?;

    assert_eq!(engine.inline_sizes(), vec![1]);
    Ok(())
}
