use crate::test_utils::{iri, string, triple, var, FeedIterator, RowsIterator, TestRun};
use sparql_generate_execution::{GenerateOptions, GenerationError};
use sparql_generate_logical::{BindingClause, GenerateElement, GenerateQuery};
use sparql_generate_model::vocab::iter;
use sparql_generate_model::{Literal, Solution, SolutionSequence, Triple};
use spargebra::algebra::Expression;
use std::error::Error;
use std::time::Duration;

fn split_query() -> GenerateQuery {
    GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:part", "part",
    )])])
    .with_binding(BindingClause::Iterator {
        function: iter::SPLIT.into_owned(),
        arguments: vec![
            Expression::Variable(var("text")),
            Literal::new_simple_literal(",").into(),
        ],
        variables: vec![var("part")],
    })
}

fn texts(values: &[Option<&str>]) -> SolutionSequence {
    let solutions = values
        .iter()
        .map(|value| match value {
            Some(value) => Solution::new().overlay(var("text"), string(value)),
            None => Solution::new(),
        })
        .collect();
    SolutionSequence::new(vec![var("text")], solutions)
}

#[tokio::test]
async fn test_every_input_contributes_its_results() -> Result<(), Box<dyn Error>> {
    let output = TestRun::new()
        .run_with(split_query(), texts(&[Some("a,b"), Some("c")]))
        .await?;

    let mut parts = output
        .triples
        .iter()
        .map(|triple| triple.object.to_string())
        .collect::<Vec<_>>();
    parts.sort();
    assert_eq!(parts, vec!["\"a\"", "\"b\"", "\"c\""]);
    Ok(())
}

#[tokio::test]
async fn test_failed_input_does_not_abort_siblings() -> Result<(), Box<dyn Error>> {
    let output = TestRun::new()
        .run_with(split_query(), texts(&[None, Some("x")]))
        .await?;

    assert_eq!(
        output.triples,
        vec![Triple::new(iri("urn:a"), iri("urn:part"), string("x"))]
    );
    Ok(())
}

#[tokio::test]
async fn test_iterators_can_be_chained() -> Result<(), Box<dyn Error>> {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:value", "j",
    )])])
    .with_binding(BindingClause::Iterator {
        function: iter::FOR.into_owned(),
        arguments: vec![Literal::from(1).into(), Literal::from(3).into()],
        variables: vec![var("i")],
    })
    .with_binding(BindingClause::Iterator {
        function: iter::FOR.into_owned(),
        arguments: vec![Literal::from(1).into(), Expression::Variable(var("i"))],
        variables: vec![var("j")],
    });

    let output = TestRun::new().run(query).await?;

    // 1 + 2 + 3 values, of which three are distinct triples.
    assert_eq!(output.triples.len(), 6);
    assert_eq!(output.graph().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_unknown_iterator_function_is_fatal() {
    let query = GenerateQuery::generate(Vec::new()).with_binding(BindingClause::Iterator {
        function: iri("urn:unknown"),
        arguments: Vec::new(),
        variables: vec![var("x")],
    });

    let result = TestRun::new().run(query).await;

    assert!(matches!(
        result,
        Err(GenerationError::UnknownIteratorFunction(_))
    ));
}

#[tokio::test]
async fn test_timeout_keeps_partial_output() -> Result<(), Box<dyn Error>> {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:value", "row",
    )])])
    .with_binding(BindingClause::Iterator {
        function: iri("urn:live"),
        arguments: Vec::new(),
        variables: vec![var("row")],
    });
    let iterator = RowsIterator::new("urn:live", vec![vec![string("first")]]).pending();

    let output = TestRun::new()
        .with_iterator(iterator)
        .with_options(GenerateOptions::default().with_timeout(Duration::from_millis(50)))
        .run(query)
        .await?;

    assert_eq!(
        output.triples,
        vec![Triple::new(iri("urn:a"), iri("urn:value"), string("first"))]
    );
    assert_eq!(output.finished, 1);
    Ok(())
}

#[tokio::test]
async fn test_timeout_forwards_open_batches() -> Result<(), Box<dyn Error>> {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:value", "row",
    )])])
    .with_binding(BindingClause::Iterator {
        function: iri("urn:feed"),
        arguments: vec![Expression::Variable(var("text"))],
        variables: vec![var("row")],
    });

    let output = TestRun::new()
        .with_iterator(FeedIterator::new("urn:feed"))
        .with_options(GenerateOptions::default().with_timeout(Duration::from_millis(100)))
        .run_with(query, texts(&[Some("fast"), Some("slow")]))
        .await?;

    assert_eq!(
        output.triples,
        vec![Triple::new(iri("urn:a"), iri("urn:value"), string("row"))]
    );
    assert_eq!(output.finished, 1);
    Ok(())
}
