use crate::test_utils::{
    int, iri, triple, var, CountingEngine, CountingResolver, RowsIterator, StaticParser, TestRun,
};
use sparql_generate_common::{Document, InMemoryResolver};
use sparql_generate_execution::GenerationError;
use sparql_generate_logical::{BindingClause, GenerateElement, GenerateQuery, NamedCall};
use sparql_generate_model::{Literal, Solution, SolutionSequence, Triple};
use spargebra::algebra::{Expression, GraphPattern};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use std::error::Error;
use std::sync::Arc;

/// `GENERATE <urn:q>(?n) { <urn:x> <urn:n> ?n } WHERE { ?n <urn:p> ?o }`
fn callee() -> GenerateQuery {
    GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:x", "urn:n", "n",
    )])])
    .with_name(iri("urn:q"), Some(vec![var("n")]))
    .with_pattern(GraphPattern::Bgp {
        patterns: vec![TriplePattern {
            subject: TermPattern::Variable(var("n")),
            predicate: NamedNodePattern::NamedNode(iri("urn:p")),
            object: TermPattern::Variable(var("o")),
        }],
    })
}

/// Calls `<urn:q>` for each row of `urn:rows`.
fn caller(arguments: Option<Vec<Expression>>) -> GenerateQuery {
    GenerateQuery::generate(vec![GenerateElement::Call(NamedCall::new(
        iri("urn:q"),
        arguments,
    ))])
    .with_binding(BindingClause::Iterator {
        function: iri("urn:rows"),
        arguments: Vec::new(),
        variables: vec![var("row")],
    })
}

fn resolver() -> Arc<CountingResolver> {
    Arc::new(CountingResolver::new(InMemoryResolver::new().with_document(
        "urn:q",
        Document::new("q", Some("application/vnd.sparql-generate")),
    )))
}

fn rows() -> RowsIterator {
    RowsIterator::new("urn:rows", vec![vec![int(1), int(1)], vec![int(2)]])
}

#[tokio::test]
async fn test_equal_calls_run_once() -> Result<(), Box<dyn Error>> {
    let engine = Arc::new(CountingEngine::default());
    let resolver = resolver();

    let output = TestRun::new()
        .with_iterator(rows())
        .with_resolver(Arc::<CountingResolver>::clone(&resolver))
        .with_engine(Arc::clone(&engine))
        .with_parser(StaticParser::default().with_query("q", callee()))
        .run(caller(Some(vec![Expression::Variable(var("row"))])))
        .await?;

    let mut triples = output.triples.clone();
    triples.sort_by_key(ToString::to_string);
    assert_eq!(
        triples,
        vec![
            Triple::new(iri("urn:x"), iri("urn:n"), int(1)),
            Triple::new(iri("urn:x"), iri("urn:n"), int(2)),
        ]
    );
    assert_eq!(engine.calls(), 2);
    assert_eq!(resolver.opened(), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_named_query_is_fatal() {
    let result = TestRun::new()
        .with_iterator(rows())
        .with_parser(StaticParser::default())
        .run(caller(Some(vec![Expression::Variable(var("row"))])))
        .await;

    assert!(matches!(result, Err(GenerationError::QueryNotFound(_))));
}

#[tokio::test]
async fn test_call_without_parser_is_fatal() {
    let result = TestRun::new()
        .with_iterator(rows())
        .with_resolver(resolver())
        .run(caller(Some(vec![Expression::Variable(var("row"))])))
        .await;

    assert!(matches!(result, Err(GenerationError::NoQueryParser(_))));
}

#[tokio::test]
async fn test_signature_violations_are_fatal() {
    let run = |arguments| {
        TestRun::new()
            .with_iterator(rows())
            .with_resolver(resolver())
            .with_engine(Arc::new(CountingEngine::default()))
            .with_parser(StaticParser::default().with_query("q", callee()))
            .run(caller(arguments))
    };

    assert!(matches!(
        run(None).await,
        Err(GenerationError::MissingArguments(_))
    ));
    assert!(matches!(
        run(Some(Vec::new())).await,
        Err(GenerationError::ArityMismatch {
            expected: 1,
            actual: 0,
            ..
        })
    ));
}

#[tokio::test]
async fn test_recursive_call_with_same_parameters_does_not_rerun() -> Result<(), Box<dyn Error>> {
    // GENERATE <urn:r>(?n) { <urn:x> <urn:n> ?n . GENERATE <urn:r>(?n) . }
    let query = GenerateQuery::generate(vec![
        GenerateElement::Triples(vec![triple("urn:x", "urn:n", "n")]),
        GenerateElement::Call(NamedCall::new(
            iri("urn:r"),
            Some(vec![Expression::Variable(var("n"))]),
        )),
    ])
    .with_name(iri("urn:r"), Some(vec![var("n")]));
    let input = SolutionSequence::new(
        vec![var("n")],
        vec![Solution::new().overlay(var("n"), int(7))],
    );

    let output = TestRun::new().run_with(query, input).await?;

    assert_eq!(
        output.triples,
        vec![Triple::new(iri("urn:x"), iri("urn:n"), int(7))]
    );
    Ok(())
}

#[tokio::test]
async fn test_call_with_non_iri_name_is_skipped() -> Result<(), Box<dyn Error>> {
    let query = GenerateQuery::generate(vec![GenerateElement::Call(NamedCall::new(
        Expression::Variable(var("name")),
        None,
    ))])
    .with_binding(BindingClause::Bind {
        expression: Literal::new_simple_literal("not an iri").into(),
        variable: var("name"),
    });

    let output = TestRun::new().run(query).await?;

    assert!(output.triples.is_empty());
    assert_eq!(output.finished, 1);
    Ok(())
}
