use crate::test_utils::{int, iri, string, triple, var, RowsIterator, TestRun};
use sparql_generate_common::{Document, InMemoryResolver};
use sparql_generate_logical::{BindingClause, GenerateElement, GenerateQuery, GenerateTerm, GenerateTriple};
use sparql_generate_model::vocab::rdf;
use sparql_generate_model::{BlankNode, Literal, NamedNode, Subject, Term, Triple};
use spargebra::algebra::Expression;
use spargebra::term::NamedNodePattern;
use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;

fn rows_query(template: Vec<GenerateTriple>) -> GenerateQuery {
    GenerateQuery::generate(vec![GenerateElement::Triples(template)]).with_binding(
        BindingClause::Iterator {
            function: iri("urn:rows"),
            arguments: Vec::new(),
            variables: vec![var("row")],
        },
    )
}

fn three_rows() -> RowsIterator {
    RowsIterator::new("urn:rows", vec![vec![string("a"), string("b"), string("c")]])
}

#[tokio::test]
async fn test_bind_generates_computed_value() -> Result<(), Box<dyn Error>> {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:p", "x",
    )])])
    .with_binding(BindingClause::Bind {
        expression: Expression::Add(
            Box::new(Literal::from(1).into()),
            Box::new(Literal::from(1).into()),
        ),
        variable: var("x"),
    });

    let output = TestRun::new().run(query).await?;

    assert_eq!(
        output.triples,
        vec![Triple::new(iri("urn:a"), iri("urn:p"), int(2))]
    );
    assert_eq!(output.started, 1);
    assert_eq!(output.finished, 1);
    Ok(())
}

#[tokio::test]
async fn test_blank_nodes_are_fresh_per_solution() -> Result<(), Box<dyn Error>> {
    let query = rows_query(vec![GenerateTriple::new(
        BlankNode::new_unchecked("b"),
        iri("urn:val"),
        var("row"),
    )]);

    let output = TestRun::new().with_iterator(three_rows()).run(query).await?;

    assert_eq!(output.triples.len(), 3);
    let subjects = output
        .triples
        .iter()
        .map(|triple| triple.subject.clone())
        .collect::<HashSet<_>>();
    assert_eq!(subjects.len(), 3);
    assert!(subjects
        .iter()
        .all(|subject| matches!(subject, Subject::BlankNode(_))));
    Ok(())
}

#[tokio::test]
async fn test_blank_nodes_are_shared_within_a_solution() -> Result<(), Box<dyn Error>> {
    let query = rows_query(vec![
        GenerateTriple::new(BlankNode::new_unchecked("b"), iri("urn:val"), var("row")),
        GenerateTriple::new(
            BlankNode::new_unchecked("b"),
            iri("urn:type"),
            iri("urn:Row"),
        ),
    ]);

    let output = TestRun::new().with_iterator(three_rows()).run(query).await?;

    let graph = output.graph();
    assert_eq!(graph.len(), 6);
    for row in ["a", "b", "c"] {
        let subject = graph
            .subject_for_predicate_object(&iri("urn:val"), &string(row))
            .ok_or("Missing value triple")?;
        assert!(graph.contains(&Triple::new(
            subject.into_owned(),
            iri("urn:type"),
            iri("urn:Row"),
        )));
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_source_leaves_variable_unbound() -> Result<(), Box<dyn Error>> {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:content", "doc",
    )])])
    .with_binding(BindingClause::Source {
        source: NamedNodePattern::NamedNode(iri("urn:missing")),
        accept: None,
        variable: var("doc"),
    });

    let output = TestRun::new().run(query).await?;

    assert!(output.triples.is_empty());
    assert_eq!(output.finished, 1);
    Ok(())
}

#[tokio::test]
async fn test_source_content_is_tagged_with_media_type() -> Result<(), Box<dyn Error>> {
    let resolver = InMemoryResolver::new()
        .with_document("urn:doc", Document::new("a,b", Some("text/csv")));
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:content", "doc",
    )])])
    .with_binding(BindingClause::Source {
        source: NamedNodePattern::NamedNode(iri("urn:doc")),
        accept: Some(NamedNodePattern::NamedNode(iri(
            "http://www.iana.org/assignments/media-types/text/csv",
        ))),
        variable: var("doc"),
    });

    let output = TestRun::new()
        .with_resolver(Arc::new(resolver))
        .run(query)
        .await?;

    let expected = Literal::new_typed_literal(
        "a,b",
        NamedNode::new("http://www.iana.org/assignments/media-types/text/csv")?,
    );
    assert_eq!(
        output.triples,
        vec![Triple::new(iri("urn:a"), iri("urn:content"), expected)]
    );
    Ok(())
}

#[tokio::test]
async fn test_source_content_feeds_iterator() -> Result<(), Box<dyn Error>> {
    let resolver = InMemoryResolver::new()
        .with_document("urn:doc", Document::new("x;y", Some("text/plain")));
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![triple(
        "urn:a", "urn:part", "part",
    )])])
    .with_binding(BindingClause::Source {
        source: NamedNodePattern::NamedNode(iri("urn:doc")),
        accept: None,
        variable: var("doc"),
    })
    .with_binding(BindingClause::Iterator {
        function: sparql_generate_model::vocab::iter::SPLIT.into_owned(),
        arguments: vec![
            Expression::Variable(var("doc")),
            Literal::new_simple_literal(";").into(),
        ],
        variables: vec![var("part")],
    });

    let output = TestRun::new()
        .with_resolver(Arc::new(resolver))
        .run(query)
        .await?;

    assert_eq!(
        output.triples,
        vec![
            Triple::new(iri("urn:a"), iri("urn:part"), string("x")),
            Triple::new(iri("urn:a"), iri("urn:part"), string("y")),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_triples_with_invalid_positions_are_skipped() -> Result<(), Box<dyn Error>> {
    let query = rows_query(vec![
        GenerateTriple::new(var("row"), iri("urn:p"), iri("urn:o")),
        GenerateTriple::new(iri("urn:s"), iri("urn:p"), var("row")),
    ]);

    let output = TestRun::new().with_iterator(three_rows()).run(query).await?;

    assert_eq!(output.triples.len(), 3);
    assert!(output
        .triples
        .iter()
        .all(|triple| triple.subject == Subject::from(iri("urn:s"))));
    Ok(())
}

#[tokio::test]
async fn test_list_spans_all_solutions() -> Result<(), Box<dyn Error>> {
    let query = rows_query(vec![GenerateTriple::new(
        iri("urn:s"),
        iri("urn:p"),
        GenerateTerm::List(Box::new(GenerateTerm::Variable(var("row")))),
    )]);

    let output = TestRun::new().with_iterator(three_rows()).run(query).await?;

    let graph = output.graph();
    assert_eq!(graph.len(), 7);
    let mut node: Term = graph
        .object_for_subject_predicate(&iri("urn:s"), &iri("urn:p"))
        .ok_or("Missing list head")?
        .into_owned();
    let mut values = Vec::new();
    while let Term::BlankNode(current) = &node {
        let value = graph
            .object_for_subject_predicate(current, rdf::FIRST)
            .ok_or("Missing rdf:first")?;
        values.push(value.into_owned());
        node = graph
            .object_for_subject_predicate(current, rdf::REST)
            .ok_or("Missing rdf:rest")?
            .into_owned();
    }
    assert_eq!(node, Term::from(rdf::NIL.into_owned()));
    assert_eq!(values, vec![string("a"), string("b"), string("c")]);
    Ok(())
}

#[tokio::test]
async fn test_nested_query_inherits_blank_nodes_of_solution() -> Result<(), Box<dyn Error>> {
    let nested = GenerateQuery::generate(vec![GenerateElement::Triples(vec![
        GenerateTriple::new(BlankNode::new_unchecked("b"), iri("urn:nested"), var("row")),
    ])]);
    let query = GenerateQuery::generate(vec![
        GenerateElement::Triples(vec![GenerateTriple::new(
            BlankNode::new_unchecked("b"),
            iri("urn:val"),
            var("row"),
        )]),
        GenerateElement::SubQuery(Box::new(nested)),
    ])
    .with_binding(BindingClause::Iterator {
        function: iri("urn:rows"),
        arguments: Vec::new(),
        variables: vec![var("row")],
    });

    let output = TestRun::new().with_iterator(three_rows()).run(query).await?;

    let graph = output.graph();
    assert_eq!(graph.len(), 6);
    for row in ["a", "b", "c"] {
        let outer = graph
            .subject_for_predicate_object(&iri("urn:val"), &string(row))
            .ok_or("Missing outer triple")?;
        let inner = graph
            .subject_for_predicate_object(&iri("urn:nested"), &string(row))
            .ok_or("Missing nested triple")?;
        assert_eq!(outer, inner);
    }
    Ok(())
}
