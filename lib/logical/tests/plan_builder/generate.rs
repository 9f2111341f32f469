use crate::test_utils::{iri, iri_expression, var};
use sparql_generate_logical::{
    BindingClause, GenerateElement, GenerateQuery, GenerateTerm, GenerateTriple, NamedCall,
    PlanBuilder, PlanError,
};
use sparql_generate_model::{BlankNode, Literal};
use spargebra::algebra::Expression;

#[test]
fn test_iterator_and_generate_triples() -> Result<(), PlanError> {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![
        GenerateTriple::new(BlankNode::new_unchecked("b"), iri("urn:val"), var("row")),
    ])])
    .with_binding(BindingClause::Iterator {
        function: iri("urn:rows"),
        arguments: Vec::new(),
        variables: vec![var("row")],
    });

    let plan = PlanBuilder::new().build(query)?;

    assert!(plan.select.is_none());
    insta::assert_snapshot!(plan, @r"
    Root
      Iterator <urn:rows> ?row
      Generate
        Triple _:b <urn:val> ?row
    ");
    Ok(())
}

#[test]
fn test_bind_then_generate() -> Result<(), PlanError> {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![
        GenerateTriple::new(iri("urn:a"), iri("urn:p"), var("x")),
    ])])
    .with_binding(BindingClause::Bind {
        expression: Expression::Add(
            Box::new(Literal::from(1).into()),
            Box::new(Literal::from(1).into()),
        ),
        variable: var("x"),
    });

    let plan = PlanBuilder::new().build(query)?;

    insta::assert_snapshot!(plan, @r"
    Root
      Bind ?x
      Generate
        Triple <urn:a> <urn:p> ?x
    ");
    Ok(())
}

#[test]
fn test_embedded_expressions_lists_and_calls() -> Result<(), PlanError> {
    let query = GenerateQuery::generate(vec![
        GenerateElement::Triples(vec![GenerateTriple::new(
            iri_expression("urn:item:", "id"),
            iri("urn:p"),
            GenerateTerm::List(Box::new(GenerateTerm::Variable(var("v")))),
        )]),
        GenerateElement::Call(NamedCall::new(
            iri("urn:q"),
            Some(vec![Expression::Variable(var("id"))]),
        )),
    ]);

    let plan = PlanBuilder::new().build(query)?;

    insta::assert_snapshot!(plan, @r"
    Root
      Bind ?__generate0
      Generate
        List ?__generate0 <urn:p> ?v
        Call <urn:q>
    ");
    Ok(())
}

#[test]
fn test_nested_queries_use_fresh_variables() -> Result<(), PlanError> {
    let nested = GenerateQuery::generate(vec![GenerateElement::Triples(vec![
        GenerateTriple::new(iri("urn:s"), iri("urn:q"), iri_expression("urn:b:", "y")),
    ])]);
    let query = GenerateQuery::generate(vec![
        GenerateElement::Triples(vec![GenerateTriple::new(
            iri("urn:s"),
            iri("urn:p"),
            iri_expression("urn:a:", "x"),
        )]),
        GenerateElement::SubQuery(Box::new(nested)),
    ]);

    let plan = PlanBuilder::new().build(query)?;

    insta::assert_snapshot!(plan, @r"
    Root
      Bind ?__generate0
      Generate
        Triple <urn:s> <urn:p> ?__generate0
        Root
          Bind ?__generate1
          Generate
            Triple <urn:s> <urn:q> ?__generate1
    ");
    Ok(())
}

#[test]
fn test_list_in_subject_position_is_rejected() {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![
        GenerateTriple::new(
            GenerateTerm::List(Box::new(GenerateTerm::Variable(var("v")))),
            iri("urn:p"),
            var("o"),
        ),
    ])]);

    let result = PlanBuilder::new().build(query);

    assert!(matches!(result, Err(PlanError::ListOutsideObjectPosition)));
}

#[test]
fn test_nested_list_is_rejected() {
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![
        GenerateTriple::new(
            iri("urn:s"),
            iri("urn:p"),
            GenerateTerm::List(Box::new(GenerateTerm::List(Box::new(
                GenerateTerm::Variable(var("v")),
            )))),
        ),
    ])]);

    let result = PlanBuilder::new().build(query);

    assert!(matches!(result, Err(PlanError::NestedList)));
}

#[test]
fn test_duplicate_signature_variable_is_rejected() {
    let query = GenerateQuery::generate(Vec::new())
        .with_name(iri("urn:q"), Some(vec![var("n"), var("n")]));

    let result = PlanBuilder::new().build(query);

    assert!(matches!(
        result,
        Err(PlanError::DuplicateSignatureVariable(variable)) if variable == var("n")
    ));
}
