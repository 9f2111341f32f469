use crate::test_utils::{any_triple_pattern, iri, var};
use sparql_generate_common::ProjectionItem;
use sparql_generate_logical::plan::PlanNode;
use sparql_generate_logical::{
    GenerateElement, GenerateQuery, GenerateTriple, PlanBuilder, PlanError, QueryForm,
    SelectForm, ValuesClause,
};
use spargebra::algebra::GraphPattern;
use spargebra::term::GroundTerm;

#[test]
fn test_generate_with_where_clause_keeps_input_variables() -> Result<(), Box<dyn std::error::Error>>
{
    let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![
        GenerateTriple::new(var("s"), iri("urn:p"), var("o")),
    ])])
    .with_pattern(any_triple_pattern());

    let plan = PlanBuilder::new().build(query)?;

    insta::assert_snapshot!(plan, @r"
    Root
      Select
      Generate
        Triple ?s <urn:p> ?o
    ");
    let Some(PlanNode::Select(select)) = &plan.select else {
        return Err("Expected a select node".into());
    };
    assert!(select.select.keep_input_variables);
    assert!(select.select.projection.is_none());
    Ok(())
}

#[test]
fn test_select_form_projects_explicitly() -> Result<(), Box<dyn std::error::Error>> {
    let query = GenerateQuery::new(QueryForm::Select(SelectForm {
        projection: Some(vec![ProjectionItem::variable(var("s"))]),
        distinct: true,
        reduced: false,
    }))
    .with_pattern(any_triple_pattern());

    let plan = PlanBuilder::new().build(query)?;

    insta::assert_snapshot!(plan, @r"
    Root
      Select
      Output ?s
    ");
    let Some(PlanNode::Select(select)) = &plan.select else {
        return Err("Expected a select node".into());
    };
    assert!(!select.select.keep_input_variables);
    assert!(select.select.distinct);
    Ok(())
}

#[test]
fn test_values_clause_alone_requires_select() -> Result<(), Box<dyn std::error::Error>> {
    let mut query = GenerateQuery::new(QueryForm::Select(SelectForm::default()));
    query.modifiers.values = Some(ValuesClause {
        variables: vec![var("x")],
        bindings: vec![vec![Some(GroundTerm::NamedNode(iri("urn:a")))], vec![None]],
    });

    let plan = PlanBuilder::new().build(query)?;

    insta::assert_snapshot!(plan, @r"
    Root
      Select
      Output *
    ");
    let Some(PlanNode::Select(select)) = &plan.select else {
        return Err("Expected a select node".into());
    };
    assert!(matches!(select.select.pattern, GraphPattern::Values { .. }));
    Ok(())
}

#[test]
fn test_group_by_drops_input_variables() -> Result<(), PlanError> {
    let mut query = GenerateQuery::generate(Vec::new()).with_pattern(any_triple_pattern());
    query.modifiers.group_by = vec![var("s")];

    let plan = PlanBuilder::new().build(query)?;

    let Some(PlanNode::Select(select)) = &plan.select else {
        panic!("Expected a select node")
    };
    assert!(!select.select.keep_input_variables);
    assert!(select.select.group.is_some());
    Ok(())
}

#[test]
fn test_pure_select_star_without_where_is_omitted() -> Result<(), PlanError> {
    let query = GenerateQuery::new(QueryForm::Select(SelectForm::default()));

    let plan = PlanBuilder::new().build(query)?;

    assert!(plan.select.is_none());
    Ok(())
}
