use crate::test_utils::{iri, string, var, RowsIterator, TestRun};
use sparql_generate_logical::{
    BindingClause, GenerateQuery, QueryForm, TemplateElement, TemplateForm,
};
use sparql_generate_model::Literal;
use spargebra::algebra::Expression;
use std::error::Error;

fn rows() -> RowsIterator {
    RowsIterator::new("urn:rows", vec![vec![string("a"), string("b"), string("c")]])
}

fn template_query(form: TemplateForm) -> GenerateQuery {
    GenerateQuery::new(QueryForm::Template(form)).with_binding(BindingClause::Iterator {
        function: iri("urn:rows"),
        arguments: Vec::new(),
        variables: vec![var("row")],
    })
}

fn text(value: &str) -> Expression {
    Literal::new_simple_literal(value).into()
}

#[tokio::test]
async fn test_before_separator_and_after() -> Result<(), Box<dyn Error>> {
    let query = template_query(TemplateForm {
        before: Some(text("[")),
        elements: vec![TemplateElement::Expression(Expression::Variable(var(
            "row",
        )))],
        separator: Some(text(", ")),
        after: Some(text("]")),
    });

    let output = TestRun::new().with_iterator(rows()).run(query).await?;

    assert_eq!(output.text, "[a, b, c]");
    Ok(())
}

#[tokio::test]
async fn test_non_literal_parts_yield_no_text() -> Result<(), Box<dyn Error>> {
    let query = template_query(TemplateForm {
        elements: vec![
            TemplateElement::Text("<".to_owned()),
            TemplateElement::Expression(Expression::NamedNode(iri("urn:x"))),
            TemplateElement::Expression(Expression::Variable(var("unbound"))),
            TemplateElement::Expression(Expression::Variable(var("row"))),
            TemplateElement::Text(">".to_owned()),
        ],
        ..TemplateForm::default()
    });

    let output = TestRun::new().with_iterator(rows()).run(query).await?;

    assert_eq!(output.text, "<a><b><c>");
    Ok(())
}

#[tokio::test]
async fn test_sub_template_text_is_spliced_in_place() -> Result<(), Box<dyn Error>> {
    let inner = GenerateQuery::new(QueryForm::Template(TemplateForm {
        elements: vec![
            TemplateElement::Text("(".to_owned()),
            TemplateElement::Expression(Expression::Variable(var("row"))),
            TemplateElement::Text(")".to_owned()),
        ],
        ..TemplateForm::default()
    }));
    let query = template_query(TemplateForm {
        elements: vec![
            TemplateElement::Expression(Expression::Variable(var("row"))),
            TemplateElement::SubTemplate(Box::new(inner)),
        ],
        separator: Some(text(";")),
        ..TemplateForm::default()
    });

    let output = TestRun::new().with_iterator(rows()).run(query).await?;

    assert_eq!(output.text, "a(a);b(b);c(c)");
    assert_eq!(output.started, 1);
    assert_eq!(output.finished, 1);
    Ok(())
}
