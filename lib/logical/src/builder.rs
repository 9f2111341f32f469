use crate::error::PlanError;
use crate::normalizer::Normalizer;
use crate::plan::{
    BindPlan, GenerateTriplesPlan, IteratorPlan, ListTemplate, NamedCallPlan, OutputPlan,
    PlanNode, RootPlan, SelectPlan, SourcePlan, TemplatePart, TemplatePlan, TemplateTerm,
    TripleTemplate,
};
use crate::query::{
    BindingClause, GenerateElement, GenerateQuery, GenerateTerm, GenerateTriple, NamedCall,
    QueryForm, SelectForm, SolutionModifiers, TemplateElement, TemplateForm,
};
use sparql_generate_common::{CompiledSelect, GroupBy};
use sparql_generate_model::{Literal, Variable};
use spargebra::algebra::{Expression, GraphPattern};
use spargebra::term::NamedNodePattern;
use std::sync::Arc;

/// Compiles a [GenerateQuery] into an immutable [RootPlan].
///
/// The builder keeps counters for fresh variables and list constructs so that nested queries
/// built by the same builder never share them.
///
/// # Example
///
/// ```
/// use sparql_generate_logical::{GenerateElement, GenerateQuery, GenerateTriple, PlanBuilder};
/// use sparql_generate_model::{Literal, NamedNode};
///
/// let query = GenerateQuery::generate(vec![GenerateElement::Triples(vec![GenerateTriple::new(
///     NamedNode::new_unchecked("urn:a"),
///     NamedNode::new_unchecked("urn:p"),
///     Literal::from(2),
/// )])]);
///
/// let plan = PlanBuilder::new().build(query).unwrap();
/// assert!(plan.select.is_none());
/// ```
#[derive(Debug, Default)]
pub struct PlanBuilder {
    next_variable: usize,
    next_list_id: usize,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the plan of `query` and of all queries nested in it.
    pub fn build(&mut self, query: GenerateQuery) -> Result<Arc<RootPlan>, PlanError> {
        let mut normalizer = Normalizer::starting_at(self.next_variable);
        let query = normalizer.normalize(query)?;
        self.next_variable = normalizer.next_id();

        if let Some(signature) = &query.signature {
            check_signature(signature)?;
        }

        let bindings = query.bindings.iter().cloned().map(build_binding).collect();
        let select = build_select(&query).map(|select| PlanNode::Select(SelectPlan { select }));
        let post_select = query
            .post_select
            .iter()
            .map(|(variable, expression)| {
                PlanNode::Bind(BindPlan {
                    expression: expression.clone(),
                    variable: variable.clone(),
                })
            })
            .collect();
        let output = match query.form {
            QueryForm::Generate(elements) => OutputPlan::Generate(self.build_generate(elements)?),
            QueryForm::Template(template) => {
                OutputPlan::Template(Box::new(self.build_template(template)?))
            }
            QueryForm::Select(select) => OutputPlan::Select(
                select
                    .projection
                    .map(|items| items.into_iter().map(|item| item.variable).collect()),
            ),
        };

        Ok(Arc::new(RootPlan {
            name: query.name,
            signature: query.signature,
            base_iri: query.base_iri,
            prefixes: query.prefixes,
            bindings,
            select,
            post_select,
            output,
        }))
    }

    fn build_generate(
        &mut self,
        elements: Vec<GenerateElement>,
    ) -> Result<Vec<PlanNode>, PlanError> {
        let mut nodes = Vec::new();
        let mut current = GenerateTriplesPlan {
            triples: Vec::new(),
            lists: Vec::new(),
        };

        for element in elements {
            match element {
                GenerateElement::Triples(triples) => {
                    for triple in triples {
                        self.add_triple(&mut current, triple)?;
                    }
                }
                GenerateElement::SubQuery(query) => {
                    flush_triples(&mut nodes, &mut current);
                    nodes.push(PlanNode::Root(self.build(*query)?));
                }
                GenerateElement::Call(call) => {
                    flush_triples(&mut nodes, &mut current);
                    nodes.push(PlanNode::GenerateNamedCall(build_call(call)?));
                }
            }
        }
        flush_triples(&mut nodes, &mut current);
        Ok(nodes)
    }

    fn add_triple(
        &mut self,
        plan: &mut GenerateTriplesPlan,
        triple: GenerateTriple,
    ) -> Result<(), PlanError> {
        let subject = build_term(triple.subject)?;
        let predicate = build_term(triple.predicate)?;
        match triple.object {
            GenerateTerm::List(element) => {
                let element = match *element {
                    GenerateTerm::List(_) => return Err(PlanError::NestedList),
                    element => build_term(element)?,
                };
                plan.lists.push(ListTemplate {
                    id: self.next_list_id,
                    subject,
                    predicate,
                    element,
                });
                self.next_list_id += 1;
            }
            object => plan.triples.push(TripleTemplate {
                subject,
                predicate,
                object: build_term(object)?,
            }),
        }
        Ok(())
    }

    fn build_template(&mut self, template: TemplateForm) -> Result<PlanNode, PlanError> {
        let parts = template
            .elements
            .into_iter()
            .map(|element| {
                Ok(match element {
                    TemplateElement::Text(text) => {
                        TemplatePart::Expression(Literal::new_simple_literal(text).into())
                    }
                    TemplateElement::Expression(expression) => TemplatePart::Expression(expression),
                    TemplateElement::SubTemplate(query) => {
                        TemplatePart::SubTemplate(self.build(*query)?)
                    }
                    TemplateElement::Call(call) => TemplatePart::Call(build_call(call)?),
                })
            })
            .collect::<Result<Vec<_>, PlanError>>()?;

        Ok(PlanNode::Template(TemplatePlan {
            before: template.before,
            parts,
            separator: template.separator,
            after: template.after,
        }))
    }
}

fn check_signature(signature: &[Variable]) -> Result<(), PlanError> {
    for (i, variable) in signature.iter().enumerate() {
        if signature[..i].contains(variable) {
            return Err(PlanError::DuplicateSignatureVariable(variable.clone()));
        }
    }
    Ok(())
}

fn build_binding(clause: BindingClause) -> PlanNode {
    match clause {
        BindingClause::Iterator {
            function,
            arguments,
            variables,
        } => PlanNode::Iterator(IteratorPlan {
            function,
            arguments,
            variables,
        }),
        BindingClause::Source {
            source,
            accept,
            variable,
        } => PlanNode::Source(SourcePlan {
            source,
            accept,
            variable,
        }),
        BindingClause::Bind {
            expression,
            variable,
        } => PlanNode::Bind(BindPlan {
            expression,
            variable,
        }),
    }
}

/// Extracts the part of the query that is evaluated by the graph-pattern engine.
///
/// Returns `None` if that part cannot remove, add, or reorder solutions.
fn build_select(query: &GenerateQuery) -> Option<CompiledSelect> {
    let select_form = match &query.form {
        QueryForm::Select(select) => Some(select),
        QueryForm::Generate(_) | QueryForm::Template(_) => None,
    };
    let has_pattern = query.pattern.as_ref().is_some_and(|pattern| !is_empty_pattern(pattern));
    let has_select_modifiers = select_form.is_some_and(|select| {
        let SelectForm {
            projection,
            distinct,
            reduced,
        } = select;
        projection.is_some() || *distinct || *reduced
    });
    if !has_pattern && query.modifiers.is_empty() && !has_select_modifiers {
        return None;
    }

    let SolutionModifiers {
        group_by,
        aggregates,
        having,
        order_by,
        offset,
        limit,
        values,
    } = query.modifiers.clone();

    let mut pattern = query.pattern.clone().unwrap_or(GraphPattern::Bgp {
        patterns: Vec::new(),
    });
    if let Some(values) = values {
        let values = GraphPattern::Values {
            variables: values.variables,
            bindings: values.bindings,
        };
        pattern = if is_empty_pattern(&pattern) {
            values
        } else {
            GraphPattern::Join {
                left: Box::new(pattern),
                right: Box::new(values),
            }
        };
    }

    let group = (!group_by.is_empty() || !aggregates.is_empty()).then_some(GroupBy {
        variables: group_by,
        aggregates,
    });
    let keep_input_variables = select_form.is_none() && group.is_none();

    let mut select = CompiledSelect::new(pattern);
    select.dataset.clone_from(&query.dataset);
    select.base_iri.clone_from(&query.base_iri);
    select.group = group;
    select.having = having;
    select.order_by = order_by;
    select.offset = offset;
    select.limit = limit;
    select.keep_input_variables = keep_input_variables;
    if let Some(form) = select_form {
        select.projection.clone_from(&form.projection);
        select.distinct = form.distinct;
        select.reduced = form.reduced;
    }
    Some(select)
}

fn is_empty_pattern(pattern: &GraphPattern) -> bool {
    matches!(pattern, GraphPattern::Bgp { patterns } if patterns.is_empty())
}

fn flush_triples(nodes: &mut Vec<PlanNode>, current: &mut GenerateTriplesPlan) {
    if current.triples.is_empty() && current.lists.is_empty() {
        return;
    }
    nodes.push(PlanNode::GenerateTriples(GenerateTriplesPlan {
        triples: std::mem::take(&mut current.triples),
        lists: std::mem::take(&mut current.lists),
    }));
}

fn build_term(term: GenerateTerm) -> Result<TemplateTerm, PlanError> {
    match term {
        GenerateTerm::NamedNode(node) => Ok(TemplateTerm::NamedNode(node)),
        GenerateTerm::BlankNode(node) => Ok(TemplateTerm::BlankNode(node)),
        GenerateTerm::Literal(literal) => Ok(TemplateTerm::Literal(literal)),
        GenerateTerm::Variable(variable) => Ok(TemplateTerm::Variable(variable)),
        GenerateTerm::List(_) => Err(PlanError::ListOutsideObjectPosition),
        GenerateTerm::Expression(_) => Err(PlanError::EmbeddedExpression),
    }
}

fn build_call(call: NamedCall) -> Result<NamedCallPlan, PlanError> {
    let name = match call.name {
        Expression::NamedNode(node) => NamedNodePattern::NamedNode(node),
        Expression::Variable(variable) => NamedNodePattern::Variable(variable),
        _ => return Err(PlanError::EmbeddedExpression),
    };
    Ok(NamedCallPlan {
        name,
        arguments: call.arguments,
    })
}
