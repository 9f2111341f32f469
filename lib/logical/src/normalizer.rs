use crate::error::PlanError;
use crate::query::{
    GenerateElement, GenerateQuery, GenerateTerm, NamedCall, QueryForm, TemplateElement,
};
use rustc_hash::FxHashMap;
use sparql_generate_model::Variable;
use spargebra::algebra::Expression;

/// An upper bound for the number of normalization passes.
const MAX_PASSES: usize = 32;

/// Lifts expressions embedded in the GENERATE part of a query into explicit post-select
/// bindings.
///
/// After normalization, every position of a generated triple is a constant, a variable, a blank
/// node, or a list of such a term. The name of every named call, in generate and template
/// queries, is an IRI or a variable. Each
/// pass lifts one level of nesting, so the normalizer repeats passes until nothing changes.
///
/// Nested sub-queries are normalized when their own plan is built.
#[derive(Debug, Default)]
pub struct Normalizer {
    lifted: FxHashMap<Expression, Variable>,
    next_id: usize,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a normalizer whose first fresh variable is `__generate{next_id}`.
    ///
    /// Plans of nested queries use disjoint variable names so that lifted bindings of an
    /// enclosing query are never mistaken for those of a nested one.
    pub fn starting_at(next_id: usize) -> Self {
        Self {
            lifted: FxHashMap::default(),
            next_id,
        }
    }

    /// The id of the next fresh variable.
    pub fn next_id(&self) -> usize {
        self.next_id
    }

    /// Normalizes `query`.
    pub fn normalize(&mut self, mut query: GenerateQuery) -> Result<GenerateQuery, PlanError> {
        for _ in 0..MAX_PASSES {
            if !self.normalize_pass(&mut query) {
                return Ok(query);
            }
        }
        Err(PlanError::NormalizationDidNotConverge(MAX_PASSES))
    }

    fn normalize_pass(&mut self, query: &mut GenerateQuery) -> bool {
        let mut changed = false;
        let mut binds = Vec::new();
        match &mut query.form {
            QueryForm::Generate(elements) => {
                for element in elements.iter_mut() {
                    match element {
                        GenerateElement::Triples(triples) => {
                            for triple in triples.iter_mut() {
                                changed |= self.lift_term(&mut triple.subject, &mut binds);
                                changed |= self.lift_term(&mut triple.predicate, &mut binds);
                                changed |= self.lift_term(&mut triple.object, &mut binds);
                            }
                        }
                        GenerateElement::Call(call) => {
                            changed |= self.lift_call_name(call, &mut binds);
                        }
                        GenerateElement::SubQuery(_) => {}
                    }
                }
            }
            QueryForm::Template(template) => {
                for element in &mut template.elements {
                    if let TemplateElement::Call(call) = element {
                        changed |= self.lift_call_name(call, &mut binds);
                    }
                }
            }
            QueryForm::Select(_) => return false,
        }

        for (variable, expression) in binds {
            if !query.post_select.iter().any(|(known, _)| known == &variable) {
                query.post_select.push((variable, expression));
            }
        }
        changed
    }

    fn lift_term(
        &mut self,
        term: &mut GenerateTerm,
        binds: &mut Vec<(Variable, Expression)>,
    ) -> bool {
        match term {
            GenerateTerm::Expression(expression) => {
                let replacement = match expression {
                    Expression::NamedNode(node) => GenerateTerm::NamedNode(node.clone()),
                    Expression::Literal(literal) => GenerateTerm::Literal(literal.clone()),
                    Expression::Variable(variable) => GenerateTerm::Variable(variable.clone()),
                    expression => GenerateTerm::Variable(self.lift(expression, binds)),
                };
                *term = replacement;
                true
            }
            GenerateTerm::List(inner) => self.lift_term(inner, binds),
            GenerateTerm::NamedNode(_)
            | GenerateTerm::BlankNode(_)
            | GenerateTerm::Literal(_)
            | GenerateTerm::Variable(_) => false,
        }
    }

    fn lift_call_name(
        &mut self,
        call: &mut NamedCall,
        binds: &mut Vec<(Variable, Expression)>,
    ) -> bool {
        if matches!(call.name, Expression::NamedNode(_) | Expression::Variable(_)) {
            return false;
        }
        let variable = self.lift(&call.name, binds);
        call.name = Expression::Variable(variable);
        true
    }

    /// Returns the variable bound to `expression`. Equal expressions share one variable.
    fn lift(
        &mut self,
        expression: &Expression,
        binds: &mut Vec<(Variable, Expression)>,
    ) -> Variable {
        if let Some(variable) = self.lifted.get(expression) {
            return variable.clone();
        }
        let variable = Variable::new_unchecked(format!("__generate{}", self.next_id));
        self.next_id += 1;
        self.lifted.insert(expression.clone(), variable.clone());
        binds.push((variable.clone(), expression.clone()));
        variable
    }
}
