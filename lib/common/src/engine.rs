use crate::error::EngineError;
use sparql_generate_model::{
    BlankNode, Iri, NamedNode, Solution, SolutionSequence, Term, Variable,
};
use spargebra::algebra::{AggregateExpression, Expression, GraphPattern, OrderExpression, QueryDataset};
use spargebra::term::GroundTerm;
use spargebra::Query;
use std::fmt::Debug;
use std::sync::Arc;

/// The namespace of the IRIs that stand for blank nodes in the VALUES table built by
/// [`CompiledSelect::to_query`].
pub const SKOLEM_NAMESPACE: &str = "urn:sparql-generate:skolem:";

/// The part of a generate query that is forwarded to the graph-pattern engine.
///
/// It holds the WHERE clause together with all solution modifiers. The engine evaluates it with
/// the current solutions as an inline values table joined with the pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledSelect {
    /// The active dataset (`FROM` and `FROM NAMED`).
    pub dataset: Option<QueryDataset>,
    pub base_iri: Option<Iri<String>>,
    /// The WHERE clause.
    pub pattern: GraphPattern,
    pub group: Option<GroupBy>,
    pub having: Vec<Expression>,
    /// The explicit projection. `None` selects every in-scope variable (`SELECT *`).
    pub projection: Option<Vec<ProjectionItem>>,
    /// Whether the variables of the inline solutions are added to the projection.
    pub keep_input_variables: bool,
    pub order_by: Vec<OrderExpression>,
    pub distinct: bool,
    pub reduced: bool,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// A `GROUP BY` clause together with the aggregates computed for each group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupBy {
    pub variables: Vec<Variable>,
    pub aggregates: Vec<(Variable, AggregateExpression)>,
}

/// One element of a projection: a variable, optionally computed by an expression.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectionItem {
    pub variable: Variable,
    pub expression: Option<Expression>,
}

impl ProjectionItem {
    /// Creates a projection of an existing variable.
    pub fn variable(variable: Variable) -> Self {
        Self {
            variable,
            expression: None,
        }
    }
}

impl CompiledSelect {
    /// Creates a select that returns every solution of `pattern` without modifiers.
    pub fn new(pattern: GraphPattern) -> Self {
        Self {
            dataset: None,
            base_iri: None,
            pattern,
            group: None,
            having: Vec::new(),
            projection: None,
            keep_input_variables: false,
            order_by: Vec::new(),
            distinct: false,
            reduced: false,
            offset: 0,
            limit: None,
        }
    }

    /// Returns the variables of the result table if the select is evaluated with inline
    /// solutions that declare `input_variables`.
    pub fn projected_variables(&self, input_variables: &[Variable]) -> Vec<Variable> {
        let mut result = Vec::new();
        let mut add = |variable: &Variable| {
            if !result.contains(variable) {
                result.push(variable.clone());
            }
        };

        match (&self.projection, &self.group) {
            (Some(items), _) => items.iter().for_each(|item| add(&item.variable)),
            (None, Some(group)) => {
                group.variables.iter().for_each(&mut add);
                group.aggregates.iter().for_each(|(variable, _)| add(variable));
            }
            (None, None) => {
                input_variables.iter().for_each(&mut add);
                self.pattern.on_in_scope_variable(|variable| add(variable));
            }
        }

        if self.keep_input_variables && self.group.is_none() {
            input_variables.iter().for_each(&mut add);
        }
        result
    }

    /// Builds the SPARQL query that joins `inline` with the pattern and applies all modifiers.
    ///
    /// Blank nodes cannot be part of a VALUES table. They are replaced by IRIs in
    /// [`SKOLEM_NAMESPACE`], which [`restore_blank_nodes`] turns back into the blank nodes.
    pub fn to_query(&self, inline: &SolutionSequence) -> Query {
        let input_variables = inline.variables().to_vec();
        let mut pattern = join_with_values(inline, self.pattern.clone());

        if let Some(group) = &self.group {
            pattern = GraphPattern::Group {
                inner: Box::new(pattern),
                variables: group.variables.clone(),
                aggregates: group.aggregates.clone(),
            };
        }
        for condition in &self.having {
            pattern = GraphPattern::Filter {
                expr: condition.clone(),
                inner: Box::new(pattern),
            };
        }
        for item in self.projection.iter().flatten() {
            if let Some(expression) = &item.expression {
                pattern = GraphPattern::Extend {
                    inner: Box::new(pattern),
                    variable: item.variable.clone(),
                    expression: expression.clone(),
                };
            }
        }
        if !self.order_by.is_empty() {
            pattern = GraphPattern::OrderBy {
                inner: Box::new(pattern),
                expression: self.order_by.clone(),
            };
        }
        pattern = GraphPattern::Project {
            inner: Box::new(pattern),
            variables: self.projected_variables(&input_variables),
        };
        if self.distinct {
            pattern = GraphPattern::Distinct {
                inner: Box::new(pattern),
            };
        } else if self.reduced {
            pattern = GraphPattern::Reduced {
                inner: Box::new(pattern),
            };
        }
        if self.offset > 0 || self.limit.is_some() {
            pattern = GraphPattern::Slice {
                inner: Box::new(pattern),
                start: self.offset,
                length: self.limit,
            };
        }

        Query::Select {
            dataset: self.dataset.clone(),
            pattern,
            base_iri: self.base_iri.clone(),
        }
    }
}

fn join_with_values(inline: &SolutionSequence, pattern: GraphPattern) -> GraphPattern {
    let is_identity = inline.variables().is_empty() && inline.len() == 1;
    if is_identity {
        return pattern;
    }

    let bindings = inline
        .iter()
        .map(|solution| {
            inline
                .variables()
                .iter()
                .map(|variable| solution.get(variable).map(to_ground_term))
                .collect()
        })
        .collect();
    let values = GraphPattern::Values {
        variables: inline.variables().to_vec(),
        bindings,
    };

    match pattern {
        GraphPattern::Bgp { patterns } if patterns.is_empty() => values,
        pattern => GraphPattern::Join {
            left: Box::new(values),
            right: Box::new(pattern),
        },
    }
}

fn to_ground_term(term: &Term) -> GroundTerm {
    match term {
        Term::NamedNode(node) => GroundTerm::NamedNode(node.clone()),
        Term::Literal(literal) => GroundTerm::Literal(literal.clone()),
        Term::BlankNode(node) => GroundTerm::NamedNode(NamedNode::new_unchecked(format!(
            "{SKOLEM_NAMESPACE}{}",
            node.as_str()
        ))),
    }
}

/// Replaces the IRIs in [`SKOLEM_NAMESPACE`] in `sequence` by the blank nodes they stand for.
pub fn restore_blank_nodes(sequence: SolutionSequence) -> SolutionSequence {
    let (variables, solutions) = sequence.into_parts();
    let solutions = solutions
        .iter()
        .map(|solution| {
            Solution::from_bindings(
                solution
                    .iter()
                    .map(|(variable, term)| (variable.clone(), restore_blank_node(term))),
            )
        })
        .collect();
    SolutionSequence::new(variables, solutions)
}

fn restore_blank_node(term: &Term) -> Term {
    match term {
        Term::NamedNode(node) => match node.as_str().strip_prefix(SKOLEM_NAMESPACE) {
            Some(id) => BlankNode::new_unchecked(id).into(),
            None => term.clone(),
        },
        term => term.clone(),
    }
}

/// Evaluates the select part of generate queries.
///
/// Evaluating a graph pattern is not part of the generate engine. Implementations typically wrap
/// a SPARQL engine and an RDF store. The call is synchronous: the generate engine moves it to a
/// blocking worker thread.
pub trait GraphPatternEngine: Debug + Send + Sync {
    /// Evaluates `select` with `inline` as the initial solutions.
    ///
    /// The result must declare the variables returned by
    /// [`CompiledSelect::projected_variables`].
    fn execute(
        &self,
        select: &CompiledSelect,
        inline: &SolutionSequence,
    ) -> Result<SolutionSequence, EngineError>;
}

pub type GraphPatternEngineRef = Arc<dyn GraphPatternEngine>;
