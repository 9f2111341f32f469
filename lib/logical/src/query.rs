//! The abstract syntax tree of a generate query.
//!
//! Parsing query text is not part of this crate. A [QueryParser](crate::QueryParser) produces a
//! [GenerateQuery] that has already been validated against the grammar.

use sparql_generate_common::ProjectionItem;
use sparql_generate_model::{BlankNode, Iri, Literal, NamedNode, Variable};
use spargebra::algebra::{AggregateExpression, Expression, GraphPattern, OrderExpression, QueryDataset};
use spargebra::term::{GroundTerm, NamedNodePattern};

/// A generate, template, or select query together with its binding clauses.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateQuery {
    pub base_iri: Option<Iri<String>>,
    /// The declared prefixes as `(name, iri)` pairs.
    pub prefixes: Vec<(String, String)>,
    /// The name of the query if it can be called by other queries.
    pub name: Option<NamedNode>,
    /// The parameters of the query, if declared.
    pub signature: Option<Vec<Variable>>,
    pub dataset: Option<QueryDataset>,
    /// The binding clauses in declaration order.
    pub bindings: Vec<BindingClause>,
    /// The WHERE clause, if any.
    pub pattern: Option<GraphPattern>,
    pub modifiers: SolutionModifiers,
    pub form: QueryForm,
    /// Bindings evaluated after the select part and before the output is assembled.
    ///
    /// Parsers leave this empty. The normalizer adds a binding for every expression embedded in
    /// the generate part.
    pub post_select: Vec<(Variable, Expression)>,
}

impl GenerateQuery {
    /// Creates a query without binding clauses, WHERE clause, or modifiers.
    pub fn new(form: QueryForm) -> Self {
        Self {
            base_iri: None,
            prefixes: Vec::new(),
            name: None,
            signature: None,
            dataset: None,
            bindings: Vec::new(),
            pattern: None,
            modifiers: SolutionModifiers::default(),
            form,
            post_select: Vec::new(),
        }
    }

    /// Creates a generate query with the given elements.
    pub fn generate(elements: Vec<GenerateElement>) -> Self {
        Self::new(QueryForm::Generate(elements))
    }

    #[must_use]
    pub fn with_name(mut self, name: NamedNode, signature: Option<Vec<Variable>>) -> Self {
        self.name = Some(name);
        self.signature = signature;
        self
    }

    #[must_use]
    pub fn with_binding(mut self, clause: BindingClause) -> Self {
        self.bindings.push(clause);
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: GraphPattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Returns whether the query is a template query.
    pub fn is_template(&self) -> bool {
        matches!(self.form, QueryForm::Template(_))
    }
}

/// A clause that adds bindings to each solution before the WHERE clause is evaluated.
#[derive(Clone, Debug, PartialEq)]
pub enum BindingClause {
    /// `ITERATOR <function>(arguments) AS ?v1 ?v2 ...`
    Iterator {
        function: NamedNode,
        arguments: Vec<Expression>,
        variables: Vec<Variable>,
    },
    /// `SOURCE <iri> ACCEPT <media-type> AS ?v`
    Source {
        source: NamedNodePattern,
        accept: Option<NamedNodePattern>,
        variable: Variable,
    },
    /// `BIND(expression AS ?v)`
    Bind {
        expression: Expression,
        variable: Variable,
    },
}

/// The solution modifiers of the select part.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolutionModifiers {
    pub group_by: Vec<Variable>,
    pub aggregates: Vec<(Variable, AggregateExpression)>,
    pub having: Vec<Expression>,
    pub order_by: Vec<OrderExpression>,
    pub offset: usize,
    pub limit: Option<usize>,
    /// A trailing VALUES clause.
    pub values: Option<ValuesClause>,
}

impl SolutionModifiers {
    /// Returns whether no modifier is set.
    pub fn is_empty(&self) -> bool {
        self.group_by.is_empty()
            && self.aggregates.is_empty()
            && self.having.is_empty()
            && self.order_by.is_empty()
            && self.offset == 0
            && self.limit.is_none()
            && self.values.is_none()
    }
}

/// An inline data table.
#[derive(Clone, Debug, PartialEq)]
pub struct ValuesClause {
    pub variables: Vec<Variable>,
    pub bindings: Vec<Vec<Option<GroundTerm>>>,
}

/// The output of a query.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryForm {
    /// `GENERATE { ... }`
    Generate(Vec<GenerateElement>),
    /// `TEMPLATE { ... }`
    Template(TemplateForm),
    /// `SELECT ...`
    Select(SelectForm),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectForm {
    /// `None` stands for `SELECT *`.
    pub projection: Option<Vec<ProjectionItem>>,
    pub distinct: bool,
    pub reduced: bool,
}

/// An element of the GENERATE template.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerateElement {
    /// Triple patterns that are instantiated for each solution.
    Triples(Vec<GenerateTriple>),
    /// An anonymous nested GENERATE query.
    SubQuery(Box<GenerateQuery>),
    /// A call of a named query.
    Call(NamedCall),
}

/// A triple of a GENERATE template.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateTriple {
    pub subject: GenerateTerm,
    pub predicate: GenerateTerm,
    pub object: GenerateTerm,
}

impl GenerateTriple {
    pub fn new(
        subject: impl Into<GenerateTerm>,
        predicate: impl Into<GenerateTerm>,
        object: impl Into<GenerateTerm>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// A position of a [GenerateTriple].
#[derive(Clone, Debug, PartialEq)]
pub enum GenerateTerm {
    NamedNode(NamedNode),
    /// A blank node placeholder. A fresh blank node is minted for each solution.
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
    /// An embedded expression, e.g. `<{?id}>` or `"{?name}"`.
    Expression(Expression),
    /// `LIST(?v)`: an RDF list of the values of the inner term over all solutions.
    List(Box<GenerateTerm>),
}

impl From<NamedNode> for GenerateTerm {
    fn from(value: NamedNode) -> Self {
        GenerateTerm::NamedNode(value)
    }
}

impl From<BlankNode> for GenerateTerm {
    fn from(value: BlankNode) -> Self {
        GenerateTerm::BlankNode(value)
    }
}

impl From<Literal> for GenerateTerm {
    fn from(value: Literal) -> Self {
        GenerateTerm::Literal(value)
    }
}

impl From<Variable> for GenerateTerm {
    fn from(value: Variable) -> Self {
        GenerateTerm::Variable(value)
    }
}

impl From<Expression> for GenerateTerm {
    fn from(value: Expression) -> Self {
        GenerateTerm::Expression(value)
    }
}

/// A call of a named query: `GENERATE <name>(arguments)` or `TEMPLATE <name>(arguments)`.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedCall {
    /// The name of the called query. May be computed for each solution.
    pub name: Expression,
    /// The call arguments. `None` if the call has no argument list, which is only valid for
    /// queries without a signature.
    pub arguments: Option<Vec<Expression>>,
}

impl NamedCall {
    pub fn new(name: impl Into<Expression>, arguments: Option<Vec<Expression>>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// The body of a TEMPLATE query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TemplateForm {
    /// Evaluated before the first solution.
    pub before: Option<Expression>,
    /// Evaluated for each solution.
    pub elements: Vec<TemplateElement>,
    /// Evaluated between two solutions.
    pub separator: Option<Expression>,
    /// Evaluated after the last solution.
    pub after: Option<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateElement {
    Text(String),
    Expression(Expression),
    /// An anonymous nested TEMPLATE query.
    SubTemplate(Box<GenerateQuery>),
    /// A call of a named template query.
    Call(NamedCall),
}
