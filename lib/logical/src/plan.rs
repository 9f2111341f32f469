//! Compiled plans of generate queries.
//!
//! A plan is immutable once built and shared by all concurrent executions through an [Arc].

use sparql_generate_common::CompiledSelect;
use sparql_generate_model::{BlankNode, Iri, Literal, NamedNode, Variable};
use spargebra::algebra::Expression;
use spargebra::term::NamedNodePattern;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The compiled form of one clause of a query.
#[derive(Clone, Debug, PartialEq)]
pub enum PlanNode {
    Iterator(IteratorPlan),
    Source(SourcePlan),
    Bind(BindPlan),
    Select(SelectPlan),
    GenerateTriples(GenerateTriplesPlan),
    GenerateNamedCall(NamedCallPlan),
    Template(TemplatePlan),
    Root(Arc<RootPlan>),
}

impl PlanNode {
    /// A short name of the node kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            PlanNode::Iterator(_) => "Iterator",
            PlanNode::Source(_) => "Source",
            PlanNode::Bind(_) => "Bind",
            PlanNode::Select(_) => "Select",
            PlanNode::GenerateTriples(_) => "GenerateTriples",
            PlanNode::GenerateNamedCall(_) => "GenerateNamedCall",
            PlanNode::Template(_) => "Template",
            PlanNode::Root(_) => "Root",
        }
    }
}

/// The plan of a complete query.
#[derive(Clone, Debug, PartialEq)]
pub struct RootPlan {
    pub name: Option<NamedNode>,
    pub signature: Option<Vec<Variable>>,
    pub base_iri: Option<Iri<String>>,
    pub prefixes: Vec<(String, String)>,
    /// Iterator, Source, and Bind nodes in declaration order.
    pub bindings: Vec<PlanNode>,
    /// The select part. `None` if the query does not filter solutions.
    pub select: Option<PlanNode>,
    /// Bind nodes evaluated after the select part.
    pub post_select: Vec<PlanNode>,
    pub output: OutputPlan,
}

/// How a query turns its final solutions into output.
#[derive(Clone, Debug, PartialEq)]
pub enum OutputPlan {
    /// GenerateTriples, GenerateNamedCall, and Root nodes in template order.
    Generate(Vec<PlanNode>),
    /// A Template node.
    Template(Box<PlanNode>),
    /// The variables of the emitted solutions. `None` emits every variable of the final
    /// solutions.
    Select(Option<Vec<Variable>>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct IteratorPlan {
    pub function: NamedNode,
    pub arguments: Vec<Expression>,
    pub variables: Vec<Variable>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourcePlan {
    pub source: NamedNodePattern,
    pub accept: Option<NamedNodePattern>,
    pub variable: Variable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BindPlan {
    pub expression: Expression,
    pub variable: Variable,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectPlan {
    pub select: CompiledSelect,
}

/// Triples instantiated for each solution.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerateTriplesPlan {
    pub triples: Vec<TripleTemplate>,
    pub lists: Vec<ListTemplate>,
}

/// A triple whose positions are constants, variables, or blank node placeholders.
#[derive(Clone, Debug, PartialEq)]
pub struct TripleTemplate {
    pub subject: TemplateTerm,
    pub predicate: TemplateTerm,
    pub object: TemplateTerm,
}

/// `subject predicate LIST(element)`. The list has one node per solution of the enclosing fork.
#[derive(Clone, Debug, PartialEq)]
pub struct ListTemplate {
    /// Identifies the list construct within the plan.
    pub id: usize,
    pub subject: TemplateTerm,
    pub predicate: TemplateTerm,
    pub element: TemplateTerm,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateTerm {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
}

/// A call of a named query for each solution.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedCallPlan {
    pub name: NamedNodePattern,
    pub arguments: Option<Vec<Expression>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TemplatePlan {
    pub before: Option<Expression>,
    pub parts: Vec<TemplatePart>,
    pub separator: Option<Expression>,
    pub after: Option<Expression>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplatePart {
    Expression(Expression),
    SubTemplate(Arc<RootPlan>),
    Call(NamedCallPlan),
}

impl Display for TemplateTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateTerm::NamedNode(node) => write!(f, "{node}"),
            TemplateTerm::BlankNode(node) => write!(f, "{node}"),
            TemplateTerm::Literal(literal) => write!(f, "{literal}"),
            TemplateTerm::Variable(variable) => write!(f, "{variable}"),
        }
    }
}

impl Display for RootPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl RootPlan {
    fn fmt_indented(&self, f: &mut Formatter<'_>, depth: usize) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        match &self.name {
            Some(name) => writeln!(f, "{indent}Root {name}")?,
            None => writeln!(f, "{indent}Root")?,
        }
        for node in self.bindings.iter().chain(&self.select).chain(&self.post_select) {
            fmt_node(node, f, depth + 1)?;
        }
        match &self.output {
            OutputPlan::Generate(nodes) => {
                writeln!(f, "{indent}  Generate")?;
                for node in nodes {
                    fmt_node(node, f, depth + 2)?;
                }
                Ok(())
            }
            OutputPlan::Template(node) => fmt_node(node, f, depth + 1),
            OutputPlan::Select(None) => writeln!(f, "{indent}  Output *"),
            OutputPlan::Select(Some(variables)) => {
                write!(f, "{indent}  Output")?;
                for variable in variables {
                    write!(f, " {variable}")?;
                }
                writeln!(f)
            }
        }
    }
}

fn fmt_node(node: &PlanNode, f: &mut Formatter<'_>, depth: usize) -> std::fmt::Result {
    let indent = "  ".repeat(depth);
    match node {
        PlanNode::Iterator(plan) => {
            write!(f, "{indent}Iterator {}", plan.function)?;
            for variable in &plan.variables {
                write!(f, " {variable}")?;
            }
            writeln!(f)
        }
        PlanNode::Source(plan) => writeln!(f, "{indent}Source {} {}", plan.source, plan.variable),
        PlanNode::Bind(plan) => writeln!(f, "{indent}Bind {}", plan.variable),
        PlanNode::Select(_) => writeln!(f, "{indent}Select"),
        PlanNode::GenerateTriples(plan) => {
            for triple in &plan.triples {
                writeln!(
                    f,
                    "{indent}Triple {} {} {}",
                    triple.subject, triple.predicate, triple.object
                )?;
            }
            for list in &plan.lists {
                writeln!(
                    f,
                    "{indent}List {} {} {}",
                    list.subject, list.predicate, list.element
                )?;
            }
            Ok(())
        }
        PlanNode::GenerateNamedCall(plan) => writeln!(f, "{indent}Call {}", plan.name),
        PlanNode::Template(plan) => {
            writeln!(f, "{indent}Template")?;
            for part in &plan.parts {
                match part {
                    TemplatePart::Expression(_) => writeln!(f, "{indent}  Expression")?,
                    TemplatePart::SubTemplate(root) => root.fmt_indented(f, depth + 1)?,
                    TemplatePart::Call(call) => writeln!(f, "{indent}  Call {}", call.name)?,
                }
            }
            Ok(())
        }
        PlanNode::Root(root) => root.fmt_indented(f, depth),
    }
}
