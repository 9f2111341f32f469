use sparql_generate_model::{NamedNode, Variable};
use spargebra::algebra::{Expression, Function, GraphPattern};
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};

pub fn var(name: &str) -> Variable {
    Variable::new_unchecked(name)
}

pub fn iri(value: &str) -> NamedNode {
    NamedNode::new_unchecked(value)
}

/// `IRI(CONCAT(prefix, ?variable))`
pub fn iri_expression(prefix: &str, variable: &str) -> Expression {
    Expression::FunctionCall(
        Function::Iri,
        vec![Expression::FunctionCall(
            Function::Concat,
            vec![
                sparql_generate_model::Literal::new_simple_literal(prefix).into(),
                Expression::Variable(var(variable)),
            ],
        )],
    )
}

/// `?s ?p ?o`
pub fn any_triple_pattern() -> GraphPattern {
    GraphPattern::Bgp {
        patterns: vec![TriplePattern {
            subject: TermPattern::Variable(var("s")),
            predicate: NamedNodePattern::Variable(var("p")),
            object: TermPattern::Variable(var("o")),
        }],
    }
}
