use dashmap::DashMap;
use sparql_generate_model::vocab::rdf;
use sparql_generate_model::{BlankNode, Term};
use std::sync::Arc;

/// Maps the blank node labels of a template to fresh blank nodes.
///
/// Scopes form a tree. A label that was minted in an ancestor scope resolves to the ancestor's
/// node. Otherwise, a fresh node is minted and stored in the scope itself, so sibling scopes never
/// share it.
#[derive(Debug, Default)]
pub struct BNodeScope {
    parent: Option<Arc<BNodeScope>>,
    nodes: DashMap<String, BlankNode>,
}

impl BNodeScope {
    /// Creates a root scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope whose ancestors are `self` and its ancestors.
    pub fn child(self: &Arc<Self>) -> Arc<Self> {
        Arc::new(Self {
            parent: Some(Arc::clone(self)),
            nodes: DashMap::new(),
        })
    }

    /// Returns the blank node for `label`, minting a fresh node in this scope if neither this
    /// scope nor an ancestor knows the label.
    pub fn mint(&self, label: &str) -> Term {
        if let Some(node) = self.nodes.get(label) {
            return node.value().clone().into();
        }
        if let Some(node) = self.lookup_ancestors(label) {
            return node.into();
        }
        self.nodes
            .entry(label.to_owned())
            .or_insert_with(BlankNode::default)
            .value()
            .clone()
            .into()
    }

    fn lookup_ancestors(&self, label: &str) -> Option<BlankNode> {
        let mut current = self.parent.as_deref();
        while let Some(scope) = current {
            if let Some(node) = scope.nodes.get(label) {
                return Some(node.value().clone());
            }
            current = scope.parent.as_deref();
        }
        None
    }
}

/// Allocates the nodes of an RDF list with `size` elements: `size` fresh blank nodes followed by
/// `rdf:nil`.
pub fn allocate_list(size: usize) -> Arc<[Term]> {
    (0..size)
        .map(|_| Term::from(BlankNode::default()))
        .chain([Term::from(rdf::NIL.into_owned())])
        .collect()
}
