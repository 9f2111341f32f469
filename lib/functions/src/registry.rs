use crate::iterators::{ForIterator, SplitIterator};
use crate::scalars::SplitAtPositionFunction;
use sparql_generate_common::{
    IteratorFunctionRef, IteratorFunctionRegistry, ScalarFunctionRef, ScalarFunctionRegistry,
};
use sparql_generate_model::NamedNode;
use std::collections::HashMap;
use std::sync::Arc;

/// A registry that holds iterator and binding functions by their IRI.
///
/// [DefaultFunctionRegistry::default] contains the built-in functions. Further functions can be
/// registered before the registry is handed to the engine.
#[derive(Debug, Clone)]
pub struct DefaultFunctionRegistry {
    iterators: HashMap<NamedNode, IteratorFunctionRef>,
    scalars: HashMap<NamedNode, ScalarFunctionRef>,
}

impl DefaultFunctionRegistry {
    /// Creates a registry without any function.
    pub fn empty() -> Self {
        Self {
            iterators: HashMap::new(),
            scalars: HashMap::new(),
        }
    }

    /// Registers an iterator function under its name. A previous function with the same name is
    /// replaced.
    pub fn register_iterator(&mut self, function: IteratorFunctionRef) {
        let name = NamedNode::new_unchecked(function.name());
        self.iterators.insert(name, function);
    }

    /// Registers a binding function under its name. A previous function with the same name is
    /// replaced.
    pub fn register_scalar(&mut self, function: ScalarFunctionRef) {
        let name = NamedNode::new_unchecked(function.name());
        self.scalars.insert(name, function);
    }
}

impl Default for DefaultFunctionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_iterator(Arc::new(ForIterator::new()));
        registry.register_iterator(Arc::new(SplitIterator::new()));
        registry.register_scalar(Arc::new(SplitAtPositionFunction::new()));
        registry
    }
}

impl IteratorFunctionRegistry for DefaultFunctionRegistry {
    fn lookup(&self, name: &NamedNode) -> Option<IteratorFunctionRef> {
        self.iterators.get(name).map(Arc::clone)
    }
}

impl ScalarFunctionRegistry for DefaultFunctionRegistry {
    fn lookup(&self, name: &NamedNode) -> Option<ScalarFunctionRef> {
        self.scalars.get(name).map(Arc::clone)
    }
}
