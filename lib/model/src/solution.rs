use oxrdf::{Term, Variable};
use rustc_hash::FxHashSet;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// A single row of variable bindings.
///
/// A [Solution] is immutable. Adding bindings creates a new layer on top of the existing ones that
/// shares its ancestors through an [Arc]. Lookups walk the layers from the newest to the oldest, so
/// a newer binding shadows an older binding of the same variable. A layer can never remove a
/// binding of an ancestor.
///
/// ```
/// use sparql_generate_model::{Literal, Solution, Term, Variable};
///
/// let x = Variable::new_unchecked("x");
/// let base = Solution::new().overlay(x.clone(), Literal::from(1).into());
/// let shadowed = base.overlay(x.clone(), Literal::from(2).into());
///
/// assert_eq!(base.get(&x), Some(&Term::from(Literal::from(1))));
/// assert_eq!(shadowed.get(&x), Some(&Term::from(Literal::from(2))));
/// ```
#[derive(Clone, Default)]
pub struct Solution {
    head: Option<Arc<Layer>>,
}

struct Layer {
    bindings: Vec<(Variable, Term)>,
    parent: Option<Arc<Layer>>,
}

impl Solution {
    /// Creates a solution without any bindings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a solution from the given bindings. Later bindings of the same variable take
    /// precedence.
    pub fn from_bindings(bindings: impl IntoIterator<Item = (Variable, Term)>) -> Self {
        Self::new().extend(bindings)
    }

    /// Returns the term bound to `variable`, if any.
    pub fn get(&self, variable: &Variable) -> Option<&Term> {
        let mut current = self.head.as_deref();
        while let Some(layer) = current {
            let found = layer
                .bindings
                .iter()
                .rev()
                .find(|(candidate, _)| candidate == variable);
            if let Some((_, term)) = found {
                return Some(term);
            }
            current = layer.parent.as_deref();
        }
        None
    }

    /// Returns whether `variable` is bound in this solution.
    pub fn contains(&self, variable: &Variable) -> bool {
        self.get(variable).is_some()
    }

    /// Returns a new solution that binds `variable` to `term` on top of this one.
    #[must_use]
    pub fn overlay(&self, variable: Variable, term: Term) -> Self {
        self.extend([(variable, term)])
    }

    /// Returns a new solution with all `bindings` layered on top of this one.
    ///
    /// If `bindings` is empty, the solution is returned unchanged (no empty layer is created).
    #[must_use]
    pub fn extend(&self, bindings: impl IntoIterator<Item = (Variable, Term)>) -> Self {
        let bindings = bindings.into_iter().collect::<Vec<_>>();
        if bindings.is_empty() {
            return self.clone();
        }
        Self {
            head: Some(Arc::new(Layer {
                bindings,
                parent: self.head.clone(),
            })),
        }
    }

    /// Returns a solution that only contains the bindings of `variables`.
    #[must_use]
    pub fn project(&self, variables: &[Variable]) -> Self {
        Self::from_bindings(variables.iter().filter_map(|variable| {
            self.get(variable)
                .map(|term| (variable.clone(), term.clone()))
        }))
    }

    /// Iterates over the effective bindings. Shadowed bindings are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        let mut seen = FxHashSet::default();
        let mut layers = Vec::new();
        let mut current = self.head.as_deref();
        while let Some(layer) = current {
            layers.push(layer);
            current = layer.parent.as_deref();
        }
        layers
            .into_iter()
            .flat_map(|layer| layer.bindings.iter().rev())
            .map(|(variable, term)| (variable, term))
            .filter(move |(variable, _)| seen.insert(variable.as_str()))
    }

    /// Returns the number of effective bindings.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns whether this solution binds no variable.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(variable, term)| other.get(variable) == Some(term))
    }
}

impl Eq for Solution {}

impl Debug for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(variable, term)| (variable.as_str(), term)))
            .finish()
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (variable, term)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable} -> {term}")?;
        }
        f.write_str("}")
    }
}

impl FromIterator<(Variable, Term)> for Solution {
    fn from_iter<T: IntoIterator<Item = (Variable, Term)>>(iter: T) -> Self {
        Self::from_bindings(iter)
    }
}
