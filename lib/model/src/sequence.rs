use crate::Solution;
use oxrdf::Variable;

/// An ordered list of [Solution]s that share a declared set of variables.
///
/// The declared variables may grow while the sequence flows through binding clauses. A solution is
/// not required to bind every declared variable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SolutionSequence {
    variables: Vec<Variable>,
    solutions: Vec<Solution>,
}

impl SolutionSequence {
    /// Creates a new sequence.
    pub fn new(variables: Vec<Variable>, solutions: Vec<Solution>) -> Self {
        let mut result = Self {
            variables: Vec::with_capacity(variables.len()),
            solutions,
        };
        for variable in variables {
            result.declare(variable);
        }
        result
    }

    /// Creates a sequence with a single solution that binds nothing.
    ///
    /// This is the input of a query that is not given any values.
    pub fn unit() -> Self {
        Self::new(Vec::new(), vec![Solution::new()])
    }

    /// Returns the declared variables in declaration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Returns the solutions.
    pub fn solutions(&self) -> &[Solution] {
        &self.solutions
    }

    /// Returns the number of solutions.
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Returns whether there is no solution.
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    /// Adds `variable` to the declared variables if it is not already declared.
    ///
    /// Returns `true` if the variable was newly declared.
    pub fn declare(&mut self, variable: Variable) -> bool {
        if self.variables.contains(&variable) {
            return false;
        }
        self.variables.push(variable);
        true
    }

    /// Appends a solution.
    pub fn push(&mut self, solution: Solution) {
        self.solutions.push(solution);
    }

    /// Returns a sequence with the same declared variables and other solutions.
    #[must_use]
    pub fn with_solutions(&self, solutions: Vec<Solution>) -> Self {
        Self {
            variables: self.variables.clone(),
            solutions,
        }
    }

    /// Iterates over the solutions.
    pub fn iter(&self) -> std::slice::Iter<'_, Solution> {
        self.solutions.iter()
    }

    /// Splits the sequence into its variables and solutions.
    pub fn into_parts(self) -> (Vec<Variable>, Vec<Solution>) {
        (self.variables, self.solutions)
    }
}

impl IntoIterator for SolutionSequence {
    type Item = Solution;
    type IntoIter = std::vec::IntoIter<Solution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.into_iter()
    }
}

impl<'a> IntoIterator for &'a SolutionSequence {
    type Item = &'a Solution;
    type IntoIter = std::slice::Iter<'a, Solution>;

    fn into_iter(self) -> Self::IntoIter {
        self.solutions.iter()
    }
}
