//! Provides struct for representing an optimization problem's objective

/// Represents the Objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Terms included in the objective (See [`ObjectiveTerm`])
    terms: Vec<ObjectiveTerm>,
    /// Constant added to the objective value
    offset: f64,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            offset: 0.,
            sense,
        }
    }

    /// Create a new empty maximization objective
    pub fn new_maximize() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new empty minimization objective
    pub fn new_minimize() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Add a new term to the objective
    pub fn add_term(&mut self, term: ObjectiveTerm) {
        self.terms.push(term);
    }

    /// Add a constant to the objective
    pub fn add_offset(&mut self, offset: f64) {
        self.offset += offset;
    }

    /// Remove all terms (and the constant) from the objective, keeping the sense
    pub fn clear(&mut self) {
        self.terms.clear();
        self.offset = 0.;
    }

    /// Whether any term is quadratic
    pub fn contains_quadratic(&self) -> bool {
        self.terms
            .iter()
            .any(|t| matches!(t, ObjectiveTerm::Quadratic { .. }))
    }

    /// Dense vector of the linear coefficients, repeated variables are summed
    pub fn linear_coefficients(&self, num_variables: usize) -> Vec<f64> {
        let mut coefficients = vec![0.; num_variables];
        for term in &self.terms {
            if let ObjectiveTerm::Linear { var, coef } = term {
                if let Some(c) = coefficients.get_mut(*var) {
                    *c += coef;
                }
            }
        }
        coefficients
    }

    /// Value of the objective at the point `values`, indexed by variable index
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        let value_of = |i: usize| values.get(i).copied().unwrap_or(0.);
        self.terms
            .iter()
            .map(|term| match term {
                ObjectiveTerm::Linear { var, coef } => coef * value_of(*var),
                ObjectiveTerm::Quadratic { var1, var2, coef } => {
                    coef * value_of(*var1) * value_of(*var2)
                }
            })
            .sum::<f64>()
            + self.offset
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

// region Objective Terms
/// A term in the objective, variables are referenced by their index in the problem
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectiveTerm {
    /// A quadratic term in the objective, `coef * var1 * var2`
    Quadratic {
        /// First variable in the objective term
        var1: usize,
        /// Second variable in the objective term
        var2: usize,
        /// Coefficient for quadratic term
        coef: f64,
    },
    /// A linear term in the objective, `coef * var`
    Linear {
        /// Variable in objective term
        var: usize,
        /// Coefficient for linear term
        coef: f64,
    },
}

impl ObjectiveTerm {
    /// Create a new quadratic objective term
    pub fn new_quadratic(var1: usize, var2: usize, coef: f64) -> Self {
        ObjectiveTerm::Quadratic { var1, var2, coef }
    }

    /// Create a new linear objective term
    pub fn new_linear(var: usize, coef: f64) -> Self {
        ObjectiveTerm::Linear { var, coef }
    }
}

// endregion Objective Terms

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluate_mixed_objective() {
        let mut objective = Objective::new_minimize();
        objective.add_term(ObjectiveTerm::new_linear(0, 2.));
        objective.add_term(ObjectiveTerm::new_linear(0, 1.));
        objective.add_term(ObjectiveTerm::new_quadratic(1, 1, 1.));
        objective.add_offset(4.);
        assert!(objective.contains_quadratic());
        assert_eq!(objective.linear_coefficients(2), vec![3., 0.]);
        assert_eq!(objective.evaluate(&[1., 3.]), 3. + 9. + 4.);
    }

    #[test]
    fn clear_keeps_sense() {
        let mut objective = Objective::new_maximize();
        objective.add_term(ObjectiveTerm::new_quadratic(0, 1, 1.));
        objective.add_offset(1.);
        objective.clear();
        assert!(objective.terms().is_empty());
        assert_eq!(objective.offset(), 0.);
        assert_eq!(objective.sense(), ObjectiveSense::Maximize);
        assert!(!objective.contains_quadratic());
    }
}
