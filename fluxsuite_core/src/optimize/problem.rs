//! Provides struct representing an optimization problem
use indexmap::IndexMap;
use thiserror::Error;

use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::{Objective, ObjectiveSense, ObjectiveTerm};
use crate::optimize::variable::{Variable, VariableBuilder, VariableType};

/// An optimization problem
///
/// Assembled by a formulation, then handed by reference to a
/// [`crate::optimize::solvers::Solver`] which never modifies it.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem, in index order
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    // endregion Creation Functions

    // region Accessors
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn variables(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Index of the variable with id `id`
    pub fn variable_index(&self, id: &str) -> Option<usize> {
        self.variables.get_index_of(id)
    }
    // endregion Accessors

    // region Update Objective Sense
    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
    }
    // endregion Update Objective Sense

    // region Adding Variables
    /// Add a variable to the optimization problem, returning its index
    pub fn add_variable(&mut self, mut variable: Variable) -> Result<usize, ProblemError> {
        // Validate that the variable can in fact be added to the problem
        self.validate_variable(&variable)?;
        let index = self.variables.len();
        variable.index = index;
        self.variables.insert(variable.id.clone(), variable);
        Ok(index)
    }

    /// Create a new variable and add it to the optimization problem, returning its index
    pub fn add_new_variable(
        &mut self,
        id: &str,
        name: Option<&str>,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<usize, ProblemError> {
        let mut builder = VariableBuilder::default();
        builder
            .id(id)
            .variable_type(variable_type)
            .lower_bound(lower_bound)
            .upper_bound(upper_bound);
        if let Some(name) = name {
            builder.name(name);
        }
        let new_var = builder
            .build()
            .map_err(|e| ProblemError::UnableToBuildVariable(e.to_string()))?;
        self.add_variable(new_var)
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(&constraint)?;
        self.constraints
            .insert(constraint.id().to_string(), constraint);
        Ok(())
    }

    /// Create a new inequality constraint using variable ids, and add it to the problem
    pub fn add_new_inequality_constraint_by_id(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let terms = self.terms_from_ids(variables, coefficients)?;
        self.add_constraint(Constraint::new_inequality(
            id,
            terms,
            lower_bound,
            upper_bound,
        ))
    }

    fn terms_from_ids(
        &self,
        variables: &[&str],
        coefficients: &[f64],
    ) -> Result<Vec<ConstraintTerm>, ProblemError> {
        if variables.len() != coefficients.len() {
            return Err(ProblemError::MismatchedCoefficients);
        }
        variables
            .iter()
            .zip(coefficients)
            .map(|(v_id, coef)| {
                self.variable_index(v_id)
                    .map(|index| ConstraintTerm::new(index, *coef))
                    .ok_or(ProblemError::NonExistentVariablesInConstraint)
            })
            .collect()
    }
    // endregion Adding Constraints

    // region Adding Objective Terms
    /// Add a new term to the objective
    pub fn add_objective_term(&mut self, objective_term: ObjectiveTerm) -> Result<(), ProblemError> {
        self.validate_objective_term(&objective_term)?;
        self.objective.add_term(objective_term);
        Ok(())
    }

    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term_by_id(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        let var = self
            .variable_index(variable_id)
            .ok_or(ProblemError::NonExistentVariablesInObjective)?;
        self.add_objective_term(ObjectiveTerm::new_linear(var, coefficient))
    }

    /// Add a new quadratic term to the objective using the variable ids
    pub fn add_new_quadratic_objective_term_by_id(
        &mut self,
        variable1: &str,
        variable2: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        let var1 = self
            .variable_index(variable1)
            .ok_or(ProblemError::NonExistentVariablesInObjective)?;
        let var2 = self
            .variable_index(variable2)
            .ok_or(ProblemError::NonExistentVariablesInObjective)?;
        self.add_objective_term(ObjectiveTerm::new_quadratic(var1, var2, coefficient))
    }

    /// Add a constant to the objective
    pub fn add_objective_offset(&mut self, offset: f64) {
        self.objective.add_offset(offset);
    }

    // endregion Adding Objective Terms

    // region Remove Objective Terms
    /// Remove all terms from the objective
    pub fn remove_all_objective_terms(&mut self) {
        self.objective.clear();
    }
    // endregion Remove Objective Terms

    // region Validation Functions
    /// Check that a variable to be added is valid to add to this problem
    fn validate_variable(&self, variable: &Variable) -> Result<(), ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists(variable.id.clone()));
        };
        let (lb, ub) = (variable.lower_bound, variable.upper_bound);
        if lb.is_nan() || ub.is_nan() || lb > ub {
            return Err(ProblemError::InvalidVariableBounds(variable.id.clone()));
        }
        Ok(())
    }

    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(constraint.id()) {
            return Err(ProblemError::ConstraintAlreadyExists(
                constraint.id().to_string(),
            ));
        }
        let (lb, ub) = constraint.bounds();
        if lb.is_nan() || ub.is_nan() || lb > ub {
            return Err(ProblemError::InvalidConstraintBounds(
                constraint.id().to_string(),
            ));
        }
        if constraint
            .terms()
            .iter()
            .any(|t| t.variable >= self.variables.len())
        {
            return Err(ProblemError::NonExistentVariablesInConstraint);
        }
        Ok(())
    }

    /// Check that an objective term to be added is valid to add to this Problem
    fn validate_objective_term(&self, objective_term: &ObjectiveTerm) -> Result<(), ProblemError> {
        let n = self.variables.len();
        let in_problem = match objective_term {
            ObjectiveTerm::Quadratic { var1, var2, .. } => *var1 < n && *var2 < n,
            ObjectiveTerm::Linear { var, .. } => *var < n,
        };
        if in_problem {
            Ok(())
        } else {
            Err(ProblemError::NonExistentVariablesInObjective)
        }
    }
    // endregion Validation Functions

    // region Check Problem
    pub fn has_integer_variables(&self) -> bool {
        self.variables.values().any(|var| var.is_integral())
    }

    pub fn has_quadratic_objective_terms(&self) -> bool {
        self.objective.contains_quadratic()
    }

    /// Value of the objective at the point `values`
    pub fn objective_value_at(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }
    // endregion Check Problem
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add variable {0} which has the same id as an existing variable")]
    VariableIdAlreadyExists(String),
    /// Error when trying to add variable with invalid bounds
    #[error("Variable {0} has lower_bound>upper_bound")]
    InvalidVariableBounds(String),
    /// Error when the variable builder fails
    #[error("Unable to build variable: {0}")]
    UnableToBuildVariable(String),
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add constraint {0} which has the same id as an existing constraint")]
    ConstraintAlreadyExists(String),
    /// Error when trying to add a constraint with invalid bounds
    #[error("Constraint {0} has lower_bound > upper_bound")]
    InvalidConstraintBounds(String),
    /// Error when trying to add a constraint that contains variables not in the model
    #[error("Tried to add a constraint with variables not in the problem")]
    NonExistentVariablesInConstraint,
    /// Error when the number of variables and coefficients differ
    #[error("Number of variables and coefficients differ")]
    MismatchedCoefficients,
    /// Error when trying to add an objective term which includes variables not in the model
    #[error("Tried adding an objective term with variables not in the problem")]
    NonExistentVariablesInObjective,
}
