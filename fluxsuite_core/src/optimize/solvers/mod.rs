//! Optimizer backends
use thiserror::Error;

use crate::configuration::{Configuration, SolverKind};
use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

pub mod clarabel;
#[cfg(feature = "minilp")]
pub mod microlp;

/// An optimizer which can solve an assembled [`Problem`]
///
/// Implementations hold no per-problem state, so one instance can solve
/// any number of problems, from any thread.
pub trait Solver: Send + Sync {
    /// Label used in results and reports
    fn name(&self) -> &'static str;

    /// Whether the solver can handle quadratic objective terms
    fn quadratic_objective_capable(&self) -> bool;

    /// Whether the solver can handle integer (and binary) variables
    fn integer_variable_capable(&self) -> bool;

    /// Whether the solver reports dual values and reduced costs
    fn dual_values_capable(&self) -> bool;

    /// Solve the problem
    ///
    /// Infeasible and unbounded problems are reported through the solution status,
    /// `Err` is reserved for problems the solver can't take on at all.
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;

    /// Check that the problem only uses features this solver supports
    fn check_capabilities(&self, problem: &Problem) -> Result<(), SolverError> {
        if problem.has_quadratic_objective_terms() && !self.quadratic_objective_capable() {
            return Err(SolverError::QuadraticObjectiveUnsupported(self.name()));
        }
        if problem.has_integer_variables() && !self.integer_variable_capable() {
            return Err(SolverError::IntegerVariablesUnsupported(self.name()));
        }
        Ok(())
    }
}

/// Create the solver selected in the configuration
pub fn build_solver(config: &Configuration) -> Result<Box<dyn Solver>, SolverError> {
    match config.solver {
        SolverKind::Clarabel => Ok(Box::new(clarabel::ClarabelSolver::new(config.time_limit))),
        SolverKind::Microlp => microlp_solver(config.time_limit),
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "minilp")] {
        fn microlp_solver(time_limit: Option<f64>) -> Result<Box<dyn Solver>, SolverError> {
            Ok(Box::new(microlp::MicrolpSolver::new(time_limit)))
        }
    } else {
        fn microlp_solver(_time_limit: Option<f64>) -> Result<Box<dyn Solver>, SolverError> {
            Err(SolverError::SolverNotAvailable(SolverKind::Microlp.label()))
        }
    }
}

/// Errors raised by the solver backends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The backend wasn't compiled in
    #[error("Solver {0} is not available, check the enabled features")]
    SolverNotAvailable(&'static str),
    /// Quadratic objective handed to a linear solver
    #[error("Solver {0} can't handle quadratic objective terms")]
    QuadraticObjectiveUnsupported(&'static str),
    /// Integer variables handed to a continuous solver
    #[error("Solver {0} can't handle integer variables")]
    IntegerVariablesUnsupported(&'static str),
    /// Settings rejected by the backend
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
    /// The backend failed in some other way
    #[error("Solver failure: {0}")]
    BackendFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_clarabel() {
        let solver = build_solver(&Configuration::default()).unwrap();
        assert_eq!(solver.name(), "clarabel");
        assert!(solver.quadratic_objective_capable());
        assert!(!solver.integer_variable_capable());
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn build_microlp() {
        let config = Configuration::default().with_solver(SolverKind::Microlp);
        let solver = build_solver(&config).unwrap();
        assert_eq!(solver.name(), "microlp");
        assert!(!solver.quadratic_objective_capable());
        assert!(solver.integer_variable_capable());
    }
}
