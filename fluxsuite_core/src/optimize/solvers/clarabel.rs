//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min ½x'Px + q'x` subject to `Ax + s = b` with `s` in a cone. Equality
//! constraints and fixed variables go in a zero cone, inequality constraints and finite
//! variable bounds become rows of a nonnegative cone.
use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use indexmap::IndexMap;
use nalgebra_sparse::{CooMatrix, CscMatrix as SparseCsc};

use crate::optimize::objective::{ObjectiveSense, ObjectiveTerm};
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Interior point solver for LPs and convex QPs
#[derive(Clone, Debug, Default)]
pub struct ClarabelSolver {
    /// Wall clock limit in seconds
    time_limit: Option<f64>,
}

impl ClarabelSolver {
    pub fn new(time_limit: Option<f64>) -> Self {
        ClarabelSolver { time_limit }
    }
}

/// What a row of the constraint matrix came from, used to map the duals back
#[derive(Clone, Copy, Debug)]
enum RowOrigin {
    Constraint(usize),
    Variable(usize),
}

/// A single row `terms * x (= or <=) rhs`
#[derive(Debug)]
struct Row {
    terms: Vec<(usize, f64)>,
    rhs: f64,
    origin: RowOrigin,
    /// Sign relating the row's dual to the sensitivity w.r.t. the original bound
    sign: f64,
}

/// Rows of the conic problem, split by cone
#[derive(Default, Debug)]
struct ConicRows {
    zero: Vec<Row>,
    nonnegative: Vec<Row>,
}

impl ConicRows {
    /// Add `lower <= terms * x <= upper`, skipping infinite sides
    fn push_range(&mut self, terms: Vec<(usize, f64)>, lower: f64, upper: f64, origin: RowOrigin) {
        if lower == upper {
            self.zero.push(Row {
                terms,
                rhs: upper,
                origin,
                sign: 1.,
            });
            return;
        }
        if lower.is_finite() {
            self.nonnegative.push(Row {
                terms: terms.iter().map(|(i, c)| (*i, -c)).collect(),
                rhs: -lower,
                origin,
                sign: -1.,
            });
        }
        if upper.is_finite() {
            self.nonnegative.push(Row {
                terms,
                rhs: upper,
                origin,
                sign: 1.,
            });
        }
    }

    fn from_problem(problem: &Problem) -> Self {
        let mut rows = ConicRows::default();
        for (index, constraint) in problem.constraints().values().enumerate() {
            let terms = constraint
                .terms()
                .iter()
                .map(|t| (t.variable, t.coefficient))
                .collect();
            let (lower, upper) = constraint.bounds();
            rows.push_range(terms, lower, upper, RowOrigin::Constraint(index));
        }
        for (index, variable) in problem.variables().values().enumerate() {
            rows.push_range(
                vec![(index, 1.)],
                variable.lower_bound(),
                variable.upper_bound(),
                RowOrigin::Variable(index),
            );
        }
        rows
    }

    fn rows(&self) -> impl Iterator<Item = &Row> {
        self.zero.iter().chain(self.nonnegative.iter())
    }

    fn len(&self) -> usize {
        self.zero.len() + self.nonnegative.len()
    }

    fn cones(&self) -> Vec<SupportedConeT<f64>> {
        let mut cones = Vec::new();
        if !self.zero.is_empty() {
            cones.push(SupportedConeT::ZeroConeT(self.zero.len()));
        }
        if !self.nonnegative.is_empty() {
            cones.push(SupportedConeT::NonnegativeConeT(self.nonnegative.len()));
        }
        cones
    }

    fn constraint_matrix(&self, num_variables: usize) -> CscMatrix<f64> {
        let mut coo = CooMatrix::new(self.len(), num_variables);
        for (row_index, row) in self.rows().enumerate() {
            for (col, coef) in &row.terms {
                coo.push(row_index, *col, *coef);
            }
        }
        into_clarabel(SparseCsc::from(&coo))
    }

    fn rhs(&self) -> Vec<f64> {
        self.rows().map(|row| row.rhs).collect()
    }
}

/// Convert a nalgebra sparse matrix into Clarabel's CSC format
fn into_clarabel(matrix: SparseCsc<f64>) -> CscMatrix<f64> {
    let (nrows, ncols) = (matrix.nrows(), matrix.ncols());
    let (col_offsets, row_indices, values) = matrix.disassemble();
    CscMatrix::new(nrows, ncols, col_offsets, row_indices, values)
}

/// Upper triangle of P, scaled by `factor` so maximization becomes minimization
fn quadratic_matrix(problem: &Problem, factor: f64) -> CscMatrix<f64> {
    let n = problem.num_variables();
    let mut coo = CooMatrix::new(n, n);
    for term in problem.objective().terms() {
        if let ObjectiveTerm::Quadratic { var1, var2, coef } = term {
            let (row, col) = if var1 <= var2 {
                (*var1, *var2)
            } else {
                (*var2, *var1)
            };
            // ½x'Px doubles the diagonal
            let value = if row == col { 2. * coef } else { *coef };
            coo.push(row, col, factor * value);
        }
    }
    into_clarabel(SparseCsc::from(&coo))
}

fn map_status(status: SolverStatus) -> OptimizationStatus {
    match status {
        SolverStatus::Solved => OptimizationStatus::Optimal,
        SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            OptimizationStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            OptimizationStatus::Unbounded
        }
        SolverStatus::MaxIterations | SolverStatus::MaxTime | SolverStatus::InsufficientProgress => {
            OptimizationStatus::SolverHalted
        }
        _ => OptimizationStatus::NumericalError,
    }
}

/// A problem with no variables is optimal at its offset, unless some constraint
/// excludes zero
fn solve_without_variables(problem: &Problem) -> ProblemSolution {
    let feasible = problem.constraints().values().all(|constraint| {
        let (lower, upper) = constraint.bounds();
        lower <= 0. && 0. <= upper
    });
    if !feasible {
        return ProblemSolution::from_status(OptimizationStatus::Infeasible);
    }
    ProblemSolution {
        status: OptimizationStatus::Optimal,
        objective_value: Some(problem.objective_value_at(&[])),
        variable_values: Some(IndexMap::new()),
        dual_values: Some(problem.constraints().keys().map(|id| (id.clone(), 0.)).collect()),
        reduced_costs: Some(IndexMap::new()),
    }
}

impl Solver for ClarabelSolver {
    fn name(&self) -> &'static str {
        "clarabel"
    }

    fn quadratic_objective_capable(&self) -> bool {
        true
    }

    fn integer_variable_capable(&self) -> bool {
        false
    }

    fn dual_values_capable(&self) -> bool {
        true
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        self.check_capabilities(problem)?;
        let n = problem.num_variables();
        // QDLDL can't factor an empty system
        if n == 0 {
            return Ok(solve_without_variables(problem));
        }
        // Clarabel always minimizes
        let sense_factor = match problem.objective().sense() {
            ObjectiveSense::Minimize => 1.,
            ObjectiveSense::Maximize => -1.,
        };

        let rows = ConicRows::from_problem(problem);
        let p = quadratic_matrix(problem, sense_factor);
        let q: Vec<f64> = problem
            .objective()
            .linear_coefficients(n)
            .into_iter()
            .map(|c| sense_factor * c)
            .collect();
        let a = rows.constraint_matrix(n);
        let b = rows.rhs();
        let cones = rows.cones();

        let mut settings = DefaultSettingsBuilder::default();
        settings.verbose(false);
        if let Some(limit) = self.time_limit {
            settings.time_limit(limit);
        }
        let settings = settings
            .build()
            .map_err(|e| SolverError::InvalidSettings(e.to_string()))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = map_status(solver.solution.status);
        log::debug!(
            "Clarabel finished with {:?} after {} iterations",
            solver.solution.status,
            solver.solution.iterations
        );
        if !matches!(
            status,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        ) {
            return Ok(ProblemSolution::from_status(status));
        }

        let x = &solver.solution.x;
        let z = &solver.solution.z;
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .keys()
            .cloned()
            .zip(x.iter().copied())
            .collect();

        // Sensitivity of the (unscaled) objective to each bound
        let mut constraint_duals = vec![0.; problem.num_constraints()];
        let mut variable_duals = vec![0.; n];
        for (row, dual) in rows.rows().zip(z.iter()) {
            let sensitivity = -sense_factor * row.sign * dual;
            match row.origin {
                RowOrigin::Constraint(i) => constraint_duals[i] += sensitivity,
                RowOrigin::Variable(i) => variable_duals[i] += sensitivity,
            }
        }
        let dual_values = problem
            .constraints()
            .keys()
            .cloned()
            .zip(constraint_duals)
            .collect();
        let reduced_costs = problem
            .variables()
            .keys()
            .cloned()
            .zip(variable_duals)
            .collect();

        Ok(ProblemSolution {
            status,
            objective_value: Some(problem.objective_value_at(x)),
            variable_values: Some(variable_values),
            dual_values: Some(dual_values),
            reduced_costs: Some(reduced_costs),
        })
    }
}
