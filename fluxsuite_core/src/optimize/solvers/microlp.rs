//! Solver interface for microlp, a pure Rust simplex solver with branch and bound
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use indexmap::IndexMap;
use microlp::{ComparisonOp, LinearExpr, OptimizationDirection};

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::VariableType;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Simplex solver for LPs and MILPs, doesn't report duals
#[derive(Clone, Debug, Default)]
pub struct MicrolpSolver {
    /// Wall clock limit in seconds
    time_limit: Option<f64>,
}

impl MicrolpSolver {
    pub fn new(time_limit: Option<f64>) -> Self {
        MicrolpSolver { time_limit }
    }
}

/// Outcome of a microlp solve, variable values are in problem order
enum Outcome {
    Solved(Vec<f64>),
    Status(OptimizationStatus),
    Failed(String),
}

/// Translate the problem into microlp and solve it
fn solve_blocking(problem: &Problem) -> Outcome {
    let direction = match problem.objective().sense() {
        ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        ObjectiveSense::Minimize => OptimizationDirection::Minimize,
    };
    let mut lp = microlp::Problem::new(direction);
    let coefficients = problem.objective().linear_coefficients(problem.num_variables());
    let vars: Vec<microlp::Variable> = problem
        .variables()
        .values()
        .zip(coefficients)
        .map(|(var, coef)| match var.variable_type() {
            VariableType::Continuous => lp.add_var(coef, (var.lower_bound(), var.upper_bound())),
            VariableType::Binary => lp.add_binary_var(coef),
            VariableType::Integer => lp.add_integer_var(
                coef,
                (
                    clamp_to_i32(var.lower_bound().ceil()),
                    clamp_to_i32(var.upper_bound().floor()),
                ),
            ),
        })
        .collect();

    for constraint in problem.constraints().values() {
        let (lower, upper) = constraint.bounds();
        let expression = || {
            let mut expr = LinearExpr::empty();
            for term in constraint.terms() {
                expr.add(vars[term.variable], term.coefficient);
            }
            expr
        };
        if lower == upper {
            lp.add_constraint(expression(), ComparisonOp::Eq, upper);
            continue;
        }
        if lower.is_finite() {
            lp.add_constraint(expression(), ComparisonOp::Ge, lower);
        }
        if upper.is_finite() {
            lp.add_constraint(expression(), ComparisonOp::Le, upper);
        }
    }

    match lp.solve() {
        Ok(solution) => Outcome::Solved(vars.iter().map(|v| solution[*v]).collect()),
        Err(microlp::Error::Infeasible) => Outcome::Status(OptimizationStatus::Infeasible),
        Err(microlp::Error::Unbounded) => Outcome::Status(OptimizationStatus::Unbounded),
        Err(other) => Outcome::Failed(other.to_string()),
    }
}

fn clamp_to_i32(value: f64) -> i32 {
    value.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

impl Solver for MicrolpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn quadratic_objective_capable(&self) -> bool {
        false
    }

    fn integer_variable_capable(&self) -> bool {
        true
    }

    fn dual_values_capable(&self) -> bool {
        false
    }

    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        self.check_capabilities(problem)?;

        let outcome = match self.time_limit {
            None => solve_blocking(problem),
            Some(limit) => {
                // microlp has no time limit of its own, so the solve runs on a worker
                // thread which is abandoned if it doesn't answer in time
                let (sender, receiver) = mpsc::channel();
                let owned = problem.clone();
                thread::Builder::new()
                    .name("microlp-solve".to_string())
                    .spawn(move || {
                        let _ = sender.send(solve_blocking(&owned));
                    })
                    .map_err(|e| SolverError::BackendFailure(e.to_string()))?;
                match receiver.recv_timeout(Duration::from_secs_f64(limit.max(0.))) {
                    Ok(outcome) => outcome,
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        log::warn!(
                            "microlp solve exceeded the {}s time limit, its thread keeps running in the background",
                            limit
                        );
                        Outcome::Status(OptimizationStatus::SolverHalted)
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        Outcome::Failed("solver thread exited without a result".to_string())
                    }
                }
            }
        };

        match outcome {
            Outcome::Solved(values) => {
                let objective_value = problem.objective_value_at(&values);
                let variable_values: IndexMap<String, f64> = problem
                    .variables()
                    .keys()
                    .cloned()
                    .zip(values)
                    .collect();
                Ok(ProblemSolution {
                    status: OptimizationStatus::Optimal,
                    objective_value: Some(objective_value),
                    variable_values: Some(variable_values),
                    dual_values: None,
                    reduced_costs: None,
                })
            }
            Outcome::Status(status) => Ok(ProblemSolution::from_status(status)),
            Outcome::Failed(message) => Err(SolverError::BackendFailure(message)),
        }
    }
}
