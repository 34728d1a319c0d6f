//! Constraint based flux analysis methods
//!
//! A [`FluxAnalysis`] owns a [`Configuration`] and the optimizer it selects. Each method
//! formulates a fresh [`Problem`](crate::optimize::problem::Problem) from the model it is
//! given, solves it, and maps the result back to reaction fluxes. Methods never return
//! `Err`, failures are reported through [`SolutionStatus::Error`].
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::Configuration;
use crate::io::json::JsonError;
use crate::metabolic_model::model::ModelError;
use crate::optimize::problem::ProblemError;
use crate::optimize::solvers::{build_solver, Solver, SolverError};
use crate::optimize::OptimizationStatus;

pub mod eflux;
pub mod expression;
pub(crate) mod formulation;
pub mod fba;
pub mod fva;
pub mod gimme;
pub mod imat;
pub mod moma;
pub mod pfba;
pub mod request;
#[cfg(test)]
pub(crate) mod tests_common;

/// Runs flux analyses against a single configured optimizer
pub struct FluxAnalysis {
    config: Configuration,
    solver: Box<dyn Solver>,
}

impl FluxAnalysis {
    /// Create an engine using the solver selected by `config`
    ///
    /// Fails with [`AnalysisError::NoOptimizer`] if that solver was not compiled in.
    pub fn new(config: Configuration) -> Result<Self, AnalysisError> {
        let solver = build_solver(&config).map_err(|err| match err {
            SolverError::SolverNotAvailable(name) => AnalysisError::NoOptimizer(name),
            other => AnalysisError::Solver(other),
        })?;
        Ok(FluxAnalysis { config, solver })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Label of the optimizer in use
    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub(crate) fn solver(&self) -> &dyn Solver {
        self.solver.as_ref()
    }

    /// Run a formulation, turning any error into an `Error` status and stamping the
    /// method, solver and elapsed time on the result
    pub(crate) fn guarded<F>(&self, method: &str, run: F) -> FluxSolution
    where
        F: FnOnce() -> Result<FluxSolution, AnalysisError>,
    {
        let start = Instant::now();
        let mut solution = contain_panics(run).unwrap_or_else(|err| {
            log::error!("{} failed: {}", method, err);
            FluxSolution::from_status(SolutionStatus::Error(err.to_string()))
        });
        solution.method = method.to_string();
        solution.solver = self.solver_name().to_string();
        solution.solve_time = Some(start.elapsed().as_secs_f64());
        solution
    }

    pub(crate) fn guarded_fva<F>(&self, run: F) -> FvaSolution
    where
        F: FnOnce() -> Result<FvaSolution, AnalysisError>,
    {
        let start = Instant::now();
        let mut solution = contain_panics(run).unwrap_or_else(|err| {
            log::error!("fva failed: {}", err);
            FvaSolution::from_status(SolutionStatus::Error(err.to_string()))
        });
        solution.solver = self.solver_name().to_string();
        solution.solve_time = Some(start.elapsed().as_secs_f64());
        solution
    }
}

/// Run a formulation, turning a panic inside a backend into [`AnalysisError::Panicked`]
fn contain_panics<T, F>(run: F) -> Result<T, AnalysisError>
where
    F: FnOnce() -> Result<T, AnalysisError>,
{
    panic::catch_unwind(AssertUnwindSafe(run))
        .unwrap_or_else(|payload| Err(AnalysisError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Outcome of an analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "StatusRepr", into = "StatusRepr")]
pub enum SolutionStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Anything else, with a message describing what went wrong
    Error(String),
}

impl SolutionStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolutionStatus::Optimal)
    }

    /// Status string used in serialized results
    pub fn label(&self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Unbounded => "unbounded",
            SolutionStatus::Error(_) => "error",
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SolutionStatus::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl From<OptimizationStatus> for SolutionStatus {
    fn from(status: OptimizationStatus) -> Self {
        match status {
            OptimizationStatus::Optimal => SolutionStatus::Optimal,
            OptimizationStatus::AlmostOptimal => {
                log::warn!("Solver reached reduced accuracy, reporting solution as optimal");
                SolutionStatus::Optimal
            }
            OptimizationStatus::Infeasible => SolutionStatus::Infeasible,
            OptimizationStatus::Unbounded => SolutionStatus::Unbounded,
            OptimizationStatus::NumericalError => {
                SolutionStatus::Error("Solver ran into numerical trouble".to_string())
            }
            OptimizationStatus::SolverHalted => SolutionStatus::Error(
                "Solver stopped before reaching an optimum (time or iteration limit)".to_string(),
            ),
        }
    }
}

/// Serialized form of [`SolutionStatus`], `{"status": "error", "error": "..."}`
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StatusRepr {
    status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<SolutionStatus> for StatusRepr {
    fn from(status: SolutionStatus) -> Self {
        StatusRepr {
            status: status.label().to_string(),
            error: status.error_message().map(str::to_string),
        }
    }
}

impl From<StatusRepr> for SolutionStatus {
    fn from(repr: StatusRepr) -> Self {
        match repr.status.as_str() {
            "optimal" => SolutionStatus::Optimal,
            "infeasible" => SolutionStatus::Infeasible,
            "unbounded" => SolutionStatus::Unbounded,
            other => SolutionStatus::Error(repr.error.unwrap_or_else(|| other.to_string())),
        }
    }
}

/// Fluxes and sensitivities from a single analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluxSolution {
    #[serde(flatten)]
    pub status: SolutionStatus,
    pub objective_value: Option<f64>,
    /// Reaction id to net flux, in model order
    #[serde(default)]
    pub fluxes: IndexMap<String, f64>,
    /// Metabolite id to shadow price, when the solver reports duals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow_prices: Option<IndexMap<String, f64>>,
    /// Reaction id to reduced cost, when the solver reports duals
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduced_costs: Option<IndexMap<String, f64>>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub solver: String,
    /// Wall clock time in seconds
    #[serde(default)]
    pub solve_time: Option<f64>,
}

impl FluxSolution {
    pub fn from_status(status: SolutionStatus) -> Self {
        FluxSolution {
            status,
            objective_value: None,
            fluxes: IndexMap::new(),
            shadow_prices: None,
            reduced_costs: None,
            method: String::new(),
            solver: String::new(),
            solve_time: None,
        }
    }
}

/// Flux range of a reaction
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluxRange {
    pub min: f64,
    pub max: f64,
}

/// Result of flux variability analysis
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FvaSolution {
    #[serde(flatten)]
    pub status: SolutionStatus,
    /// Optimum of the model objective before it was fixed
    pub objective_value: Option<f64>,
    /// Reaction id to flux range
    #[serde(default)]
    pub ranges: IndexMap<String, FluxRange>,
    #[serde(default)]
    pub solver: String,
    #[serde(default)]
    pub solve_time: Option<f64>,
}

impl FvaSolution {
    pub fn from_status(status: SolutionStatus) -> Self {
        FvaSolution {
            status,
            objective_value: None,
            ranges: IndexMap::new(),
            solver: String::new(),
            solve_time: None,
        }
    }
}

/// Errors raised while formulating or solving an analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No optimizer available: {0} was not compiled in")]
    NoOptimizer(&'static str),
    #[error("Invalid model: {0}")]
    Model(#[from] ModelError),
    #[error("Unable to read model: {0}")]
    Json(#[from] JsonError),
    #[error("Unable to build optimization problem: {0}")]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("Model infeasible: {0}")]
    ReferenceSolve(String),
    #[error("{method} requires a solver with {capability}, {solver} has none")]
    MissingCapability {
        method: &'static str,
        capability: &'static str,
        solver: &'static str,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Solver panicked: {0}")]
    Panicked(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::SolverKind;

    #[test]
    fn status_serialization() {
        let optimal = serde_json::to_value(SolutionStatus::Optimal).unwrap();
        assert_eq!(optimal, serde_json::json!({"status": "optimal"}));
        let error = serde_json::to_value(SolutionStatus::Error("boom".to_string())).unwrap();
        assert_eq!(error, serde_json::json!({"status": "error", "error": "boom"}));
        let parsed: SolutionStatus =
            serde_json::from_value(serde_json::json!({"status": "infeasible"})).unwrap();
        assert_eq!(parsed, SolutionStatus::Infeasible);
    }

    #[test]
    fn flux_solution_is_flat() {
        let mut solution = FluxSolution::from_status(SolutionStatus::Error("bad".to_string()));
        solution.method = "fba".to_string();
        let value = serde_json::to_value(&solution).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "bad");
        assert_eq!(value["method"], "fba");
        assert!(value.get("shadow_prices").is_none());
        let parsed: FluxSolution = serde_json::from_value(value).unwrap();
        assert_eq!(parsed.status, solution.status);
    }

    #[test]
    fn degraded_statuses() {
        assert_eq!(
            SolutionStatus::from(OptimizationStatus::AlmostOptimal),
            SolutionStatus::Optimal
        );
        assert!(matches!(
            SolutionStatus::from(OptimizationStatus::SolverHalted),
            SolutionStatus::Error(_)
        ));
    }

    #[test]
    fn engine_construction() {
        let engine = FluxAnalysis::new(Configuration::default()).unwrap();
        assert_eq!(engine.solver_name(), "clarabel");
        let config = Configuration::default().with_solver(SolverKind::Microlp);
        match FluxAnalysis::new(config) {
            Ok(engine) => assert_eq!(engine.solver_name(), "microlp"),
            Err(err) => assert!(matches!(err, AnalysisError::NoOptimizer("microlp"))),
        }
    }

    #[test]
    fn panics_become_error_status() {
        let engine = FluxAnalysis::new(Configuration::default()).unwrap();
        let solution = engine.guarded("fba", || -> Result<FluxSolution, AnalysisError> {
            panic!("factorization failed")
        });
        assert_eq!(
            solution.status,
            SolutionStatus::Error("Solver panicked: factorization failed".to_string())
        );
        assert_eq!(solution.method, "fba");

        let ranges = engine.guarded_fva(|| -> Result<FvaSolution, AnalysisError> {
            panic!("{} rows", 3)
        });
        assert_eq!(ranges.status.error_message(), Some("Solver panicked: 3 rows"));
    }
}
