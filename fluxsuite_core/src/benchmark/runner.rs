//! Running every method against every backend for a batch of models
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use indexmap::IndexMap;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisError, FluxAnalysis, FluxRange, FluxSolution, FvaSolution};
use crate::benchmark::{timestamp, BenchmarkError};
use crate::configuration::{Configuration, SolverKind};
use crate::metabolic_model::gpr::ExpressionMap;
use crate::metabolic_model::model::Model;

/// Analysis run for each model in a benchmark
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BenchmarkMethod {
    Fba,
    Pfba,
    /// FVA keeping the given fraction of the optimum
    Fva(f64),
    /// Linear MOMA against the model's own FBA solution
    Moma,
    /// E-Flux without expression data
    Eflux,
}

impl FromStr for BenchmarkMethod {
    type Err = BenchmarkError;

    /// `fva` alone keeps 90% of the optimum, `fva_95` keeps 95%
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fba" => Ok(BenchmarkMethod::Fba),
            "pfba" => Ok(BenchmarkMethod::Pfba),
            "moma" => Ok(BenchmarkMethod::Moma),
            "eflux" => Ok(BenchmarkMethod::Eflux),
            "fva" => Ok(BenchmarkMethod::Fva(0.9)),
            other => other
                .strip_prefix("fva_")
                .and_then(|percent| percent.parse::<u32>().ok())
                .filter(|percent| *percent <= 100)
                .map(|percent| BenchmarkMethod::Fva(percent as f64 / 100.))
                .ok_or_else(|| BenchmarkError::UnknownMethod(other.to_string())),
        }
    }
}

impl Display for BenchmarkMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchmarkMethod::Fba => write!(f, "fba"),
            BenchmarkMethod::Pfba => write!(f, "pfba"),
            BenchmarkMethod::Fva(fraction) => write!(f, "fva_{}", (fraction * 100.).round() as u32),
            BenchmarkMethod::Moma => write!(f, "moma"),
            BenchmarkMethod::Eflux => write!(f, "eflux"),
        }
    }
}

/// Flux of a reaction, a single value or an FVA range
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FluxValue {
    Scalar(f64),
    Range(FluxRange),
}

impl FluxValue {
    /// Lower and upper end, equal for a single value
    pub fn endpoints(&self) -> (f64, f64) {
        match self {
            FluxValue::Scalar(value) => (*value, *value),
            FluxValue::Range(range) => (range.min, range.max),
        }
    }
}

/// Outcome of one (model, method, solver) run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub model_id: String,
    pub method: String,
    pub solver: String,
    pub status: String,
    /// Only set for optimal results
    pub objective_value: Option<f64>,
    /// Only set for optimal results
    pub fluxes: Option<IndexMap<String, FluxValue>>,
    pub solve_time_ms: f64,
    pub error: Option<String>,
}

impl SolveResult {
    fn from_flux_solution(model_id: &str, method: &str, solution: FluxSolution, elapsed_ms: f64) -> Self {
        let optimal = solution.status.is_optimal();
        SolveResult {
            model_id: model_id.to_string(),
            method: method.to_string(),
            solver: solution.solver,
            status: solution.status.label().to_string(),
            objective_value: solution.objective_value.filter(|_| optimal),
            fluxes: optimal.then(|| {
                solution
                    .fluxes
                    .into_iter()
                    .map(|(id, flux)| (id, FluxValue::Scalar(flux)))
                    .collect()
            }),
            solve_time_ms: elapsed_ms,
            error: solution.status.error_message().map(str::to_string),
        }
    }

    fn from_fva_solution(model_id: &str, method: &str, solution: FvaSolution, elapsed_ms: f64) -> Self {
        let optimal = solution.status.is_optimal();
        SolveResult {
            model_id: model_id.to_string(),
            method: method.to_string(),
            solver: solution.solver,
            status: solution.status.label().to_string(),
            objective_value: solution.objective_value.filter(|_| optimal),
            fluxes: optimal.then(|| {
                solution
                    .ranges
                    .into_iter()
                    .map(|(id, range)| (id, FluxValue::Range(range)))
                    .collect()
            }),
            solve_time_ms: elapsed_ms,
            error: solution.status.error_message().map(str::to_string),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == "optimal"
    }
}

/// Counts describing one benchmark run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub num_models: usize,
    pub num_results: usize,
    pub methods: Vec<String>,
    pub timestamp: String,
    pub optimal_count: usize,
    pub error_count: usize,
}

#[derive(Serialize)]
struct ExportedRun<'a> {
    summary: &'a RunSummary,
    results: &'a [SolveResult],
}

/// Runs benchmark methods with one engine per backend
pub struct BenchmarkRunner {
    engines: Vec<FluxAnalysis>,
    processes: usize,
}

impl BenchmarkRunner {
    /// One engine per entry of `solvers`, all sharing the rest of `config`
    pub fn new(config: &Configuration, solvers: &[SolverKind]) -> Result<Self, AnalysisError> {
        let engines = solvers
            .iter()
            .map(|solver| FluxAnalysis::new(config.with_solver(*solver)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(BenchmarkRunner {
            engines,
            processes: config.processes.max(1) as usize,
        })
    }

    pub fn solver_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|engine| engine.solver_name()).collect()
    }

    /// Run one method on one model with one engine
    pub fn run_single(
        &self,
        engine: &FluxAnalysis,
        model_id: &str,
        model: &Model,
        method: BenchmarkMethod,
    ) -> SolveResult {
        let label = method.to_string();
        let start = Instant::now();
        let elapsed_ms = |start: Instant| start.elapsed().as_secs_f64() * 1000.;
        match method {
            BenchmarkMethod::Fva(fraction) => {
                let solution = engine.fva(model, fraction, None);
                SolveResult::from_fva_solution(model_id, &label, solution, elapsed_ms(start))
            }
            _ => {
                let solution = match method {
                    BenchmarkMethod::Pfba => engine.pfba(model),
                    BenchmarkMethod::Moma => {
                        engine.moma(model, &IndexMap::new(), &[], None, true)
                    }
                    BenchmarkMethod::Eflux => engine.eflux(model, &ExpressionMap::new()),
                    _ => engine.fba(model),
                };
                SolveResult::from_flux_solution(model_id, &label, solution, elapsed_ms(start))
            }
        }
    }

    /// Every method with every engine on one model, ordered by method then engine
    pub fn run_model(
        &self,
        model_id: &str,
        model: &Model,
        methods: &[BenchmarkMethod],
    ) -> Vec<SolveResult> {
        log::info!("Benchmarking {}", model_id);
        let mut results = Vec::with_capacity(methods.len() * self.engines.len());
        for method in methods {
            for engine in &self.engines {
                let result = self.run_single(engine, model_id, model, *method);
                if let Some(ref error) = result.error {
                    log::warn!("{} {} on {}: {}", model_id, method, result.solver, error);
                }
                results.push(result);
            }
        }
        results
    }

    /// Run all models, spread over the configured number of worker threads
    ///
    /// Results come back in model order regardless of how the work was split.
    pub fn run(&self, models: &[(String, Model)], methods: &[BenchmarkMethod]) -> Vec<SolveResult> {
        let sequential = || {
            models
                .iter()
                .flat_map(|(id, model)| self.run_model(id, model, methods))
                .collect()
        };
        if self.processes <= 1 || models.len() <= 1 {
            return sequential();
        }
        match ThreadPoolBuilder::new().num_threads(self.processes).build() {
            Ok(pool) => pool.install(|| {
                models
                    .par_iter()
                    .flat_map_iter(|(id, model)| self.run_model(id, model, methods))
                    .collect()
            }),
            Err(err) => {
                log::warn!("Running sequentially, no worker pool: {}", err);
                sequential()
            }
        }
    }
}

pub fn summarize_run(
    results: &[SolveResult],
    num_models: usize,
    methods: &[BenchmarkMethod],
) -> RunSummary {
    RunSummary {
        num_models,
        num_results: results.len(),
        methods: methods.iter().map(|m| m.to_string()).collect(),
        timestamp: timestamp(),
        optimal_count: results.iter().filter(|r| r.is_optimal()).count(),
        error_count: results.iter().filter(|r| r.status == "error").count(),
    }
}

/// Write the summary and raw results to `results_<timestamp>.json` in `output_dir`
pub fn export_results<P: AsRef<Path>>(
    results: &[SolveResult],
    summary: &RunSummary,
    output_dir: P,
) -> Result<PathBuf, BenchmarkError> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir).map_err(|e| BenchmarkError::io(output_dir, e))?;
    let path = output_dir.join(format!("results_{}.json", summary.timestamp));
    let exported = ExportedRun { summary, results };
    fs::write(&path, serde_json::to_string_pretty(&exported)?)
        .map_err(|e| BenchmarkError::io(&path, e))?;
    log::info!("Results written to {}", path.display());
    Ok(path)
}

/// Split results by solver label, keeping their order
pub fn results_by_solver(results: &[SolveResult]) -> IndexMap<String, Vec<SolveResult>> {
    let mut by_solver: IndexMap<String, Vec<SolveResult>> = IndexMap::new();
    for result in results {
        by_solver
            .entry(result.solver.clone())
            .or_default()
            .push(result.clone());
    }
    by_solver
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn toy_model() -> Model {
        Model::from_json_str(
            include_str!("../../test_data/test_models/toy_chain.json"),
            &Configuration::default(),
        )
        .unwrap()
    }

    fn solvers() -> Vec<SolverKind> {
        if cfg!(feature = "minilp") {
            vec![SolverKind::Clarabel, SolverKind::Microlp]
        } else {
            vec![SolverKind::Clarabel]
        }
    }

    #[test]
    fn method_names() {
        assert_eq!("fba".parse::<BenchmarkMethod>().unwrap(), BenchmarkMethod::Fba);
        assert_eq!("fva".parse::<BenchmarkMethod>().unwrap(), BenchmarkMethod::Fva(0.9));
        assert_eq!("fva_95".parse::<BenchmarkMethod>().unwrap(), BenchmarkMethod::Fva(0.95));
        assert_eq!(BenchmarkMethod::Fva(0.9).to_string(), "fva_90");
        assert!("fva_x".parse::<BenchmarkMethod>().is_err());
        assert!("fva_150".parse::<BenchmarkMethod>().is_err());
        assert!("flux".parse::<BenchmarkMethod>().is_err());
    }

    #[test]
    fn flux_values_serialize_by_shape() {
        let scalar = serde_json::to_value(FluxValue::Scalar(1.5)).unwrap();
        assert_eq!(scalar, serde_json::json!(1.5));
        let range: FluxValue = serde_json::from_value(serde_json::json!({"min": 0, "max": 2})).unwrap();
        assert_eq!(range.endpoints(), (0., 2.));
    }

    #[test]
    fn every_method_and_solver() {
        let runner = BenchmarkRunner::new(&Configuration::default(), &solvers()).unwrap();
        let methods = [BenchmarkMethod::Fba, BenchmarkMethod::Fva(0.9)];
        let results = runner.run_model("toy_chain", &toy_model(), &methods);
        assert_eq!(results.len(), 2 * solvers().len());
        assert!(results.iter().all(|r| r.is_optimal()));
        assert_eq!(results[0].method, "fba");
        assert_eq!(results[0].solver, "clarabel");
        assert_abs_diff_eq!(results[0].objective_value.unwrap(), 10., epsilon = 1e-6);
        let fva = results.iter().find(|r| r.method == "fva_90").unwrap();
        let r1 = fva.fluxes.as_ref().unwrap()["R1"].endpoints();
        assert_abs_diff_eq!(r1.0, 9., epsilon = 1e-5);
    }

    #[test]
    fn parallel_run_keeps_order() {
        let config = Configuration {
            processes: 3,
            ..Configuration::default()
        };
        let runner = BenchmarkRunner::new(&config, &[SolverKind::Clarabel]).unwrap();
        let models: Vec<(String, Model)> = (0..5)
            .map(|i| (format!("model_{}", i), toy_model()))
            .collect();
        let results = runner.run(&models, &[BenchmarkMethod::Fba]);
        let ids: Vec<&str> = results.iter().map(|r| r.model_id.as_str()).collect();
        assert_eq!(ids, vec!["model_0", "model_1", "model_2", "model_3", "model_4"]);
    }

    #[test]
    fn non_optimal_results_carry_no_values() {
        let mut model = toy_model();
        model.reactions["R2"].lower_bound = 20.;
        model.reactions["R2"].upper_bound = 30.;
        let runner = BenchmarkRunner::new(&Configuration::default(), &[SolverKind::Clarabel]).unwrap();
        let results = runner.run_model("bad", &model, &[BenchmarkMethod::Pfba]);
        assert_eq!(results[0].status, "infeasible");
        assert!(results[0].objective_value.is_none());
        assert!(results[0].fluxes.is_none());
    }

    #[test]
    fn summary_and_export() {
        let runner = BenchmarkRunner::new(&Configuration::default(), &[SolverKind::Clarabel]).unwrap();
        let methods = [BenchmarkMethod::Fba, BenchmarkMethod::Eflux];
        let results = runner.run_model("toy_chain", &toy_model(), &methods);
        let summary = summarize_run(&results, 1, &methods);
        assert_eq!(summary.num_results, 2);
        assert_eq!(summary.optimal_count, 2);
        assert_eq!(summary.methods, vec!["fba", "eflux"]);

        let dir = tempfile::tempdir().unwrap();
        let path = export_results(&results, &summary, dir.path()).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written["results"].as_array().unwrap().len(), 2);
        assert_eq!(written["summary"]["num_models"], 1);

        let grouped = results_by_solver(&results);
        assert_eq!(grouped["clarabel"].len(), 2);
    }
}
