//! Parsimonious flux balance analysis
use crate::analysis::formulation::FluxProblem;
use crate::analysis::{AnalysisError, FluxAnalysis, FluxSolution};
use crate::metabolic_model::model::Model;

impl FluxAnalysis {
    /// Minimize total absolute flux while keeping the model objective at its optimum
    ///
    /// The reported objective value is the minimized total flux.
    pub fn pfba(&self, model: &Model) -> FluxSolution {
        self.guarded("pfba", || self.parsimonious(model))
    }

    fn parsimonious(&self, model: &Model) -> Result<FluxSolution, AnalysisError> {
        let mut flux_problem = FluxProblem::build(model, self.config())?;
        let optimum = self.solve_flux_problem(&flux_problem, false)?;
        let target = match optimum.objective_value {
            Some(value) if optimum.status.is_optimal() => value,
            _ => return Ok(optimum),
        };
        flux_problem.fix_model_objective(target, self.config().tolerance)?;
        let weights: Vec<(usize, usize, f64)> = flux_problem
            .reactions()
            .map(|split| (split.forward, split.reverse, 1.))
            .collect();
        flux_problem.use_weighted_total_flux_objective(weights)?;
        self.solve_flux_problem(&flux_problem, false)
    }
}
