//! Flux balance analysis
use crate::analysis::formulation::FluxProblem;
use crate::analysis::{AnalysisError, FluxAnalysis, FluxSolution, SolutionStatus};
use crate::metabolic_model::model::Model;

impl FluxAnalysis {
    /// Optimize the model objective under the model's current bounds
    ///
    /// Shadow prices (per metabolite) and reduced costs (per reaction) are included when
    /// the solver reports duals.
    pub fn fba(&self, model: &Model) -> FluxSolution {
        self.guarded("fba", || self.optimize(model))
    }

    /// Solve the model as currently bounded, the building block of the other methods
    pub(crate) fn optimize(&self, model: &Model) -> Result<FluxSolution, AnalysisError> {
        let flux_problem = FluxProblem::build(model, self.config())?;
        self.solve_flux_problem(&flux_problem, true)
    }

    /// Solve a formulated problem and map the result back onto reactions
    pub(crate) fn solve_flux_problem(
        &self,
        flux_problem: &FluxProblem,
        with_duals: bool,
    ) -> Result<FluxSolution, AnalysisError> {
        let solution = self.solver().solve(&flux_problem.problem)?;
        let status = SolutionStatus::from(solution.status);
        if !status.is_optimal() {
            return Ok(FluxSolution::from_status(status));
        }
        if !solution.has_solution() {
            return Ok(FluxSolution::from_status(SolutionStatus::Error(
                "Solver reported an optimum without variable values".to_string(),
            )));
        }
        let (shadow_prices, reduced_costs) = if with_duals && self.solver().dual_values_capable() {
            (
                flux_problem.shadow_prices(&solution),
                flux_problem.reduced_costs(&solution),
            )
        } else {
            (None, None)
        };
        Ok(FluxSolution {
            status,
            objective_value: solution.objective_value,
            fluxes: flux_problem.fluxes(&solution),
            shadow_prices,
            reduced_costs,
            method: String::new(),
            solver: String::new(),
            solve_time: None,
        })
    }
}
