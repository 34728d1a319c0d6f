//! GIMME, penalizing flux through lowly expressed reactions
use crate::analysis::expression::reaction_scores;
use crate::analysis::formulation::{fraction_of_optimum, FluxProblem};
use crate::analysis::{AnalysisError, FluxAnalysis, FluxSolution};
use crate::metabolic_model::gpr::ExpressionMap;
use crate::metabolic_model::model::Model;

impl FluxAnalysis {
    /// Keep the model objective at `required_fraction` of its optimum while minimizing
    /// `sum((threshold - score) * |v|)` over reactions scoring below `threshold`
    ///
    /// Reactions without a gene rule score 1.0. The objective value of the result is
    /// the remaining penalty.
    pub fn gimme(
        &self,
        model: &Model,
        expression: &ExpressionMap,
        threshold: f64,
        required_fraction: f64,
    ) -> FluxSolution {
        self.guarded("gimme", || {
            self.penalize_low_expression(model, expression, threshold, required_fraction)
        })
    }

    fn penalize_low_expression(
        &self,
        model: &Model,
        expression: &ExpressionMap,
        threshold: f64,
        required_fraction: f64,
    ) -> Result<FluxSolution, AnalysisError> {
        let optimum = self.optimize(model)?;
        let optimum_value = match optimum.objective_value {
            Some(value) if optimum.status.is_optimal() => value,
            _ => return Err(AnalysisError::ReferenceSolve(optimum.status.label().to_string())),
        };

        let scores = reaction_scores(model, expression, self.config().gpr_policy);
        let mut flux_problem = FluxProblem::build(model, self.config())?;
        if flux_problem.has_model_objective() {
            flux_problem.fix_model_objective(
                fraction_of_optimum(optimum_value, required_fraction),
                self.config().tolerance,
            )?;
        }
        let penalties: Vec<(usize, usize, f64)> = flux_problem
            .reactions()
            .filter_map(|split| {
                let score = scores.get(&split.id).copied().unwrap_or(1.);
                (score < threshold).then(|| (split.forward, split.reverse, threshold - score))
            })
            .collect();
        log::debug!("GIMME penalizes {} reactions", penalties.len());
        flux_problem.use_weighted_total_flux_objective(penalties)?;
        self.solve_flux_problem(&flux_problem, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests_common::{branch_model, engines};
    use crate::analysis::SolutionStatus;
    use approx::assert_abs_diff_eq;

    fn expression() -> ExpressionMap {
        let mut expression = ExpressionMap::new();
        expression.insert("g2".to_string(), 1.0);
        expression.insert("g3".to_string(), 0.1);
        expression
    }

    #[test]
    fn low_expression_is_avoided() {
        for engine in engines() {
            let solution = engine.gimme(&branch_model(), &expression(), 0.25, 0.9);
            assert_eq!(solution.status, SolutionStatus::Optimal, "{}", engine.solver_name());
            assert_eq!(solution.method, "gimme");
            assert_abs_diff_eq!(solution.fluxes["R3"], 0., epsilon = 1e-4);
            assert_abs_diff_eq!(solution.objective_value.unwrap(), 0., epsilon = 1e-4);
            assert!(solution.fluxes["R2"] >= 9. - 1e-4);
        }
    }

    #[test]
    fn infeasible_model_is_an_error() {
        let mut model = branch_model();
        model.reactions["R2"].lower_bound = 11.;
        model.reactions["R2"].upper_bound = 12.;
        let solution = engines()[0].gimme(&model, &expression(), 0.25, 0.9);
        let message = solution.status.error_message().unwrap();
        assert!(message.starts_with("Model infeasible"));
    }
}
