//! iMAT, integrative metabolic analysis
//!
//! Reactions with a gene rule are classified by expression score. Each highly expressed
//! reaction gets a binary indicator which can only be 1 when its absolute flux reaches
//! `imat_epsilon`, each lowly expressed reaction one which can only be 1 when its flux
//! is zero. The number of satisfied indicators is maximized, which needs a solver with
//! integer support.
use crate::analysis::expression::reaction_scores;
use crate::analysis::formulation::FluxProblem;
use crate::analysis::{AnalysisError, FluxAnalysis, FluxSolution};
use crate::metabolic_model::gpr::ExpressionMap;
use crate::metabolic_model::model::Model;
use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerm};
use crate::optimize::variable::VariableType;

impl FluxAnalysis {
    /// Maximize agreement between fluxes and expression, reactions scoring at or above
    /// `high_threshold` should carry flux and those at or below `low_threshold` should not
    pub fn imat(
        &self,
        model: &Model,
        expression: &ExpressionMap,
        high_threshold: f64,
        low_threshold: f64,
    ) -> FluxSolution {
        self.guarded("imat", || {
            self.match_expression(model, expression, high_threshold, low_threshold)
        })
    }

    fn match_expression(
        &self,
        model: &Model,
        expression: &ExpressionMap,
        high_threshold: f64,
        low_threshold: f64,
    ) -> Result<FluxSolution, AnalysisError> {
        if !self.solver().integer_variable_capable() {
            return Err(AnalysisError::MissingCapability {
                method: "imat",
                capability: "integer variables",
                solver: self.solver_name(),
            });
        }
        let epsilon = self.config().imat_epsilon;
        let big_m = self.config().imat_big_m;
        let scores = reaction_scores(model, expression, self.config().gpr_policy);
        let mut flux_problem = FluxProblem::build(model, self.config())?;

        let mut indicators = Vec::new();
        let splits: Vec<_> = flux_problem.reactions().cloned().collect();
        for split in splits {
            let score = match scores.get(&split.id) {
                Some(score) => *score,
                None => continue,
            };
            let high = score >= high_threshold;
            if !high && score > low_threshold {
                continue;
            }
            let problem = &mut flux_problem.problem;
            let label = if high { "active" } else { "inactive" };
            let indicator = problem.add_new_variable(
                &format!("imat_{}_{}", label, split.id),
                None,
                VariableType::Binary,
                0.,
                1.,
            )?;
            let constraint = if high {
                // |v| - epsilon * y >= 0
                Constraint::new_inequality(
                    &format!("imat_{}_{}", label, split.id),
                    vec![
                        ConstraintTerm::new(split.forward, 1.),
                        ConstraintTerm::new(split.reverse, 1.),
                        ConstraintTerm::new(indicator, -epsilon),
                    ],
                    0.,
                    f64::INFINITY,
                )
            } else {
                // |v| + M * y <= M
                Constraint::new_inequality(
                    &format!("imat_{}_{}", label, split.id),
                    vec![
                        ConstraintTerm::new(split.forward, 1.),
                        ConstraintTerm::new(split.reverse, 1.),
                        ConstraintTerm::new(indicator, big_m),
                    ],
                    f64::NEG_INFINITY,
                    big_m,
                )
            };
            problem.add_constraint(constraint)?;
            indicators.push(indicator);
        }

        log::debug!("iMAT uses {} indicator variables", indicators.len());
        if !indicators.is_empty() {
            let problem = &mut flux_problem.problem;
            problem.remove_all_objective_terms();
            problem.update_objective_sense(ObjectiveSense::Maximize);
            for indicator in indicators {
                problem.add_objective_term(ObjectiveTerm::new_linear(indicator, 1.))?;
            }
        }
        self.solve_flux_problem(&flux_problem, false)
    }
}
