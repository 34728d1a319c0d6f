//! E-Flux, expression constrained flux balance analysis
use crate::analysis::expression::evaluate_gpr_expression;
use crate::analysis::formulation::FluxProblem;
use crate::analysis::{FluxAnalysis, FluxSolution};
use crate::configuration::GprPrecedence;
use crate::metabolic_model::gpr::ExpressionMap;
use crate::metabolic_model::model::Model;

/// Copy of `model` with the flux bounds of every reaction scaled by its expression score
///
/// Only reactions with a gene rule scoring below 1.0 are touched, and bounds only ever
/// shrink towards zero.
pub fn scale_model_bounds(
    model: &Model,
    expression: &ExpressionMap,
    precedence: GprPrecedence,
) -> Model {
    let mut scaled = model.clone();
    for rxn in scaled.reactions.values_mut() {
        if !rxn.has_gene_rule() {
            continue;
        }
        let score = match rxn.gene_reaction_rule.as_deref() {
            Some(rule) => evaluate_gpr_expression(rule, expression, precedence),
            None => continue,
        };
        if score < 1. {
            rxn.scale_bounds(score);
        }
    }
    scaled
}

impl FluxAnalysis {
    /// Scale reaction bounds by expression and optimize the model objective
    pub fn eflux(&self, model: &Model, expression: &ExpressionMap) -> FluxSolution {
        self.guarded("eflux", || {
            let scaled = scale_model_bounds(model, expression, self.config().gpr_policy);
            let flux_problem = FluxProblem::build(&scaled, self.config())?;
            self.solve_flux_problem(&flux_problem, false)
        })
    }
}
