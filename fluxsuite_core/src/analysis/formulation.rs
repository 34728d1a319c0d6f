//! Turning a metabolic model into an optimization problem
//!
//! Every reaction is split into a forward and a reverse variable, both non-negative, so
//! the net flux is `forward - reverse` and the absolute flux can be written linearly as
//! `forward + reverse`. Each metabolite contributes a steady state (mass balance)
//! equality constraint keyed by its id.
use std::collections::HashSet;

use indexmap::IndexMap;

use crate::analysis::AnalysisError;
use crate::configuration::{Configuration, KnockoutPolicy};
use crate::metabolic_model::model::Model;
use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerm};
use crate::optimize::problem::Problem;
use crate::optimize::variable::VariableType;
use crate::optimize::ProblemSolution;

/// Id of the constraint holding the model objective near its optimum
pub(crate) const FIXED_OBJECTIVE_ID: &str = "fixed_objective";

/// Objective value that keeps `fraction` of `optimum`
///
/// For a negative optimum the target moves down by the same relative amount, so it never
/// exceeds the optimum itself.
pub(crate) fn fraction_of_optimum(optimum: f64, fraction: f64) -> f64 {
    optimum - (1. - fraction) * optimum.abs()
}

/// Problem variables of one reaction
#[derive(Clone, Debug)]
pub(crate) struct SplitReaction {
    pub id: String,
    pub forward: usize,
    pub reverse: usize,
}

/// An optimization problem formulated from a model, with the bookkeeping needed to map
/// the solution back to reactions and metabolites
#[derive(Clone, Debug)]
pub(crate) struct FluxProblem {
    pub problem: Problem,
    reactions: IndexMap<String, SplitReaction>,
    metabolites: Vec<String>,
    objective: Vec<(String, f64)>,
}

impl FluxProblem {
    /// Formulate the steady state problem of `model`, maximizing its objective
    pub fn build(model: &Model, config: &Configuration) -> Result<Self, AnalysisError> {
        let mut problem = Problem::new_maximization();
        let knocked_out: HashSet<String> = match config.knockout_policy {
            KnockoutPolicy::FlagOnly => HashSet::new(),
            KnockoutPolicy::ZeroBounds => model.inactive_reactions().into_iter().collect(),
        };
        if !knocked_out.is_empty() {
            log::debug!(
                "Fixing {} reactions with inactive gene rules to zero flux",
                knocked_out.len()
            );
        }

        let mut reactions = IndexMap::with_capacity(model.reactions.len());
        let mut balances: IndexMap<&str, Vec<ConstraintTerm>> = IndexMap::new();
        for rxn in model.reactions.values() {
            let (forward_bounds, reverse_bounds) = if knocked_out.contains(&rxn.id) {
                ((0., 0.), (0., 0.))
            } else {
                (
                    (rxn.get_forward_lower_bound(), rxn.get_forward_upper_bound()),
                    (rxn.get_reverse_lower_bound(), rxn.get_reverse_upper_bound()),
                )
            };
            let forward = problem.add_new_variable(
                &rxn.get_forward_id(),
                None,
                VariableType::Continuous,
                forward_bounds.0,
                forward_bounds.1,
            )?;
            let reverse = problem.add_new_variable(
                &rxn.get_reverse_id(),
                None,
                VariableType::Continuous,
                reverse_bounds.0,
                reverse_bounds.1,
            )?;
            for (met_id, coef) in &rxn.metabolites {
                let terms = balances.entry(met_id.as_str()).or_default();
                terms.push(ConstraintTerm::new(forward, *coef));
                terms.push(ConstraintTerm::new(reverse, -*coef));
            }
            reactions.insert(
                rxn.id.clone(),
                SplitReaction {
                    id: rxn.id.clone(),
                    forward,
                    reverse,
                },
            );
        }

        // Mass balance in metabolite order, metabolites no reaction touches have no row
        let mut metabolites = Vec::with_capacity(model.metabolites.len());
        for met_id in model.metabolites.keys() {
            if let Some(terms) = balances.swap_remove(met_id.as_str()) {
                problem.add_constraint(Constraint::new_equality(met_id, terms, 0.))?;
            }
            metabolites.push(met_id.clone());
        }

        let objective: Vec<(String, f64)> = model
            .objective
            .iter()
            .filter(|(id, _)| reactions.contains_key(*id))
            .map(|(id, coef)| (id.clone(), *coef))
            .collect();
        let mut flux_problem = FluxProblem {
            problem,
            reactions,
            metabolites,
            objective,
        };
        flux_problem.use_model_objective()?;
        Ok(flux_problem)
    }

    pub fn reaction(&self, id: &str) -> Option<&SplitReaction> {
        self.reactions.get(id)
    }

    pub fn reactions(&self) -> impl Iterator<Item = &SplitReaction> {
        self.reactions.values()
    }

    /// Whether the model defines any objective
    pub fn has_model_objective(&self) -> bool {
        !self.objective.is_empty()
    }

    /// Terms `coef * (forward - reverse)` of the model objective
    fn model_objective_terms(&self) -> Vec<ConstraintTerm> {
        self.objective
            .iter()
            .filter_map(|(id, coef)| self.reactions.get(id).map(|split| (split, coef)))
            .flat_map(|(split, coef)| {
                [
                    ConstraintTerm::new(split.forward, *coef),
                    ConstraintTerm::new(split.reverse, -*coef),
                ]
            })
            .collect()
    }

    /// Replace the objective with maximizing the model objective
    pub fn use_model_objective(&mut self) -> Result<(), AnalysisError> {
        self.problem.remove_all_objective_terms();
        self.problem.update_objective_sense(ObjectiveSense::Maximize);
        for term in self.model_objective_terms() {
            self.problem
                .add_objective_term(ObjectiveTerm::new_linear(term.variable, term.coefficient))?;
        }
        Ok(())
    }

    /// Replace the objective with optimizing the net flux of one reaction
    pub fn use_reaction_objective(
        &mut self,
        id: &str,
        sense: ObjectiveSense,
    ) -> Result<(), AnalysisError> {
        let split = self
            .reactions
            .get(id)
            .cloned()
            .ok_or_else(|| AnalysisError::InvalidRequest(format!("Unknown reaction {}", id)))?;
        self.problem.remove_all_objective_terms();
        self.problem.update_objective_sense(sense);
        self.problem
            .add_objective_term(ObjectiveTerm::new_linear(split.forward, 1.))?;
        self.problem
            .add_objective_term(ObjectiveTerm::new_linear(split.reverse, -1.))?;
        Ok(())
    }

    /// Replace the objective with minimizing the weighted absolute flux
    /// `sum(weight * (forward + reverse))`
    pub fn use_weighted_total_flux_objective<I>(&mut self, weights: I) -> Result<(), AnalysisError>
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        self.problem.remove_all_objective_terms();
        self.problem.update_objective_sense(ObjectiveSense::Minimize);
        for (forward, reverse, weight) in weights {
            self.problem
                .add_objective_term(ObjectiveTerm::new_linear(forward, weight))?;
            self.problem
                .add_objective_term(ObjectiveTerm::new_linear(reverse, weight))?;
        }
        Ok(())
    }

    /// Constrain the model objective to at least `target`, less a relative tolerance of
    /// `max(1, |target|) * tolerance` so the constraint stays feasible for the solver
    pub fn fix_model_objective(&mut self, target: f64, tolerance: f64) -> Result<(), AnalysisError> {
        let lower_bound = target - tolerance * target.abs().max(1.);
        self.problem.add_constraint(Constraint::new_inequality(
            FIXED_OBJECTIVE_ID,
            self.model_objective_terms(),
            lower_bound,
            f64::INFINITY,
        ))?;
        Ok(())
    }

    /// Solution values of the problem variables, in problem order
    pub fn values(&self, solution: &ProblemSolution) -> Option<Vec<f64>> {
        solution
            .variable_values
            .as_ref()
            .map(|values| values.values().copied().collect())
    }

    /// Net flux of every reaction, in model order
    pub fn fluxes(&self, solution: &ProblemSolution) -> IndexMap<String, f64> {
        let values = self.values(solution).unwrap_or_default();
        self.reactions
            .values()
            .map(|split| {
                let forward = values.get(split.forward).copied().unwrap_or(0.);
                let reverse = values.get(split.reverse).copied().unwrap_or(0.);
                (split.id.clone(), forward - reverse)
            })
            .collect()
    }

    /// Shadow price of every metabolite, zero for metabolites without a mass balance row
    pub fn shadow_prices(&self, solution: &ProblemSolution) -> Option<IndexMap<String, f64>> {
        let duals = solution.dual_values.as_ref()?;
        Some(
            self.metabolites
                .iter()
                .map(|id| (id.clone(), duals.get(id).copied().unwrap_or(0.)))
                .collect(),
        )
    }

    /// Reduced cost of every reaction, from the forward and reverse variables
    pub fn reduced_costs(&self, solution: &ProblemSolution) -> Option<IndexMap<String, f64>> {
        let costs = solution.reduced_costs.as_ref()?;
        let variables = self.problem.variables();
        let cost_of = |index: usize| {
            variables
                .get_index(index)
                .and_then(|(id, _)| costs.get(id))
                .copied()
                .unwrap_or(0.)
        };
        Some(
            self.reactions
                .values()
                .map(|split| {
                    (
                        split.id.clone(),
                        cost_of(split.forward) - cost_of(split.reverse),
                    )
                })
                .collect(),
        )
    }
}
