//! Minimization of metabolic adjustment
//!
//! Finds the flux distribution of a perturbed model closest to a reference distribution,
//! either in squared euclidean distance or, for the linear variant, in absolute distance.
//! Each reaction with a reference value gets deviation variables tied to its net flux by
//! an equality constraint.
use indexmap::IndexMap;

use crate::analysis::formulation::FluxProblem;
use crate::analysis::{AnalysisError, FluxAnalysis, FluxSolution};
use crate::metabolic_model::constraints::ConstraintOverrides;
use crate::metabolic_model::model::Model;
use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::{ObjectiveSense, ObjectiveTerm};
use crate::optimize::variable::VariableType;

impl FluxAnalysis {
    /// Apply `constraints` and `knockouts` to a copy of `model` and find the flux
    /// distribution closest to `reference`
    ///
    /// Without a reference, the FBA solution of the unperturbed model is used. The
    /// quadratic variant needs a solver that handles quadratic objectives.
    pub fn moma(
        &self,
        model: &Model,
        constraints: &ConstraintOverrides,
        knockouts: &[String],
        reference: Option<&IndexMap<String, f64>>,
        linear: bool,
    ) -> FluxSolution {
        let method = if linear { "linear_moma" } else { "moma" };
        self.guarded(method, || {
            self.adjustment(model, constraints, knockouts, reference, linear)
        })
    }

    fn adjustment(
        &self,
        model: &Model,
        constraints: &ConstraintOverrides,
        knockouts: &[String],
        reference: Option<&IndexMap<String, f64>>,
        linear: bool,
    ) -> Result<FluxSolution, AnalysisError> {
        if !linear && !self.solver().quadratic_objective_capable() {
            return Err(AnalysisError::MissingCapability {
                method: "moma",
                capability: "quadratic objectives",
                solver: self.solver_name(),
            });
        }
        let reference = match reference {
            Some(fluxes) => fluxes.clone(),
            None => {
                let wild_type = self.optimize(model)?;
                if !wild_type.status.is_optimal() {
                    return Err(AnalysisError::ReferenceSolve(
                        wild_type.status.label().to_string(),
                    ));
                }
                wild_type.fluxes
            }
        };

        let mut perturbed = model.clone();
        perturbed.apply_constraints(constraints, knockouts);
        let mut flux_problem = FluxProblem::build(&perturbed, self.config())?;
        flux_problem.problem.remove_all_objective_terms();
        flux_problem
            .problem
            .update_objective_sense(ObjectiveSense::Minimize);

        let splits: Vec<_> = flux_problem.reactions().cloned().collect();
        for split in splits {
            let target = match reference.get(&split.id) {
                Some(value) => *value,
                None => continue,
            };
            let mut terms = vec![
                ConstraintTerm::new(split.forward, 1.),
                ConstraintTerm::new(split.reverse, -1.),
            ];
            let problem = &mut flux_problem.problem;
            if linear {
                let above = problem.add_new_variable(
                    &format!("moma_above_{}", split.id),
                    None,
                    VariableType::Continuous,
                    0.,
                    f64::INFINITY,
                )?;
                let below = problem.add_new_variable(
                    &format!("moma_below_{}", split.id),
                    None,
                    VariableType::Continuous,
                    0.,
                    f64::INFINITY,
                )?;
                terms.push(ConstraintTerm::new(above, -1.));
                terms.push(ConstraintTerm::new(below, 1.));
                problem.add_objective_term(ObjectiveTerm::new_linear(above, 1.))?;
                problem.add_objective_term(ObjectiveTerm::new_linear(below, 1.))?;
            } else {
                let deviation = problem.add_new_variable(
                    &format!("moma_deviation_{}", split.id),
                    None,
                    VariableType::Continuous,
                    f64::NEG_INFINITY,
                    f64::INFINITY,
                )?;
                terms.push(ConstraintTerm::new(deviation, -1.));
                problem.add_objective_term(ObjectiveTerm::new_quadratic(
                    deviation, deviation, 1.,
                ))?;
            }
            problem.add_constraint(Constraint::new_equality(
                &format!("moma_distance_{}", split.id),
                terms,
                target,
            ))?;
        }
        self.solve_flux_problem(&flux_problem, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests_common::{branch_model, engines};
    use crate::analysis::SolutionStatus;
    use crate::metabolic_model::constraints::BoundOverride;
    use approx::assert_abs_diff_eq;

    fn throttle_r2() -> ConstraintOverrides {
        let mut overrides = IndexMap::new();
        overrides.insert(
            "R2".to_string(),
            BoundOverride {
                lb: None,
                ub: Some(5.),
            },
        );
        overrides
    }

    #[test]
    fn quadratic_distance() {
        let engine = FluxAnalysis::new(Default::default()).unwrap();
        let solution = engine.moma(&branch_model(), &throttle_r2(), &[], None, false);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.method, "moma");
        assert_abs_diff_eq!(solution.fluxes["R1"], 7.5, epsilon = 1e-4);
        assert_abs_diff_eq!(solution.fluxes["R2"], 5., epsilon = 1e-4);
        assert_abs_diff_eq!(solution.fluxes["R3"], 2.5, epsilon = 1e-4);
        assert_abs_diff_eq!(solution.objective_value.unwrap(), 37.5, epsilon = 1e-3);
    }

    #[test]
    fn linear_distance() {
        for engine in engines() {
            let solution = engine.moma(&branch_model(), &throttle_r2(), &[], None, true);
            assert_eq!(solution.status, SolutionStatus::Optimal, "{}", engine.solver_name());
            assert_eq!(solution.method, "linear_moma");
            assert_abs_diff_eq!(solution.objective_value.unwrap(), 10., epsilon = 1e-4);
            assert_abs_diff_eq!(solution.fluxes["R2"], 5., epsilon = 1e-4);
        }
    }

    #[test]
    fn explicit_reference() {
        let mut reference = IndexMap::new();
        reference.insert("R1".to_string(), 4.);
        reference.insert("R2".to_string(), 4.);
        reference.insert("R3".to_string(), 0.);
        let engine = FluxAnalysis::new(Default::default()).unwrap();
        let solution = engine.moma(&branch_model(), &IndexMap::new(), &[], Some(&reference), false);
        assert_abs_diff_eq!(solution.fluxes["R2"], 4., epsilon = 1e-4);
        assert_abs_diff_eq!(solution.objective_value.unwrap(), 0., epsilon = 1e-4);
    }

    #[cfg(feature = "minilp")]
    #[test]
    fn quadratic_needs_capable_solver() {
        let engine = crate::analysis::tests_common::microlp_engine();
        let solution = engine.moma(&branch_model(), &throttle_r2(), &[], None, false);
        let message = solution.status.error_message().unwrap();
        assert!(message.contains("quadratic"));
    }
}
