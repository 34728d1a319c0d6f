//! Flux variability analysis
use indexmap::IndexMap;

use crate::analysis::formulation::{fraction_of_optimum, FluxProblem};
use crate::analysis::{AnalysisError, FluxAnalysis, FluxRange, FvaSolution};
use crate::metabolic_model::model::Model;
use crate::optimize::objective::ObjectiveSense;

impl FluxAnalysis {
    /// Find the range each reaction's flux can take while the model objective stays
    /// at or above `fraction_of_optimum` of its optimum
    ///
    /// # Parameters
    /// - `model`: Model to analyse
    /// - `fraction_of_optimum`: Fraction of the optimum to keep, between 0 and 1
    /// - `reactions`: Reactions to report, all of them if `None`. Ids not in the model
    ///   are skipped.
    ///
    /// The objective value of the result is the unconstrained optimum.
    pub fn fva(
        &self,
        model: &Model,
        fraction_of_optimum: f64,
        reactions: Option<&[String]>,
    ) -> FvaSolution {
        self.guarded_fva(|| self.variability(model, fraction_of_optimum, reactions))
    }

    fn variability(
        &self,
        model: &Model,
        fraction: f64,
        reactions: Option<&[String]>,
    ) -> Result<FvaSolution, AnalysisError> {
        if !(0. ..=1.).contains(&fraction) {
            return Err(AnalysisError::InvalidRequest(format!(
                "fraction_of_optimum must be between 0 and 1, got {}",
                fraction
            )));
        }
        let mut flux_problem = FluxProblem::build(model, self.config())?;
        let optimum = self.solve_flux_problem(&flux_problem, false)?;
        let optimum_value = match optimum.objective_value {
            Some(value) if optimum.status.is_optimal() => value,
            _ => return Ok(FvaSolution::from_status(optimum.status)),
        };
        if flux_problem.has_model_objective() {
            flux_problem.fix_model_objective(
                fraction_of_optimum(optimum_value, fraction),
                self.config().tolerance,
            )?;
        }

        let targets: Vec<String> = match reactions {
            Some(ids) => ids
                .iter()
                .filter(|id| {
                    let known = flux_problem.reaction(id).is_some();
                    if !known {
                        log::warn!("Skipping unknown reaction {} in FVA", id);
                    }
                    known
                })
                .cloned()
                .collect(),
            None => flux_problem.reactions().map(|split| split.id.clone()).collect(),
        };

        let mut ranges = IndexMap::with_capacity(targets.len());
        for id in targets {
            let mut extremes = [0.; 2];
            for (slot, sense) in [ObjectiveSense::Minimize, ObjectiveSense::Maximize]
                .into_iter()
                .enumerate()
            {
                flux_problem.use_reaction_objective(&id, sense)?;
                let solution = self.solve_flux_problem(&flux_problem, false)?;
                if !solution.status.is_optimal() {
                    log::debug!("FVA stopped at reaction {}: {:?}", id, solution.status);
                    return Ok(FvaSolution::from_status(solution.status));
                }
                extremes[slot] = solution.fluxes.get(&id).copied().unwrap_or(0.);
            }
            let [mut min, mut max] = extremes;
            if min > max {
                log::warn!(
                    "{} reported min {} above max {} for {}, swapping",
                    self.solver_name(),
                    min,
                    max,
                    id
                );
                std::mem::swap(&mut min, &mut max);
            }
            ranges.insert(id, FluxRange { min, max });
        }

        let mut solution = FvaSolution::from_status(optimum.status);
        solution.objective_value = Some(optimum_value);
        solution.ranges = ranges;
        Ok(solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests_common::{branch_model, chain_model, engines};
    use crate::analysis::SolutionStatus;
    use approx::assert_abs_diff_eq;

    #[test]
    fn range_at_ninety_percent() {
        let targets = vec!["R1".to_string()];
        for engine in engines() {
            let solution = engine.fva(&chain_model(), 0.9, Some(&targets));
            assert_eq!(solution.status, SolutionStatus::Optimal, "{}", engine.solver_name());
            assert_abs_diff_eq!(solution.objective_value.unwrap(), 10., epsilon = 1e-5);
            let range = solution.ranges["R1"];
            assert_abs_diff_eq!(range.min, 9., epsilon = 1e-5);
            assert_abs_diff_eq!(range.max, 10., epsilon = 1e-5);
            assert_eq!(solution.ranges.len(), 1);
        }
    }

    #[test]
    fn unknown_reactions_are_skipped() {
        let targets = vec!["R3".to_string(), "missing".to_string()];
        let solution = engines()[0].fva(&branch_model(), 0.9, Some(&targets));
        assert!(solution.status.is_optimal());
        assert_eq!(solution.ranges.len(), 1);
        let range = solution.ranges["R3"];
        assert_abs_diff_eq!(range.min, 0., epsilon = 1e-5);
        assert_abs_diff_eq!(range.max, 1., epsilon = 1e-5);
    }

    #[test]
    fn all_reactions_by_default() {
        let model = chain_model();
        for engine in engines() {
            let solution = engine.fva(&model, 0.5, None);
            assert_eq!(solution.ranges.len(), 2);
            for (id, range) in &solution.ranges {
                let rxn = &model.reactions[id];
                assert!(range.min <= range.max, "{}", id);
                assert!(rxn.lower_bound - 1e-6 <= range.min, "{} below its lower bound", id);
                assert!(range.max <= rxn.upper_bound + 1e-6, "{} above its upper bound", id);
            }
        }
    }

    #[test]
    fn rejects_bad_fraction() {
        let solution = engines()[0].fva(&chain_model(), 1.5, None);
        assert!(matches!(solution.status, SolutionStatus::Error(_)));
        assert!(solution.ranges.is_empty());
    }

    #[test]
    fn negative_optimum_target() {
        assert_abs_diff_eq!(fraction_of_optimum(10., 0.9), 9.);
        assert_abs_diff_eq!(fraction_of_optimum(-10., 0.9), -11.);
    }
}
