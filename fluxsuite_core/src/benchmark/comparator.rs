//! Pairwise comparison of solve results and summary statistics
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::benchmark::runner::SolveResult;
use crate::benchmark::{timestamp, FLUX_TOLERANCE, OBJECTIVE_TOLERANCE};

/// Agreement between two results for the same model and method
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub model_id: String,
    pub method: String,
    pub solver_a: String,
    pub solver_b: String,
    pub status_a: String,
    pub status_b: String,
    pub time_a_ms: f64,
    pub time_b_ms: f64,
    pub objective_a: Option<f64>,
    pub objective_b: Option<f64>,
    pub objective_diff: Option<f64>,
    pub objective_rel_diff: Option<f64>,
    pub flux_l2_norm: Option<f64>,
    pub flux_max_diff: Option<f64>,
    pub flux_max_diff_reaction: Option<String>,
    pub passed: bool,
    pub notes: Vec<String>,
}

/// Compare two results
///
/// Both must be optimal to pass. Objectives missing from an optimal result count as
/// zero. Fluxes are compared over the reactions both results report, an FVA range
/// differs by the larger of its endpoint differences.
pub fn compare(a: &SolveResult, b: &SolveResult) -> ComparisonResult {
    let mut result = ComparisonResult {
        model_id: a.model_id.clone(),
        method: a.method.clone(),
        solver_a: a.solver.clone(),
        solver_b: b.solver.clone(),
        status_a: a.status.clone(),
        status_b: b.status.clone(),
        time_a_ms: a.solve_time_ms,
        time_b_ms: b.solve_time_ms,
        objective_a: a.objective_value,
        objective_b: b.objective_value,
        objective_diff: None,
        objective_rel_diff: None,
        flux_l2_norm: None,
        flux_max_diff: None,
        flux_max_diff_reaction: None,
        passed: false,
        notes: Vec::new(),
    };
    if !a.is_optimal() || !b.is_optimal() {
        result
            .notes
            .push(format!("Non-optimal status: {}/{}", a.status, b.status));
        return result;
    }

    let obj_a = a.objective_value.unwrap_or(0.);
    let obj_b = b.objective_value.unwrap_or(0.);
    let objective_diff = (obj_a - obj_b).abs();
    result.objective_diff = Some(objective_diff);
    result.objective_rel_diff = Some(objective_diff / obj_a.abs().max(obj_b.abs()).max(1e-10));

    if let (Some(fluxes_a), Some(fluxes_b)) = (&a.fluxes, &b.fluxes) {
        let mut sum_of_squares = 0.;
        let mut largest: Option<(&str, f64)> = None;
        for (id, value_a) in fluxes_a {
            let value_b = match fluxes_b.get(id) {
                Some(value) => value,
                None => continue,
            };
            let (min_a, max_a) = value_a.endpoints();
            let (min_b, max_b) = value_b.endpoints();
            let diff = (min_a - min_b).abs().max((max_a - max_b).abs());
            sum_of_squares += diff * diff;
            if largest.map_or(true, |(_, current)| diff > current) {
                largest = Some((id, diff));
            }
        }
        result.flux_l2_norm = Some(sum_of_squares.sqrt());
        if let Some((id, diff)) = largest {
            result.flux_max_diff = Some(diff);
            result.flux_max_diff_reaction = Some(id.to_string());
        }
    }

    result.passed = objective_diff < OBJECTIVE_TOLERANCE;
    if !result.passed {
        result.notes.push(format!(
            "Objective difference {:.2e} exceeds tolerance {:.0e}",
            objective_diff, OBJECTIVE_TOLERANCE
        ));
    } else if let (Some(diff), Some(id)) = (result.flux_max_diff, &result.flux_max_diff_reaction) {
        if diff > FLUX_TOLERANCE {
            let note = format!("Large flux difference at {}: {:.2e}", id, diff);
            result.notes.push(note);
        }
    }
    result
}

/// Compare the results two solvers produced for the same (model, method) pairs
///
/// Pairs only one side has are left out. Output is sorted by model then method.
pub fn compare_result_sets(
    results_a: &[SolveResult],
    results_b: &[SolveResult],
) -> Vec<ComparisonResult> {
    let index = |results: &[SolveResult]| -> BTreeMap<(String, String), usize> {
        results
            .iter()
            .enumerate()
            .map(|(i, r)| ((r.model_id.clone(), r.method.clone()), i))
            .collect()
    };
    let index_a = index(results_a);
    let index_b = index(results_b);
    index_a
        .iter()
        .filter_map(|(key, i)| index_b.get(key).map(|j| compare(&results_a[*i], &results_b[*j])))
        .collect()
}

/// Mean, population standard deviation and extremes of a set of values
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub mean: f64,
    pub std: f64,
    pub max: f64,
    pub min: f64,
}

impl Statistics {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Statistics {
            mean,
            std: variance.sqrt(),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
        })
    }
}

/// Aggregate of many comparisons
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total_comparisons: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    pub objective_diff: Option<Statistics>,
    pub flux_l2_norm: Option<Statistics>,
    pub timestamp: String,
}

pub fn summarize(comparisons: &[ComparisonResult]) -> ComparisonSummary {
    let total = comparisons.len();
    let passed = comparisons.iter().filter(|c| c.passed).count();
    let objective_diffs: Vec<f64> = comparisons.iter().filter_map(|c| c.objective_diff).collect();
    let flux_norms: Vec<f64> = comparisons.iter().filter_map(|c| c.flux_l2_norm).collect();
    ComparisonSummary {
        total_comparisons: total,
        passed,
        failed: total - passed,
        pass_rate: if total > 0 {
            passed as f64 / total as f64
        } else {
            0.
        },
        objective_diff: Statistics::from_values(&objective_diffs),
        flux_l2_norm: Statistics::from_values(&flux_norms),
        timestamp: timestamp(),
    }
}
