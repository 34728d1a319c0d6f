//! Configuration values threaded through model building, formulation and solving
use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Settings shared by the analysis engine and the benchmark harness
///
/// Each engine owns its own copy, so runs against different solver backends
/// can proceed side by side without touching any global state.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(default)]
#[serde(default)]
pub struct Configuration {
    /// Lower flux bound given to reactions which don't declare one
    pub lower_bound: f64,
    /// Upper flux bound given to reactions which don't declare one
    pub upper_bound: f64,
    /// Relative slack used when an optimum is fixed as a constraint
    pub tolerance: f64,
    /// Optimizer backend used by the engine
    pub solver: SolverKind,
    /// Wall clock limit for a single solve, in seconds
    ///
    /// microlp has no limit of its own, so with a limit set each of its solves runs on
    /// a separate thread working on a copy of the problem. A solve that times out is
    /// reported as halted, but its thread can't be stopped and keeps running until the
    /// solve finishes. `None` solves inline.
    pub time_limit: Option<f64>,
    /// Number of worker threads the benchmark runner may use
    pub processes: u32,
    /// Operator precedence used when scoring gene rules against expression data
    pub gpr_policy: GprPrecedence,
    /// How gene knockouts affect the formulated problem
    pub knockout_policy: KnockoutPolicy,
    /// Minimum flux for a highly expressed reaction to count as active in iMAT
    pub imat_epsilon: f64,
    /// Big-M bound used to switch off lowly expressed reactions in iMAT
    pub imat_big_m: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            solver: SolverKind::Clarabel,
            time_limit: Some(300.),
            processes: 1,
            gpr_policy: GprPrecedence::SplitOrFirst,
            knockout_policy: KnockoutPolicy::FlagOnly,
            imat_epsilon: 1e-3,
            imat_big_m: 1000.,
        }
    }
}

impl Configuration {
    /// Read a configuration from a JSON file, falling back to the defaults if the file
    /// is missing or can't be parsed. Missing fields take their default values.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse configuration: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Configuration file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Copy of this configuration using a different solver backend
    pub fn with_solver(&self, solver: SolverKind) -> Self {
        Configuration {
            solver,
            ..self.clone()
        }
    }
}

/// Enum used to specify which solver to use
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Use the Clarabel interior point solver (LP and QP, no integer variables)
    Clarabel,
    /// Use the microlp simplex solver (LP and MILP, no quadratic objectives),
    /// requires the minilp feature to be enabled
    Microlp,
}

impl SolverKind {
    /// Label used for this solver in results and reports
    pub fn label(&self) -> &'static str {
        match self {
            SolverKind::Clarabel => "clarabel",
            SolverKind::Microlp => "microlp",
        }
    }
}

/// Operator precedence used by the expression scoring of gene rules
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GprPrecedence {
    /// Within each parenthesised group split on `or` first, then on `and`
    SplitOrFirst,
    /// Apply operators left to right with equal precedence
    LeftToRight,
}

/// Effect of a gene knockout on the optimization problem
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnockoutPolicy {
    /// Knocked out genes are only flagged on the model
    FlagOnly,
    /// Reactions whose gene rule is inactive after the knockout are fixed to zero flux
    ZeroBounds,
}
