//! Deserialized analysis requests
//!
//! Each request carries its own model data, so every analysis starts from a freshly built
//! [`crate::metabolic_model::model::Model`].
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::io::json::JsonModel;
use crate::metabolic_model::constraints::ConstraintOverrides;
use crate::metabolic_model::gpr::ExpressionMap;

/// Request for FBA or pFBA
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub model: JsonModel,
    #[serde(default)]
    pub constraints: Option<ConstraintOverrides>,
    #[serde(default)]
    pub knockouts: Option<Vec<String>>,
    /// Reaction to maximize instead of the model's objective
    #[serde(default)]
    pub objective: Option<String>,
}

/// Request for flux variability analysis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FvaRequest {
    pub model: JsonModel,
    #[serde(default)]
    pub constraints: Option<ConstraintOverrides>,
    #[serde(default)]
    pub knockouts: Option<Vec<String>>,
    /// Fraction of the optimum the objective must keep, in [0, 1]
    #[serde(default = "default_fraction_of_optimum")]
    pub fraction_of_optimum: f64,
    /// Reactions to analyze, all reactions if missing
    #[serde(default)]
    pub reactions: Option<Vec<String>>,
}

/// Expression integration methods
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OmicsMethod {
    Gimme,
    Imat,
    #[default]
    Eflux,
}

impl OmicsMethod {
    pub fn label(&self) -> &'static str {
        match self {
            OmicsMethod::Gimme => "gimme",
            OmicsMethod::Imat => "imat",
            OmicsMethod::Eflux => "eflux",
        }
    }
}

/// Request for GIMME, iMAT or E-Flux
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OmicsRequest {
    pub model: JsonModel,
    /// Gene id to expression value
    pub expression: ExpressionMap,
    #[serde(default)]
    pub method: OmicsMethod,
    /// GIMME expression threshold
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// iMAT score at or above which a reaction counts as highly expressed
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
    /// iMAT score at or below which a reaction counts as lowly expressed
    #[serde(default = "default_low_threshold")]
    pub low_threshold: f64,
    /// GIMME fraction of the optimum the objective must keep
    #[serde(default = "default_required_fraction")]
    pub required_fraction: f64,
    #[serde(default)]
    pub constraints: Option<ConstraintOverrides>,
    #[serde(default)]
    pub knockouts: Option<Vec<String>>,
}

/// Request for MOMA
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MomaRequest {
    pub model: JsonModel,
    #[serde(default)]
    pub constraints: Option<ConstraintOverrides>,
    #[serde(default)]
    pub knockouts: Option<Vec<String>>,
    /// Wild type fluxes, solved with FBA on the unperturbed model if missing
    #[serde(default)]
    pub reference_fluxes: Option<IndexMap<String, f64>>,
    /// Minimize absolute instead of squared deviation
    #[serde(default)]
    pub linear: bool,
}

fn default_fraction_of_optimum() -> f64 {
    0.9
}

fn default_threshold() -> f64 {
    0.25
}

fn default_high_threshold() -> f64 {
    0.75
}

fn default_low_threshold() -> f64 {
    0.25
}

fn default_required_fraction() -> f64 {
    0.9
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{"reactions":[{"id":"R1","metabolites":{}}],"metabolites":[]}"#;

    #[test]
    fn omics_defaults() {
        let data = format!(r#"{{"model":{},"expression":{{"g1":0.5}}}}"#, MODEL);
        let request: OmicsRequest = serde_json::from_str(&data).unwrap();
        assert_eq!(request.method, OmicsMethod::Eflux);
        assert_eq!(request.threshold, 0.25);
        assert_eq!(request.high_threshold, 0.75);
        assert_eq!(request.low_threshold, 0.25);
        assert_eq!(request.required_fraction, 0.9);
        assert!(request.constraints.is_none());
    }

    #[test]
    fn fva_and_moma() {
        let data = format!(
            r#"{{"model":{},"constraints":{{"R1":{{"ub":5}}}},"knockouts":null}}"#,
            MODEL
        );
        let request: FvaRequest = serde_json::from_str(&data).unwrap();
        assert_eq!(request.fraction_of_optimum, 0.9);
        assert_eq!(request.constraints.unwrap()["R1"].ub, Some(5.));
        assert!(request.knockouts.is_none());

        let data = format!(r#"{{"model":{},"linear":true}}"#, MODEL);
        let request: MomaRequest = serde_json::from_str(&data).unwrap();
        assert!(request.linear);
        assert!(request.reference_fluxes.is_none());
    }

    #[test]
    fn method_names() {
        let method: OmicsMethod = serde_json::from_str(r#""gimme""#).unwrap();
        assert_eq!(method, OmicsMethod::Gimme);
        assert_eq!(method.label(), "gimme");
        assert!(serde_json::from_str::<OmicsMethod>(r#""made""#).is_err());
    }
}
