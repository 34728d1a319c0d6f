//! Module providing JSON IO for metabolic models in the cobra JSON layout
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::configuration::Configuration;
use crate::io::gpr_parse::parse_gpr;
use crate::metabolic_model::gene::{Gene, GeneActivity};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::{Model, ModelError};
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
///
/// Fields not listed here (notes, annotations, ...) are ignored when reading.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonModel {
    #[serde(default = "default_model_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub reactions: Vec<JsonReaction>,
    pub metabolites: Vec<JsonMetabolite>,
    #[serde(default)]
    pub genes: Vec<JsonGene>,
    /// Id of a reaction to maximize, overrides the reaction objective coefficients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compartments: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

fn default_model_id() -> String {
    "model".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonMetabolite {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub compartment: Option<String>,
    #[serde(default)]
    pub charge: Option<i32>,
    #[serde(default)]
    pub formula: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonReaction {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metabolites: IndexMap<String, f64>,
    /// Missing bounds take the configured defaults
    #[serde(default)]
    pub lower_bound: Option<f64>,
    #[serde(default)]
    pub upper_bound: Option<f64>,
    #[serde(default)]
    pub gene_reaction_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_coefficient: Option<f64>,
    #[serde(default)]
    pub subsystem: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JsonGene {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}
// endregion JSON Model

// region Conversions
impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        // All genes start as active
        Gene::new(g.id, g.name, GeneActivity::Active)
    }
}

impl From<&Gene> for JsonGene {
    fn from(g: &Gene) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge,
            formula: m.formula,
        }
    }
}

impl From<&Metabolite> for JsonMetabolite {
    fn from(m: &Metabolite) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            compartment: m.compartment.clone(),
            charge: m.charge,
            formula: m.formula.clone(),
        }
    }
}

impl Model {
    /// Read a cobra JSON model file
    pub fn read_json<P: AsRef<Path>>(path: P, config: &Configuration) -> Result<Model, JsonError> {
        let model_str = fs::read_to_string(path.as_ref())
            .map_err(|err| JsonError::UnableToRead(format!("{:?}: {}", path.as_ref(), err)))?;
        Model::from_json_str(&model_str, config)
    }

    /// Parse a cobra JSON model held in a string
    pub fn from_json_str(model_str: &str, config: &Configuration) -> Result<Model, JsonError> {
        let json_model = serde_json::from_str::<JsonModel>(model_str)
            .map_err(|err| JsonError::UnableToParse(err.to_string()))?;
        Model::from_json_model(json_model, config)
    }

    /// Write the model as cobra JSON
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = serde_json::to_string_pretty(&self.to_json_model())?;
        fs::write(path, model_string)?;
        Ok(())
    }

    /// Build a model from deserialized cobra JSON
    ///
    /// Gene rules are parsed with the configured precedence, and genes which only appear
    /// in a rule are added to the gene set. A rule that can't be parsed is kept as text
    /// (expression scoring still sees it) but the reaction gets no parsed GPR.
    /// The finished model is validated before it is returned.
    pub fn from_json_model(json_model: JsonModel, config: &Configuration) -> Result<Self, JsonError> {
        let mut model = Model::new_empty(&json_model.id);
        model.name = json_model.name;
        model.compartments = json_model.compartments;

        for g in json_model.genes {
            if model.genes.contains_key(&g.id) {
                return Err(duplicate("gene", g.id));
            }
            model.add_gene(Gene::from(g));
        }
        for m in json_model.metabolites {
            if model.metabolites.contains_key(&m.id) {
                return Err(duplicate("metabolite", m.id));
            }
            model.add_metabolite(Metabolite::from(m));
        }

        let mut coefficient_objective: IndexMap<String, f64> = IndexMap::new();
        for rxn in json_model.reactions {
            if model.reactions.contains_key(&rxn.id) {
                return Err(duplicate("reaction", rxn.id));
            }
            let rule = rxn
                .gene_reaction_rule
                .filter(|rule| !rule.trim().is_empty());
            let gpr = match rule.as_deref() {
                Some(text) => match parse_gpr(text, config.gpr_policy) {
                    Ok(gpr) => Some(gpr.numbers_as_genes()),
                    Err(err) => {
                        log::warn!("Unable to parse gene rule of reaction {}: {}", rxn.id, err);
                        None
                    }
                },
                None => None,
            };
            if let Some(ref gpr) = gpr {
                for gene_id in gpr.gene_ids() {
                    if !model.genes.contains_key(&gene_id) {
                        model.add_gene(Gene::new(gene_id, None, GeneActivity::Active));
                    }
                }
            }
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gene_reaction_rule(rule)
                .gpr(gpr)
                .lower_bound(rxn.lower_bound.unwrap_or(config.lower_bound))
                .upper_bound(rxn.upper_bound.unwrap_or(config.upper_bound))
                .subsystem(rxn.subsystem)
                .build()?;
            model.add_reaction(new_reaction);
            // Reactions with a nonzero coefficient make up the objective unless one is named
            if let Some(coef) = rxn.objective_coefficient.filter(|c| *c != 0.) {
                coefficient_objective.insert(rxn.id, coef);
            }
        }

        match json_model.objective {
            Some(ref objective) if model.reactions.contains_key(objective) => {
                model.set_objective(objective)?;
            }
            other => {
                if let Some(objective) = other {
                    log::debug!(
                        "Objective reaction {} not in model {}, using objective coefficients",
                        objective,
                        model.id
                    );
                }
                model.objective = coefficient_objective;
            }
        }

        model.validate()?;
        Ok(model)
    }

    /// Convert the model into its cobra JSON form
    pub fn to_json_model(&self) -> JsonModel {
        let reactions = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: Some(r.lower_bound),
                upper_bound: Some(r.upper_bound),
                gene_reaction_rule: r
                    .gene_reaction_rule
                    .clone()
                    .or_else(|| r.gpr.as_ref().map(|gpr| gpr.to_string_id())),
                objective_coefficient: self.objective.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
            })
            .collect();
        JsonModel {
            id: self.id.clone(),
            name: self.name.clone(),
            reactions,
            metabolites: self.metabolites.values().map(JsonMetabolite::from).collect(),
            genes: self.genes.values().map(JsonGene::from).collect(),
            objective: None,
            compartments: self.compartments.clone(),
            version: None,
        }
    }
}

fn duplicate(kind: &'static str, id: String) -> JsonError {
    JsonError::Validation(ModelError::DuplicateId { kind, id })
}

/// Errors raised while reading or writing JSON models
#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Unable to build reaction: {0}")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Model failed validation: {0}")]
    Validation(#[from] ModelError),
    #[error("Serde json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("Unable to write to file: {0}")]
    UnableToWrite(#[from] std::io::Error),
}
// endregion Conversions

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ConfigurationBuilder;
    use std::path::PathBuf;

    fn toy_chain_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("test_data")
            .join("test_models")
            .join("toy_chain.json")
    }

    #[test]
    fn json_metabolite() {
        let data = r#"{
"id":"glc__D_e",
"name":"D-Glucose",
"compartment":"e",
"charge":0,
"formula":"C6H12O6",
"notes":{"original_bigg_ids":["glc_D_e"]},
"annotation":{"kegg.compound":["C00031"],"sbo":"SBO:0000247"}
}"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        assert_eq!(met.id, "glc__D_e");
        assert_eq!(met.name.unwrap(), "D-Glucose");
        assert_eq!(met.compartment.unwrap(), "e");
        assert_eq!(met.charge.unwrap(), 0);
        assert_eq!(met.formula.unwrap(), "C6H12O6");
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
"id":"PFK",
"name":"Phosphofructokinase",
"metabolites":{"adp_c":1.0,"atp_c":-1.0,"f6p_c":-1.0,"fdp_c":1.0,"h_c":1.0},
"lower_bound":0.0,
"upper_bound":1000.0,
"gene_reaction_rule":"b3916 or b1723",
"subsystem":"Glycolysis/Gluconeogenesis"
}"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        assert_eq!(reaction.id, "PFK");
        assert_eq!(reaction.metabolites.len(), 5);
        assert_eq!(reaction.metabolites["atp_c"], -1.0);
        assert_eq!(reaction.lower_bound, Some(0.0));
        assert_eq!(reaction.upper_bound, Some(1000.0));
        assert_eq!(reaction.gene_reaction_rule.unwrap(), "b3916 or b1723");
        assert!(reaction.objective_coefficient.is_none());
    }

    #[test]
    fn read_toy_chain() {
        let model = Model::read_json(toy_chain_path(), &Configuration::default()).unwrap();
        assert_eq!(model.id, "toy_chain");
        assert_eq!(model.reactions.len(), 3);
        assert_eq!(model.metabolites.len(), 2);
        // g3 only appears in a gene rule
        assert!(model.genes.contains_key("g3"));
        assert_eq!(model.objective.get("R2"), Some(&1.0));
        // Missing bounds use the configured defaults
        assert_eq!(model.reactions["EX_A"].lower_bound, -1000.);
        assert!(model.reactions["R1"].gpr.is_some());
    }

    #[test]
    fn defaults_and_named_objective() {
        let data = r#"{
"reactions":[
  {"id":"R1","metabolites":{"A":-1.0},"objective_coefficient":1.0},
  {"id":"R2","metabolites":{"A":1.0},"gene_reaction_rule":"  "}
],
"metabolites":[{"id":"A"}],
"objective":"R2"
}"#;
        let config = ConfigurationBuilder::default()
            .lower_bound(-50.)
            .upper_bound(50.)
            .build()
            .unwrap();
        let model = Model::from_json_str(data, &config).unwrap();
        assert_eq!(model.id, "model");
        assert_eq!(model.reactions["R1"].upper_bound, 50.);
        assert!(model.reactions["R2"].gene_reaction_rule.is_none());
        assert_eq!(model.objective.len(), 1);
        assert_eq!(model.objective.get("R2"), Some(&1.0));
    }

    #[test]
    fn unparseable_rule_is_kept_as_text() {
        let data = r#"{
"reactions":[{"id":"R1","metabolites":{},"gene_reaction_rule":"(a and b"}],
"metabolites":[]
}"#;
        let model = Model::from_json_str(data, &Configuration::default()).unwrap();
        let rxn = &model.reactions["R1"];
        assert!(rxn.gpr.is_none());
        assert_eq!(rxn.gene_reaction_rule.as_deref(), Some("(a and b"));
    }

    #[test]
    fn validation_errors() {
        let undeclared = r#"{"reactions":[{"id":"R1","metabolites":{"X":-1.0}}],"metabolites":[]}"#;
        assert!(matches!(
            Model::from_json_str(undeclared, &Configuration::default()),
            Err(JsonError::Validation(ModelError::UndeclaredMetabolite { .. }))
        ));
        let bad_bounds = r#"{"reactions":[{"id":"R1","metabolites":{},"lower_bound":5,"upper_bound":1}],"metabolites":[]}"#;
        assert!(matches!(
            Model::from_json_str(bad_bounds, &Configuration::default()),
            Err(JsonError::Validation(ModelError::InvalidBounds { .. }))
        ));
        let duplicate = r#"{"reactions":[{"id":"R1"},{"id":"R1"}],"metabolites":[]}"#;
        assert!(matches!(
            Model::from_json_str(duplicate, &Configuration::default()),
            Err(JsonError::Validation(ModelError::DuplicateId { kind: "reaction", .. }))
        ));
        assert!(matches!(
            Model::from_json_str("{", &Configuration::default()),
            Err(JsonError::UnableToParse(_))
        ));
    }

    #[test]
    fn write_then_read() {
        let config = Configuration::default();
        let model = Model::read_json(toy_chain_path(), &config).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("written.json");
        model.write_json(&path).unwrap();
        let reread = Model::read_json(&path, &config).unwrap();
        assert_eq!(reread.reactions.len(), model.reactions.len());
        assert_eq!(reread.objective, model.objective);
        assert_eq!(
            reread.reactions["R1"].gene_reaction_rule,
            model.reactions["R1"].gene_reaction_rule
        );
    }

}
