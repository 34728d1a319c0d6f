//! This module provides the Model struct for representing an entire metabolic model
use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::metabolic_model::gene::{Gene, GeneActivity};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug)]
pub struct Model {
    /// Id associated with the Model
    pub id: String,
    /// Human readable name of the model
    pub name: Option<String>,
    /// Map of reaction ids to Reaction Objects, in model order
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Gene Objects
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolite Objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
}

impl Model {
    pub fn new_empty(id: &str) -> Self {
        Model {
            id: id.to_string(),
            name: None,
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            compartments: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Examples
    /// ```rust
    /// use fluxsuite_core::metabolic_model::model::Model;
    /// use fluxsuite_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty("toy");
    /// let new_reaction = ReactionBuilder::default().id("new_reaction".to_string()).build().unwrap();
    /// model.add_reaction(new_reaction);
    /// assert_eq!(model.reactions.len(), 1);
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a gene to the model
    pub fn add_gene(&mut self, gene: Gene) {
        let id = gene.id.clone();
        self.genes.insert(id, gene);
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Replace the objective with maximizing a single reaction
    pub fn set_objective(&mut self, reaction_id: &str) -> Result<(), ModelError> {
        if !self.reactions.contains_key(reaction_id) {
            return Err(ModelError::UnknownObjectiveReaction(reaction_id.to_string()));
        }
        self.objective.clear();
        self.objective.insert(reaction_id.to_string(), 1.0);
        Ok(())
    }

    /// Check the model invariants
    ///
    /// Every metabolite in a reaction's stoichiometry must be declared, every reaction
    /// needs lower_bound <= upper_bound, and every objective reaction must exist.
    pub fn validate(&self) -> Result<(), ModelError> {
        for (rxn_id, rxn) in &self.reactions {
            if rxn.lower_bound.is_nan() || rxn.upper_bound.is_nan() {
                return Err(ModelError::InvalidBounds {
                    reaction: rxn_id.clone(),
                    lower_bound: rxn.lower_bound,
                    upper_bound: rxn.upper_bound,
                });
            }
            if rxn.lower_bound > rxn.upper_bound {
                return Err(ModelError::InvalidBounds {
                    reaction: rxn_id.clone(),
                    lower_bound: rxn.lower_bound,
                    upper_bound: rxn.upper_bound,
                });
            }
            for met_id in rxn.metabolites.keys() {
                if !self.metabolites.contains_key(met_id) {
                    return Err(ModelError::UndeclaredMetabolite {
                        reaction: rxn_id.clone(),
                        metabolite: met_id.clone(),
                    });
                }
            }
        }
        for rxn_id in self.objective.keys() {
            if !self.reactions.contains_key(rxn_id) {
                return Err(ModelError::UnknownObjectiveReaction(rxn_id.clone()));
            }
        }
        Ok(())
    }

    /// Ids of reactions whose gene rule evaluates to inactive given the current gene activity
    pub fn inactive_reactions(&self) -> Vec<String> {
        self.reactions
            .values()
            .filter(|rxn| {
                rxn.gpr
                    .as_ref()
                    .map(|gpr| gpr.eval_activity(&self.genes) == GeneActivity::Inactive)
                    .unwrap_or(false)
            })
            .map(|rxn| rxn.id.clone())
            .collect()
    }

    /// Ids of the genes currently flagged as knocked out
    pub fn knocked_out_genes(&self) -> Vec<String> {
        self.genes
            .values()
            .filter(|g| g.is_knocked_out())
            .map(|g| g.id.clone())
            .collect()
    }

    /// Summary statistics about the model
    pub fn statistics(&self) -> ModelStatistics {
        let compartments: BTreeSet<String> = self
            .metabolites
            .values()
            .filter_map(|m| m.compartment.clone())
            .collect();
        let subsystems: BTreeSet<String> = self
            .reactions
            .values()
            .filter_map(|r| r.subsystem.clone())
            .filter(|s| !s.is_empty())
            .collect();
        ModelStatistics {
            id: self.id.clone(),
            name: self.name.clone(),
            num_reactions: self.reactions.len(),
            num_metabolites: self.metabolites.len(),
            num_genes: self.genes.len(),
            objective: self.objective_expression(),
            compartments: compartments.into_iter().collect(),
            subsystems: subsystems.into_iter().collect(),
        }
    }

    /// String form of the objective, e.g. `1*BIOMASS + 0.5*ATPM`
    pub fn objective_expression(&self) -> Option<String> {
        if self.objective.is_empty() {
            return None;
        }
        Some(
            self.objective
                .iter()
                .map(|(id, coef)| format!("{}*{}", coef, id))
                .collect::<Vec<_>>()
                .join(" + "),
        )
    }
}

/// Model information returned by [`Model::statistics`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelStatistics {
    pub id: String,
    pub name: Option<String>,
    pub num_reactions: usize,
    pub num_metabolites: usize,
    pub num_genes: usize,
    pub objective: Option<String>,
    pub compartments: Vec<String>,
    pub subsystems: Vec<String>,
}

/// Errors raised when a model fails validation
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Reaction {reaction} references undeclared metabolite {metabolite}")]
    UndeclaredMetabolite { reaction: String, metabolite: String },
    #[error("Reaction {reaction} has invalid bounds [{lower_bound}, {upper_bound}]")]
    InvalidBounds {
        reaction: String,
        lower_bound: f64,
        upper_bound: f64,
    },
    #[error("Duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },
    #[error("Objective references unknown reaction {0}")]
    UnknownObjectiveReaction(String),
}
