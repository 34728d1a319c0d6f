//! Applying request supplied bound overrides and gene knockouts to a model
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::metabolic_model::model::Model;

/// New bounds for a single reaction, either side may be left out
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ub: Option<f64>,
}

/// Map of reaction ids to bound overrides
pub type ConstraintOverrides = IndexMap<String, BoundOverride>;

impl Model {
    /// Apply bound overrides and gene knockouts in place
    ///
    /// Reaction and gene ids which aren't part of the model are skipped, so a partially
    /// matching request still applies everything it can. Knocking out a gene only flags it,
    /// see [`crate::configuration::KnockoutPolicy`].
    pub fn apply_constraints(
        &mut self,
        overrides: &ConstraintOverrides,
        knockouts: &[String],
    ) -> &mut Self {
        for (rxn_id, bounds) in overrides {
            match self.reactions.get_mut(rxn_id) {
                Some(rxn) => {
                    if let Some(lb) = bounds.lb {
                        rxn.lower_bound = lb;
                    }
                    if let Some(ub) = bounds.ub {
                        rxn.upper_bound = ub;
                    }
                    if rxn.lower_bound > rxn.upper_bound {
                        log::warn!(
                            "Constraint on {} leaves lower bound {} above upper bound {}",
                            rxn_id,
                            rxn.lower_bound,
                            rxn.upper_bound
                        );
                    }
                }
                None => log::debug!("Ignoring constraint on unknown reaction {}", rxn_id),
            }
        }
        for gene_id in knockouts {
            match self.genes.get_mut(gene_id) {
                Some(gene) => gene.knock_out(),
                None => log::debug!("Ignoring knockout of unknown gene {}", gene_id),
            }
        }
        self
    }
}
