//! This module provides a struct for representing reactions
use crate::metabolic_model::gpr::Gpr;
use crate::utils::hashing::hex_digest;
use derive_builder::Builder;
use indexmap::IndexMap;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule, as written in the model
    #[builder(default = "None")]
    pub gene_reaction_rule: Option<String>,
    /// Parsed Gene Protein Reaction rule, used to determine if reaction is active
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "-1000.")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "1000.")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
}

impl Reaction {
    /// Determine the id to be associated with the forward reaction in the optimization problem
    ///
    /// # Note:
    /// The forward id is "{reaction_id}_forward"
    pub fn get_forward_id(&self) -> String {
        format!("{}_forward", &self.id)
    }

    /// Determine the id to be associated with the reverse reaction in the optimization problem
    ///
    /// # Note:
    /// The reverse id is "{reaction_id}_reverse_{hexidecimal hash of reaction_id}"
    pub fn get_reverse_id(&self) -> String {
        format!("{}_reverse_{}", &self.id, hex_digest(self.id.as_str()))
    }

    /// Whether the reaction has a non-blank gene rule
    pub fn has_gene_rule(&self) -> bool {
        self.gene_reaction_rule
            .as_deref()
            .map(|rule| !rule.trim().is_empty())
            .unwrap_or(false)
    }

    /// Determine the upper bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_upper_bound(&self) -> f64 {
        if self.upper_bound > 0f64 {
            self.upper_bound
        } else {
            0f64
        }
    }

    /// Determine the lower bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_lower_bound(&self) -> f64 {
        if self.lower_bound > 0f64 {
            self.lower_bound
        } else {
            0f64
        }
    }

    /// Determine the upper bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_upper_bound(&self) -> f64 {
        if self.lower_bound < 0f64 {
            -self.lower_bound
        } else {
            0f64
        }
    }

    /// Determine the lower bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_lower_bound(&self) -> f64 {
        if self.upper_bound < 0f64 {
            -self.upper_bound
        } else {
            0f64
        }
    }

    /// Multiply the bounds which allow flux (positive upper, negative lower) by `factor`
    ///
    /// Factors at or above 1.0 leave the reaction untouched, so a bound is never widened.
    pub fn scale_bounds(&mut self, factor: f64) {
        if factor >= 1.0 {
            return;
        }
        let factor = factor.max(0.0);
        if self.upper_bound > 0f64 {
            self.upper_bound *= factor;
        }
        if self.lower_bound < 0f64 {
            self.lower_bound *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(lower_bound: f64, upper_bound: f64) -> Reaction {
        ReactionBuilder::default()
            .id("PFK".to_string())
            .lower_bound(lower_bound)
            .upper_bound(upper_bound)
            .build()
            .unwrap()
    }

    #[test]
    fn split_bounds_reversible() {
        let rxn = reaction(-10., 20.);
        assert_eq!(rxn.get_forward_lower_bound(), 0.);
        assert_eq!(rxn.get_forward_upper_bound(), 20.);
        assert_eq!(rxn.get_reverse_lower_bound(), 0.);
        assert_eq!(rxn.get_reverse_upper_bound(), 10.);
    }

    #[test]
    fn split_bounds_forced_flux() {
        // Reaction forced forward
        let rxn = reaction(2., 20.);
        assert_eq!(rxn.get_forward_lower_bound(), 2.);
        assert_eq!(rxn.get_reverse_upper_bound(), 0.);
        // Reaction forced backward
        let rxn = reaction(-20., -2.);
        assert_eq!(rxn.get_forward_upper_bound(), 0.);
        assert_eq!(rxn.get_reverse_lower_bound(), 2.);
        assert_eq!(rxn.get_reverse_upper_bound(), 20.);
    }

    #[test]
    fn variable_ids() {
        let rxn = reaction(0., 1.);
        assert_eq!(rxn.get_forward_id(), "PFK_forward");
        assert!(rxn.get_reverse_id().starts_with("PFK_reverse_"));
        assert_ne!(rxn.get_forward_id(), rxn.get_reverse_id());
    }

    #[test]
    fn scale_bounds_never_widens() {
        let mut rxn = reaction(-10., 20.);
        rxn.scale_bounds(0.5);
        assert_eq!(rxn.lower_bound, -5.);
        assert_eq!(rxn.upper_bound, 10.);

        let mut rxn = reaction(-10., 20.);
        rxn.scale_bounds(1.5);
        assert_eq!(rxn.lower_bound, -10.);
        assert_eq!(rxn.upper_bound, 20.);

        // Forced flux bounds are left alone
        let mut rxn = reaction(2., 20.);
        rxn.scale_bounds(0.25);
        assert_eq!(rxn.lower_bound, 2.);
        assert_eq!(rxn.upper_bound, 5.);
    }

    #[test]
    fn gene_rule_presence() {
        let mut rxn = reaction(0., 1.);
        assert!(!rxn.has_gene_rule());
        rxn.gene_reaction_rule = Some("   ".to_string());
        assert!(!rxn.has_gene_rule());
        rxn.gene_reaction_rule = Some("b0001".to_string());
        assert!(rxn.has_gene_rule());
    }
}
