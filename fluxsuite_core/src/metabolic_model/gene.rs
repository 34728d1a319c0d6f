//! This module provides the Gene struct, representing a gene in the model
use std::fmt::{Display, Formatter};
use std::hash::Hash;

use derive_builder::Builder;

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, Eq, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Whether this gene is currently active (see [`GeneActivity`])
    #[builder(default = "GeneActivity::Active")]
    pub activity: GeneActivity,
}

impl Gene {
    pub fn new(id: String, name: Option<String>, activity: GeneActivity) -> Gene {
        Gene { id, name, activity }
    }

    /// Flag the gene as knocked out
    ///
    /// # Note:
    /// This only changes the activity flag, the bounds of reactions catalyzed by this
    /// gene are left untouched. See [`crate::configuration::KnockoutPolicy`] for how
    /// the flag is used when a problem is formulated.
    pub fn knock_out(&mut self) {
        self.activity = GeneActivity::Inactive;
    }

    /// Whether the gene has been knocked out
    pub fn is_knocked_out(&self) -> bool {
        self.activity == GeneActivity::Inactive
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Hash for Gene {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.activity.hash(state);
    }
}

/// Whether a gene is active or not
#[derive(Clone, Debug, Hash, Eq, PartialEq, Copy)]
pub enum GeneActivity {
    /// Gene is considered active
    Active,
    /// Gene is considered inactive
    Inactive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_active() {
        let gene = GeneBuilder::default()
            .id("b0001".to_string())
            .build()
            .unwrap();
        assert_eq!(gene.activity, GeneActivity::Active);
        assert!(gene.name.is_none());
    }

    #[test]
    fn knock_out() {
        let mut gene = Gene::new("b0001".to_string(), Some("thrL".to_string()), GeneActivity::Active);
        assert!(!gene.is_knocked_out());
        gene.knock_out();
        assert!(gene.is_knocked_out());
        // Knocking out twice is harmless
        gene.knock_out();
        assert_eq!(gene.activity, GeneActivity::Inactive);
        assert_eq!(format!("{}", gene), "b0001");
    }
}
