//! Metabolites, the species balanced by the steady state constraints
use derive_builder::Builder;

/// A chemical species taking part in reactions
///
/// Only the id matters to the flux problem, the other fields are carried through for
/// model statistics and round trips to JSON.
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Unique within a model, also the id of the metabolite's mass balance constraint
    pub id: String,
    #[builder(default)]
    pub name: Option<String>,
    /// Compartment tag, such as `c` or `e`
    #[builder(default)]
    pub compartment: Option<String>,
    /// Missing from many published models, so kept optional
    #[builder(default)]
    pub charge: Option<i32>,
    #[builder(default)]
    pub formula: Option<String>,
}
