//! Small models shared by the analysis unit tests
use indexmap::IndexMap;

use crate::analysis::FluxAnalysis;
use crate::configuration::{Configuration, GprPrecedence, SolverKind};
use crate::io::gpr_parse::parse_gpr;
use crate::metabolic_model::gene::{Gene, GeneActivity};
use crate::metabolic_model::metabolite::MetaboliteBuilder;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::ReactionBuilder;

/// One engine per compiled in solver
pub(crate) fn engines() -> Vec<FluxAnalysis> {
    let mut engines = vec![FluxAnalysis::new(Configuration::default()).unwrap()];
    if cfg!(feature = "minilp") {
        engines.push(microlp_engine());
    }
    engines
}

pub(crate) fn microlp_engine() -> FluxAnalysis {
    FluxAnalysis::new(Configuration::default().with_solver(SolverKind::Microlp)).unwrap()
}

fn add_reaction(model: &mut Model, id: &str, stoichiometry: &[(&str, f64)], rule: Option<&str>) {
    let metabolites: IndexMap<String, f64> = stoichiometry
        .iter()
        .map(|(met, coef)| (met.to_string(), *coef))
        .collect();
    let gpr = rule.map(|r| parse_gpr(r, GprPrecedence::SplitOrFirst).unwrap());
    if let Some(ref gpr) = gpr {
        for gene in gpr.gene_ids() {
            model.add_gene(Gene::new(gene, None, GeneActivity::Active));
        }
    }
    model.add_reaction(
        ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(metabolites)
            .gene_reaction_rule(rule.map(str::to_string))
            .gpr(gpr)
            .lower_bound(0.)
            .upper_bound(10.)
            .build()
            .unwrap(),
    );
}

fn add_metabolite(model: &mut Model, id: &str, compartment: &str) {
    model.add_metabolite(
        MetaboliteBuilder::default()
            .id(id.to_string())
            .compartment(Some(compartment.to_string()))
            .build()
            .unwrap(),
    );
}

/// `R1: A -> B` and `R2: B ->`, both bounded to [0, 10], maximizing R2
///
/// A sits outside the system boundary so only B is balanced.
pub(crate) fn chain_model() -> Model {
    let mut model = Model::new_empty("chain");
    add_metabolite(&mut model, "A", "e");
    add_metabolite(&mut model, "B", "c");
    add_reaction(&mut model, "R1", &[("B", 1.)], None);
    add_reaction(&mut model, "R2", &[("B", -1.)], None);
    model.set_objective("R2").unwrap();
    model
}

/// Uptake `R1 -> B` feeding two drains, `R2` (gene g2, the objective) and `R3` (gene g3),
/// all bounded to [0, 10]
pub(crate) fn branch_model() -> Model {
    let mut model = Model::new_empty("branch");
    add_metabolite(&mut model, "B", "c");
    add_reaction(&mut model, "R1", &[("B", 1.)], None);
    add_reaction(&mut model, "R2", &[("B", -1.)], Some("g2"));
    add_reaction(&mut model, "R3", &[("B", -1.)], Some("g3"));
    model.set_objective("R2").unwrap();
    model
}
