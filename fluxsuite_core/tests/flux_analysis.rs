use approx::assert_abs_diff_eq;
use indexmap::IndexMap;

use fluxsuite_core::analysis::{FluxAnalysis, SolutionStatus};
use fluxsuite_core::configuration::{Configuration, KnockoutPolicy, SolverKind};
use fluxsuite_core::metabolic_model::constraints::BoundOverride;
use fluxsuite_core::metabolic_model::model::Model;

const TOY_CHAIN: &str = "test_data/test_models/toy_chain.json";

fn toy_chain() -> Model {
    Model::read_json(TOY_CHAIN, &Configuration::default()).unwrap()
}

fn engines() -> Vec<FluxAnalysis> {
    [SolverKind::Clarabel, SolverKind::Microlp]
        .into_iter()
        .filter_map(|solver| FluxAnalysis::new(Configuration::default().with_solver(solver)).ok())
        .collect()
}

#[test]
fn chain_fba() {
    for engine in engines() {
        let solution = engine.fba(&toy_chain());
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.objective_value.unwrap(), 10., epsilon = 1e-6);
        assert_abs_diff_eq!(solution.fluxes["R1"], 10., epsilon = 1e-6);
        assert_abs_diff_eq!(solution.fluxes["R2"], 10., epsilon = 1e-6);
    }
}

#[test]
fn chain_fva_at_ninety_percent() {
    for engine in engines() {
        let solution = engine.fva(&toy_chain(), 0.9, Some(&["R1".to_string()]));
        assert!(solution.status.is_optimal());
        let range = solution.ranges["R1"];
        assert_abs_diff_eq!(range.min, 9., epsilon = 1e-5);
        assert_abs_diff_eq!(range.max, 10., epsilon = 1e-5);
    }
}

#[test]
fn fva_ranges_are_ordered_and_bounded() {
    let model = toy_chain();
    for engine in engines() {
        let solution = engine.fva(&model, 0.5, None);
        assert_eq!(solution.ranges.len(), model.reactions.len());
        for (id, range) in &solution.ranges {
            let rxn = &model.reactions[id];
            assert!(range.min <= range.max, "{}", id);
            assert!(range.min >= rxn.lower_bound - 1e-6, "{}", id);
            assert!(range.max <= rxn.upper_bound + 1e-6, "{}", id);
        }
    }
}

#[test]
fn unknown_ids_leave_the_model_alone() {
    let mut model = toy_chain();
    let before: Vec<(f64, f64)> = model
        .reactions
        .values()
        .map(|r| (r.lower_bound, r.upper_bound))
        .collect();
    let mut overrides = IndexMap::new();
    overrides.insert(
        "NOT_A_REACTION".to_string(),
        BoundOverride {
            lb: Some(1.),
            ub: Some(2.),
        },
    );
    model.apply_constraints(&overrides, &["not_a_gene".to_string()]);
    let after: Vec<(f64, f64)> = model
        .reactions
        .values()
        .map(|r| (r.lower_bound, r.upper_bound))
        .collect();
    assert_eq!(before, after);
    assert!(model.knocked_out_genes().is_empty());
}

#[test]
fn pfba_and_moma_on_the_chain() {
    let engine = FluxAnalysis::new(Configuration::default()).unwrap();
    let model = toy_chain();
    let pfba = engine.pfba(&model);
    // EX_A, R1 and R2 each carry 10
    assert_abs_diff_eq!(pfba.objective_value.unwrap(), 30., epsilon = 1e-4);

    let mut overrides = IndexMap::new();
    overrides.insert(
        "R1".to_string(),
        BoundOverride {
            lb: None,
            ub: Some(4.),
        },
    );
    let moma = engine.moma(&model, &overrides, &[], None, false);
    assert_eq!(moma.status, SolutionStatus::Optimal);
    assert_abs_diff_eq!(moma.fluxes["R2"], 4., epsilon = 1e-4);
    assert_abs_diff_eq!(moma.objective_value.unwrap(), 108., epsilon = 1e-3);
}

#[test]
fn infeasible_requests_report_status() {
    let mut model = toy_chain();
    let mut overrides = IndexMap::new();
    overrides.insert(
        "R2".to_string(),
        BoundOverride {
            lb: Some(15.),
            ub: Some(20.),
        },
    );
    model.apply_constraints(&overrides, &[]);
    for engine in engines() {
        assert_eq!(engine.fba(&model).status, SolutionStatus::Infeasible);
        assert_eq!(engine.fva(&model, 0.9, None).status, SolutionStatus::Infeasible);
    }
}

#[test]
fn empty_model_is_trivially_optimal() {
    let config = Configuration::default();
    let model =
        Model::from_json_str(r#"{"id": "e", "metabolites": [], "reactions": []}"#, &config).unwrap();
    for engine in engines() {
        let solution = engine.fba(&model);
        assert_eq!(solution.status, SolutionStatus::Optimal, "{}", engine.solver_name());
        assert_eq!(solution.objective_value, Some(0.));
        let ranges = engine.fva(&model, 0.9, None);
        assert_eq!(ranges.status, SolutionStatus::Optimal);
        assert!(ranges.ranges.is_empty());
    }
}

#[test]
fn numeric_gene_ids_close_reactions() {
    let config = Configuration {
        knockout_policy: KnockoutPolicy::ZeroBounds,
        ..Configuration::default()
    };
    let data = r#"{
        "id": "entrez",
        "metabolites": [{"id": "A"}],
        "genes": [{"id": "10026.1"}],
        "reactions": [
            {"id": "EX_A", "metabolites": {"A": 1.0}, "lower_bound": 0.0, "upper_bound": 10.0},
            {"id": "R1", "metabolites": {"A": -1.0}, "lower_bound": 0.0, "upper_bound": 10.0,
             "gene_reaction_rule": "10026.1 or 10027"}
        ],
        "objective": "R1"
    }"#;
    let mut model = Model::from_json_str(data, &config).unwrap();
    assert!(model.genes.contains_key("10027"));

    let engine = FluxAnalysis::new(config).unwrap();
    assert_abs_diff_eq!(engine.fba(&model).objective_value.unwrap(), 10., epsilon = 1e-6);

    model.apply_constraints(&IndexMap::new(), &["10026.1".to_string()]);
    assert!(model.inactive_reactions().is_empty());
    model.apply_constraints(&IndexMap::new(), &["10027".to_string()]);
    assert_eq!(model.inactive_reactions(), vec!["R1".to_string()]);
    let solution = engine.fba(&model);
    assert_eq!(solution.status, SolutionStatus::Optimal);
    assert_abs_diff_eq!(solution.objective_value.unwrap(), 0., epsilon = 1e-6);
}
