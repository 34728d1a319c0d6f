//! Running deserialized requests
//!
//! Every request builds its own [`Model`] from the model data it carries, so nothing
//! leaks from one request into the next. Failures while building the model are reported
//! through the status of the returned solution like any other failure.
use crate::analysis::{AnalysisError, FluxAnalysis, FluxSolution, FvaSolution};
use crate::configuration::Configuration;
use crate::io::json::JsonModel;
use crate::io::request::{AnalysisRequest, FvaRequest, MomaRequest, OmicsMethod, OmicsRequest};
use crate::metabolic_model::constraints::ConstraintOverrides;
use crate::metabolic_model::model::{Model, ModelStatistics};

/// Build a model from request data and apply the request's overrides and knockouts
///
/// An `objective` naming a reaction the model doesn't have is ignored.
pub fn prepare_model(
    model: JsonModel,
    config: &Configuration,
    constraints: Option<&ConstraintOverrides>,
    knockouts: Option<&[String]>,
    objective: Option<&str>,
) -> Result<Model, AnalysisError> {
    let mut model = Model::from_json_model(model, config)?;
    let empty = ConstraintOverrides::new();
    model.apply_constraints(constraints.unwrap_or(&empty), knockouts.unwrap_or_default());
    if let Some(objective) = objective {
        if model.reactions.contains_key(objective) {
            model.set_objective(objective)?;
        } else {
            log::debug!("Ignoring objective on unknown reaction {}", objective);
        }
    }
    Ok(model)
}

/// Summary of the model data in a request
pub fn model_info(model: JsonModel, config: &Configuration) -> Result<ModelStatistics, AnalysisError> {
    Ok(Model::from_json_model(model, config)?.statistics())
}

impl FluxAnalysis {
    pub fn run_fba(&self, request: AnalysisRequest) -> FluxSolution {
        match self.prepare_analysis(request) {
            Ok(model) => self.fba(&model),
            Err(err) => self.guarded("fba", || Err(err)),
        }
    }

    pub fn run_pfba(&self, request: AnalysisRequest) -> FluxSolution {
        match self.prepare_analysis(request) {
            Ok(model) => self.pfba(&model),
            Err(err) => self.guarded("pfba", || Err(err)),
        }
    }

    pub fn run_fva(&self, request: FvaRequest) -> FvaSolution {
        let prepared = prepare_model(
            request.model,
            self.config(),
            request.constraints.as_ref(),
            request.knockouts.as_deref(),
            None,
        );
        match prepared {
            Ok(model) => self.fva(
                &model,
                request.fraction_of_optimum,
                request.reactions.as_deref(),
            ),
            Err(err) => self.guarded_fva(|| Err(err)),
        }
    }

    /// Constraints and knockouts are applied after the reference is solved
    pub fn run_moma(&self, request: MomaRequest) -> FluxSolution {
        let method = if request.linear { "linear_moma" } else { "moma" };
        match Model::from_json_model(request.model, self.config()) {
            Ok(model) => self.moma(
                &model,
                &request.constraints.unwrap_or_default(),
                &request.knockouts.unwrap_or_default(),
                request.reference_fluxes.as_ref(),
                request.linear,
            ),
            Err(err) => self.guarded(method, || Err(err.into())),
        }
    }

    pub fn run_omics(&self, request: OmicsRequest) -> FluxSolution {
        let prepared = prepare_model(
            request.model,
            self.config(),
            request.constraints.as_ref(),
            request.knockouts.as_deref(),
            None,
        );
        let model = match prepared {
            Ok(model) => model,
            Err(err) => return self.guarded(request.method.label(), || Err(err)),
        };
        match request.method {
            OmicsMethod::Gimme => self.gimme(
                &model,
                &request.expression,
                request.threshold,
                request.required_fraction,
            ),
            OmicsMethod::Imat => self.imat(
                &model,
                &request.expression,
                request.high_threshold,
                request.low_threshold,
            ),
            OmicsMethod::Eflux => self.eflux(&model, &request.expression),
        }
    }

    fn prepare_analysis(&self, request: AnalysisRequest) -> Result<Model, AnalysisError> {
        prepare_model(
            request.model,
            self.config(),
            request.constraints.as_ref(),
            request.knockouts.as_deref(),
            request.objective.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SolutionStatus;
    use crate::configuration::KnockoutPolicy;
    use approx::assert_abs_diff_eq;

    const TOY_CHAIN: &str = include_str!("../../test_data/test_models/toy_chain.json");

    fn request(extra: &str) -> String {
        format!(r#"{{"model":{}{}}}"#, TOY_CHAIN, extra)
    }

    #[test]
    fn fba_request() {
        let engine = FluxAnalysis::new(Configuration::default()).unwrap();
        let request: AnalysisRequest = serde_json::from_str(&request("")).unwrap();
        let solution = engine.run_fba(request);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.objective_value.unwrap(), 10., epsilon = 1e-6);
        assert_eq!(solution.method, "fba");
    }

    #[test]
    fn unknown_ids_are_tolerated() {
        let engine = FluxAnalysis::new(Configuration::default()).unwrap();
        let extra = r#","constraints":{"nope":{"ub":1},"R2":{"ub":4}},"knockouts":["ghost"],"objective":"missing""#;
        let request: AnalysisRequest = serde_json::from_str(&request(extra)).unwrap();
        let solution = engine.run_fba(request);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_abs_diff_eq!(solution.objective_value.unwrap(), 4., epsilon = 1e-6);
    }

    #[test]
    fn knockouts_with_zero_bounds() {
        let config = Configuration {
            knockout_policy: KnockoutPolicy::ZeroBounds,
            ..Configuration::default()
        };
        let engine = FluxAnalysis::new(config).unwrap();
        let request: AnalysisRequest =
            serde_json::from_str(&request(r#","knockouts":["g1"]"#)).unwrap();
        let solution = engine.run_fba(request);
        assert_abs_diff_eq!(solution.objective_value.unwrap(), 0., epsilon = 1e-6);
    }

    #[test]
    fn invalid_model_is_an_error_status() {
        let engine = FluxAnalysis::new(Configuration::default()).unwrap();
        let data = r#"{"model":{"reactions":[{"id":"R1","metabolites":{"X":1}}],"metabolites":[]}}"#;
        let request: AnalysisRequest = serde_json::from_str(data).unwrap();
        let solution = engine.run_pfba(request);
        assert!(solution.status.error_message().unwrap().contains("X"));
        assert_eq!(solution.method, "pfba");
    }

    #[test]
    fn fva_request() {
        let engine = FluxAnalysis::new(Configuration::default()).unwrap();
        let request: FvaRequest =
            serde_json::from_str(&request(r#","reactions":["R1"]"#)).unwrap();
        let solution = engine.run_fva(request);
        assert!(solution.status.is_optimal());
        assert_abs_diff_eq!(solution.ranges["R1"].min, 9., epsilon = 1e-5);
        assert_abs_diff_eq!(solution.ranges["R1"].max, 10., epsilon = 1e-5);
    }

    #[test]
    fn eflux_request() {
        let engine = FluxAnalysis::new(Configuration::default()).unwrap();
        let extra = r#","expression":{"g1":0.5,"g2":1.0},"method":"eflux""#;
        let request: OmicsRequest = serde_json::from_str(&request(extra)).unwrap();
        let solution = engine.run_omics(request);
        assert_eq!(solution.method, "eflux");
        assert_abs_diff_eq!(solution.objective_value.unwrap(), 5., epsilon = 1e-5);
    }

    #[test]
    fn moma_request() {
        let engine = FluxAnalysis::new(Configuration::default()).unwrap();
        let extra = r#","constraints":{"R2":{"ub":6}},"linear":true"#;
        let request: MomaRequest = serde_json::from_str(&request(extra)).unwrap();
        let solution = engine.run_moma(request);
        assert_eq!(solution.method, "linear_moma");
        assert_abs_diff_eq!(solution.fluxes["R2"], 6., epsilon = 1e-4);
    }

    #[test]
    fn info() {
        let model: JsonModel = serde_json::from_str(TOY_CHAIN).unwrap();
        let info = model_info(model, &Configuration::default()).unwrap();
        assert_eq!(info.id, "toy_chain");
        assert_eq!(info.num_reactions, 3);
        assert_eq!(info.num_metabolites, 2);
        // g3 comes from the gene rule
        assert_eq!(info.num_genes, 3);
        assert_eq!(info.objective.as_deref(), Some("1*R2"));
    }
}
