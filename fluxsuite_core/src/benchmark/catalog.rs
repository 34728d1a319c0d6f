//! Catalog of published models and a local cache of their JSON files
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::benchmark::BenchmarkError;
use crate::configuration::Configuration;
use crate::metabolic_model::model::Model;

pub const BIGG_API_URL: &str = "http://bigg.ucsd.edu/api/v2";
pub const BIGG_STATIC_URL: &str = "http://bigg.ucsd.edu/static/models";

const CATALOG_FILE: &str = "catalog.json";

/// Source of text documents fetched over HTTP
pub trait HttpClient: Send + Sync {
    fn get_text(&self, url: &str) -> Result<String, BenchmarkError>;
}

impl HttpClient for Client {
    fn get_text(&self, url: &str) -> Result<String, BenchmarkError> {
        let response = self.get(url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BenchmarkError::NotFound(url.to_string()));
        }
        Ok(response.error_for_status()?.text()?)
    }
}

/// Catalog entry of one published model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub bigg_id: String,
    pub organism: String,
    pub metabolite_count: usize,
    pub reaction_count: usize,
    pub gene_count: usize,
}

/// Entry as listed by the models endpoint, where any field but the id may be null
#[derive(Deserialize)]
struct ListedModel {
    bigg_id: String,
    #[serde(default)]
    organism: Option<String>,
    #[serde(default)]
    metabolite_count: Option<usize>,
    #[serde(default)]
    reaction_count: Option<usize>,
    #[serde(default)]
    gene_count: Option<usize>,
}

#[derive(Deserialize)]
struct ModelListing {
    results: Vec<ListedModel>,
}

impl From<ListedModel> for ModelInfo {
    fn from(listed: ListedModel) -> Self {
        ModelInfo {
            bigg_id: listed.bigg_id,
            organism: listed.organism.unwrap_or_else(|| "Unknown".to_string()),
            metabolite_count: listed.metabolite_count.unwrap_or(0),
            reaction_count: listed.reaction_count.unwrap_or(0),
            gene_count: listed.gene_count.unwrap_or(0),
        }
    }
}

/// Fetches the model catalog and model files, keeping copies in `cache_dir`
pub struct ModelCatalog<C: HttpClient = Client> {
    cache_dir: PathBuf,
    client: C,
}

impl ModelCatalog<Client> {
    /// Catalog backed by a blocking reqwest client
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self, BenchmarkError> {
        let client = Client::builder().timeout(Duration::from_secs(120)).build()?;
        Self::with_client(cache_dir, client)
    }
}

impl<C: HttpClient> ModelCatalog<C> {
    pub fn with_client<P: AsRef<Path>>(cache_dir: P, client: C) -> Result<Self, BenchmarkError> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir).map_err(|e| BenchmarkError::io(&cache_dir, e))?;
        Ok(ModelCatalog { cache_dir, client })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// List of available models, read from the cache unless `force_refresh` is set or
    /// nothing is cached yet
    pub fn fetch_catalog(&self, force_refresh: bool) -> Result<Vec<ModelInfo>, BenchmarkError> {
        let cache_path = self.cache_dir.join(CATALOG_FILE);
        if cache_path.exists() && !force_refresh {
            log::info!("Loading cached catalog from {}", cache_path.display());
            let contents =
                fs::read_to_string(&cache_path).map_err(|e| BenchmarkError::io(&cache_path, e))?;
            return Ok(serde_json::from_str(&contents)?);
        }

        log::info!("Fetching model catalog from BiGG");
        let body = self.client.get_text(&format!("{}/models", BIGG_API_URL))?;
        let listing: ModelListing = serde_json::from_str(&body)?;
        let models: Vec<ModelInfo> = listing.results.into_iter().map(ModelInfo::from).collect();
        fs::write(&cache_path, serde_json::to_string_pretty(&models)?)
            .map_err(|e| BenchmarkError::io(&cache_path, e))?;
        log::info!("Found {} models", models.len());
        Ok(models)
    }

    /// Path of the cached JSON file of a model, downloading it first if needed
    pub fn download_model(&self, model_id: &str, force: bool) -> Result<PathBuf, BenchmarkError> {
        let path = self.cache_dir.join(format!("{}.json", model_id));
        if path.exists() && !force {
            log::debug!("Using cached model {}", model_id);
            return Ok(path);
        }
        log::info!("Downloading model {}", model_id);
        let body = self
            .client
            .get_text(&format!("{}/{}.json", BIGG_STATIC_URL, model_id))?;
        fs::write(&path, body).map_err(|e| BenchmarkError::io(&path, e))?;
        Ok(path)
    }

    /// Download and parse a model, `None` (with a warning) if either step fails
    pub fn load_model(&self, model_id: &str, config: &Configuration) -> Option<Model> {
        let loaded = self
            .download_model(model_id, false)
            .and_then(|path| Ok(Model::read_json(path, config)?));
        match loaded {
            Ok(model) => Some(model),
            Err(err) => {
                log::warn!("Skipping model {}: {}", model_id, err);
                None
            }
        }
    }

    /// Models with a reaction count in `[min_reactions, max_reactions]`, sorted by size
    /// and thinned to at most `limit` entries spread evenly across the size range
    pub fn get_benchmark_models(
        &self,
        min_reactions: usize,
        max_reactions: usize,
        limit: usize,
        force_refresh: bool,
    ) -> Result<Vec<ModelInfo>, BenchmarkError> {
        let mut candidates: Vec<ModelInfo> = self
            .fetch_catalog(force_refresh)?
            .into_iter()
            .filter(|m| (min_reactions..=max_reactions).contains(&m.reaction_count))
            .collect();
        candidates.sort_by_key(|m| m.reaction_count);
        log::info!(
            "{} models have between {} and {} reactions",
            candidates.len(),
            min_reactions,
            max_reactions
        );
        Ok(stratified_sample(&candidates, limit))
    }
}

/// Pick `limit` evenly spaced items, index `floor(i * len / limit)` for the i-th pick
///
/// Returns everything when there are no more than `limit` items.
pub fn stratified_sample<T: Clone>(items: &[T], limit: usize) -> Vec<T> {
    if items.len() <= limit {
        return items.to_vec();
    }
    let step = items.len() as f64 / limit as f64;
    (0..limit)
        .map(|i| items[(i as f64 * step).floor() as usize].clone())
        .collect()
}
