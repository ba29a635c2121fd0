//! Concept Graph
//!
//! A tagging graph linking datasets and their sub-resources to a concept
//! taxonomy, with:
//! - Neo4j as the graph store (tags, favourites, views, hierarchy)
//! - Hierarchy-aware dataset search and similarity ranking
//! - View and favourite popularity rankings
//! - Result filtering through an external Resource Authority

pub mod authority;
pub mod counters;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod neo4j;
pub mod query;
pub mod resources;
pub mod search;
pub mod similarity;
pub mod tagging;

pub use error::{Error, ErrorKind, Result};

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use authority::{AuthorityClient, ResourceAuthority};
use counters::CounterService;
use filter::ResultFilter;
use hierarchy::{ConceptHierarchyIndex, DEFAULT_MAX_DEPTH};
use neo4j::{GraphStore, Neo4jClient, DEFAULT_APPLICATION};
use query::{QueryDefaults, QueryService};
use resources::ResourceRegistry;
use search::SearchEngine;
use similarity::{SimilarityRanker, DEFAULT_SIMILAR_LIMIT};
use tagging::{TaggingEngine, DEFAULT_TAG_CONCURRENCY};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub neo4j: Neo4jYamlConfig,
    pub authority: AuthorityYamlConfig,
    pub graph: GraphYamlConfig,
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "neo4j".into(),
        }
    }
}

/// Resource Authority configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthorityYamlConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AuthorityYamlConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9000/v1".into(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

/// Graph behaviour section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphYamlConfig {
    /// Application used when a request names none
    pub default_application: String,
    /// Hop ceiling for every hierarchy and BELONGS_TO traversal
    pub max_depth: u32,
    pub similar_limit: usize,
    /// In-flight tag upserts per `tag` call
    pub tag_concurrency: usize,
    pub query_timeout_secs: u64,
}

impl Default for GraphYamlConfig {
    fn default() -> Self {
        Self {
            default_application: DEFAULT_APPLICATION.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            similar_limit: DEFAULT_SIMILAR_LIMIT,
            tag_concurrency: DEFAULT_TAG_CONCURRENCY,
            query_timeout_secs: 30,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub authority_url: String,
    pub authority_api_key: Option<String>,
    pub authority_timeout: Duration,
    pub default_application: String,
    pub max_depth: u32,
    pub similar_limit: usize,
    pub tag_concurrency: usize,
    pub query_timeout: Duration,
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

impl Config {
    /// Load `config.yaml` (or `yaml_path`), then apply env var overrides.
    ///
    /// Priority: env > YAML > defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> anyhow::Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let max_depth = env_parse("MAX_DEPTH").unwrap_or(yaml.graph.max_depth);
        if max_depth == 0 {
            anyhow::bail!("max_depth must be at least 1");
        }

        Ok(Self {
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            authority_url: std::env::var("AUTHORITY_URL").unwrap_or(yaml.authority.url),
            authority_api_key: std::env::var("AUTHORITY_API_KEY")
                .ok()
                .or(yaml.authority.api_key)
                .filter(|k| !k.is_empty()),
            authority_timeout: Duration::from_secs(
                env_parse("AUTHORITY_TIMEOUT_SECS").unwrap_or(yaml.authority.timeout_secs),
            ),
            default_application: std::env::var("DEFAULT_APPLICATION")
                .ok()
                .filter(|a| !a.is_empty())
                .unwrap_or(yaml.graph.default_application),
            max_depth,
            similar_limit: env_parse("SIMILAR_LIMIT").unwrap_or(yaml.graph.similar_limit),
            tag_concurrency: env_parse("TAG_CONCURRENCY").unwrap_or(yaml.graph.tag_concurrency),
            query_timeout: Duration::from_secs(
                env_parse("QUERY_TIMEOUT_SECS").unwrap_or(yaml.graph.query_timeout_secs),
            ),
        })
    }

    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults {
            application: self.default_application.clone(),
            depth: self.max_depth,
            similar_limit: self.similar_limit,
        }
    }
}

/// Every component, wired over one graph store and one authority
#[derive(Clone)]
pub struct AppState {
    pub neo4j: Arc<dyn GraphStore>,
    pub authority: Arc<dyn ResourceAuthority>,
    pub tagging: Arc<TaggingEngine>,
    pub hierarchy: Arc<ConceptHierarchyIndex>,
    pub resources: Arc<ResourceRegistry>,
    pub counters: Arc<CounterService>,
    pub query: Arc<QueryService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let neo4j = Arc::new(
            Neo4jClient::new(
                &config.neo4j_uri,
                &config.neo4j_user,
                &config.neo4j_password,
                config.query_timeout,
            )
            .await
            .with_context(|| format!("connecting to Neo4j at {}", config.neo4j_uri))?,
        );

        let authority = Arc::new(AuthorityClient::new(
            &config.authority_url,
            config.authority_api_key.clone(),
            config.authority_timeout,
        )?);

        Ok(Self::with_backends(config, neo4j, authority))
    }

    /// Wire the components over already-built backends
    pub fn with_backends(
        config: Config,
        neo4j: Arc<dyn GraphStore>,
        authority: Arc<dyn ResourceAuthority>,
    ) -> Self {
        let hierarchy = Arc::new(ConceptHierarchyIndex::new(neo4j.clone(), config.max_depth));
        let counters = Arc::new(CounterService::new(neo4j.clone()));
        let query = Arc::new(QueryService::new(
            Arc::new(SearchEngine::new(neo4j.clone(), hierarchy.clone())),
            Arc::new(SimilarityRanker::new(neo4j.clone(), hierarchy.clone())),
            counters.clone(),
            Arc::new(ResultFilter::new(authority.clone())),
            config.query_defaults(),
        ));

        Self {
            tagging: Arc::new(TaggingEngine::new(neo4j.clone(), config.tag_concurrency)),
            resources: Arc::new(ResourceRegistry::new(neo4j.clone(), config.max_depth)),
            hierarchy,
            counters,
            query,
            neo4j,
            authority,
            config: Arc::new(config),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
