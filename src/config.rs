use serde::Deserialize;
use std::time::Duration;

use crate::graph::is_identifier;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SurrealDB base URL (the `/sql` and `/health` endpoints hang off it)
    #[serde(default = "default_surreal_url")]
    pub surreal_url: String,

    #[serde(default = "default_surreal_user")]
    pub surreal_user: String,

    #[serde(default = "default_surreal_pass")]
    pub surreal_pass: String,

    /// Namespace selected by the `USE` directive on every query
    #[serde(default = "default_scope")]
    pub surreal_ns: String,

    /// Database selected by the `USE` directive on every query
    #[serde(default = "default_scope")]
    pub surreal_db: String,

    /// Upper bound for a single graph store call, in milliseconds
    #[serde(default = "default_graph_timeout_ms")]
    pub graph_timeout_ms: u64,

    /// Number of recommendations returned when the caller gives no limit
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Hard cap on a caller-supplied limit
    #[serde(default = "default_max_recommendation_limit")]
    pub max_recommendation_limit: usize,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_surreal_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_surreal_user() -> String {
    "root".to_string()
}

fn default_surreal_pass() -> String {
    "root".to_string()
}

fn default_scope() -> String {
    "test".to_string()
}

fn default_graph_timeout_ms() -> u64 {
    5000
}

fn default_recommendation_limit() -> usize {
    10
}

fn default_max_recommendation_limit() -> usize {
    50
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            surreal_url: default_surreal_url(),
            surreal_user: default_surreal_user(),
            surreal_pass: default_surreal_pass(),
            surreal_ns: default_scope(),
            surreal_db: default_scope(),
            graph_timeout_ms: default_graph_timeout_ms(),
            recommendation_limit: default_recommendation_limit(),
            max_recommendation_limit: default_max_recommendation_limit(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the graph client cannot safely use.
    ///
    /// The namespace and database names are spliced into the `USE` directive,
    /// so they must be plain identifiers.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_identifier(&self.surreal_ns) {
            anyhow::bail!("SURREAL_NS is not a valid identifier: {:?}", self.surreal_ns);
        }
        if !is_identifier(&self.surreal_db) {
            anyhow::bail!("SURREAL_DB is not a valid identifier: {:?}", self.surreal_db);
        }
        if self.graph_timeout_ms == 0 {
            anyhow::bail!("GRAPH_TIMEOUT_MS must be greater than zero");
        }
        if self.recommendation_limit > self.max_recommendation_limit {
            anyhow::bail!(
                "RECOMMENDATION_LIMIT ({}) exceeds MAX_RECOMMENDATION_LIMIT ({})",
                self.recommendation_limit,
                self.max_recommendation_limit
            );
        }
        Ok(())
    }

    pub fn graph_timeout(&self) -> Duration {
        Duration::from_millis(self.graph_timeout_ms)
    }
}
