//! SurrealDB graph store over HTTP
//!
//! Every statement is posted to `/sql` with the `USE NS .. DB ..` directive
//! prepended: the HTTP endpoint keeps no scope between calls. Statement
//! parameters travel as URL query parameters, which the store binds as
//! `$name` variables.

use crate::{
    config::Config,
    error::{AppError, AppResult},
    graph::{normalize::mentions_scope, GraphStore, Statement},
};
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client as HttpClient,
};
use serde_json::Value;
use std::time::Duration;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SurrealClient {
    http_client: HttpClient,
    base_url: String,
    user: String,
    password: String,
    namespace: String,
    database: String,
}

impl SurrealClient {
    /// Creates a client for the configured store and scope.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.graph_timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.surreal_url.trim_end_matches('/').to_string(),
            user: config.surreal_user.clone(),
            password: config.surreal_pass.clone(),
            namespace: config.surreal_ns.clone(),
            database: config.surreal_db.clone(),
        })
    }

    /// Statement text with the scope directive in front
    fn scoped_text(&self, statement: &Statement) -> String {
        format!(
            "USE NS {} DB {}; {}",
            self.namespace,
            self.database,
            statement.text()
        )
    }

    /// Checks that the store answers on `/health`.
    pub async fn health_check(&self) -> AppResult<()> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::GraphStore(format!(
                "SurrealDB health check failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Waits for the store to come up, retrying the health check.
    pub async fn connect_with_retry(&self, attempts: u32, delay: Duration) -> AppResult<()> {
        let mut attempt = 1;
        loop {
            match self.health_check().await {
                Ok(()) => {
                    tracing::info!(
                        url = %self.base_url,
                        namespace = %self.namespace,
                        database = %self.database,
                        "Connected to SurrealDB"
                    );
                    return Ok(());
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts = attempts,
                        "SurrealDB not reachable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, attempts, "Giving up on SurrealDB");
                    return Err(e);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl GraphStore for SurrealClient {
    async fn execute(&self, statement: &Statement) -> AppResult<Value> {
        let url = format!("{}/sql", self.base_url);

        tracing::debug!(
            query = %statement.text(),
            params = ?statement.params(),
            "Executing graph statement"
        );

        let mut request = self
            .http_client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .header("NS", &self.namespace)
            .header("DB", &self.database)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "text/plain");

        if !statement.params().is_empty() {
            request = request.query(statement.params());
        }

        let response = request.body(self.scoped_text(statement)).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if mentions_scope(&body) {
                return Err(AppError::Configuration(format!(
                    "SurrealDB returned status {}: {}",
                    status, body
                )));
            }
            return Err(AppError::GraphStore(format!(
                "SurrealDB returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await?;
        tracing::trace!(response = %response_text, "Raw SurrealDB response");

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to deserialize SurrealDB response"
            );
            AppError::GraphStore(format!("Failed to parse SurrealDB response: {}", e))
        })
    }

    fn name(&self) -> &'static str {
        "surrealdb"
    }
}
