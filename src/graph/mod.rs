//! Graph store access
//!
//! The store is queried with traversal statements and answers with loosely
//! shaped JSON. Everything above this module only ever sees normalized
//! records (see [`normalize`]) and walks them with [`extract`].

use serde_json::Value;
use std::{sync::Arc, time::Duration};

use crate::error::{AppError, AppResult};

pub mod node_ref;
pub mod normalize;
pub mod path;
pub mod query;
pub mod surreal;

pub use node_ref::{is_identifier, node_ref_of, NodeRef, Table};
pub use normalize::normalize;
pub use path::extract;
pub use query::{Statement, TraversalPath};
pub use surreal::SurrealClient;

/// A normalized record: null, bool, number, string, sequence or mapping.
/// Consumers must match on the shape rather than assume it.
pub type Record = Value;

/// Trait for graph stores
///
/// Implementations send one statement within the configured scope and return
/// the raw, store-specific response.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GraphStore: Send + Sync {
    async fn execute(&self, statement: &Statement) -> AppResult<Value>;

    /// Store name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Read access to the graph with a bounded wait per statement
#[derive(Clone)]
pub struct GraphReader {
    store: Arc<dyn GraphStore>,
    timeout: Duration,
}

impl GraphReader {
    pub fn new(store: Arc<dyn GraphStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Runs a statement and normalizes the response.
    ///
    /// A statement outliving the timeout fails with
    /// [`AppError::TraversalTimeout`].
    pub async fn query(&self, statement: &Statement) -> AppResult<Vec<Record>> {
        let raw = tokio::time::timeout(self.timeout, self.store.execute(statement))
            .await
            .map_err(|_| {
                tracing::warn!(
                    query = %statement.text(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Graph statement timed out"
                );
                AppError::TraversalTimeout(self.timeout.as_millis() as u64)
            })??;

        normalize(raw)
    }
}
