use axum::{
    http::StatusCode,
    middleware::from_fn,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    config::Config,
    graph::{GraphReader, GraphStore},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::recommendations::RecommendationEngine,
};

pub mod graph;
pub mod movies;
pub mod recommendations;
pub mod users;

/// Shared state handed to every handler
pub struct AppState {
    pub graph: GraphReader,
    pub engine: RecommendationEngine,
    /// Cap applied to caller-supplied recommendation limits
    pub max_recommendation_limit: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn GraphStore>, config: &Config) -> Self {
        let graph = GraphReader::new(store, config.graph_timeout());
        let engine = RecommendationEngine::from_config(graph.clone(), config);

        Self {
            graph,
            engine,
            max_recommendation_limit: config.max_recommendation_limit,
        }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(Arc::new(state))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/users/:user/recommendations",
            get(recommendations::recommend),
        )
        .route("/users/:user/ratings", get(users::ratings))
        .route("/movies", get(movies::list))
        .route("/movies/:movie/genres", get(movies::genres))
        .route("/movies/:movie/similar", get(movies::similar))
        .route("/graph", get(graph::snapshot))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
