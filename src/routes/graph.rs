use axum::{extract::State, Json};
use std::sync::Arc;

use crate::{error::AppResult, models::GraphSnapshot, routes::AppState, services::catalog};

/// Handler for the whole-graph snapshot used by visualizations
pub async fn snapshot(State(state): State<Arc<AppState>>) -> AppResult<Json<GraphSnapshot>> {
    let snapshot = catalog::graph_snapshot(&state.graph).await?;
    Ok(Json(snapshot))
}
