use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    graph::{NodeRef, Table},
    middleware::request_id::RequestId,
    models::Movie,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub limit: Option<usize>,
}

/// Handler for the recommendations endpoint
///
/// `user` may be a bare key or a full `user:key` reference; the caller is
/// expected to have authenticated it already.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(user): Path<String>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let user = NodeRef::parse_in(Table::User, &user)?;
    let limit = params
        .limit
        .unwrap_or(state.engine.default_limit())
        .min(state.max_recommendation_limit);

    tracing::info!(
        request_id = %request_id,
        user = %user,
        limit,
        "Processing recommendation request"
    );

    let recommendations = state.engine.recommend_detailed(&user, Some(limit)).await?;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.movies.len(),
        basis = ?recommendations.basis,
        "Recommendations completed"
    );

    Ok(Json(recommendations.movies))
}
