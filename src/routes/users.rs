use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    graph::{NodeRef, Table},
    models::RatedMovie,
    routes::AppState,
    services::catalog,
};

/// Handler for a user's rating history
pub async fn ratings(
    State(state): State<Arc<AppState>>,
    Path(user): Path<String>,
) -> AppResult<Json<Vec<RatedMovie>>> {
    let user = NodeRef::parse_in(Table::User, &user)?;
    let rated = catalog::user_ratings(&state.graph, &user).await?;
    Ok(Json(rated))
}
