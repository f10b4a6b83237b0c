use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppResult,
    graph::{NodeRef, Table},
    models::Movie,
    routes::AppState,
    services::catalog,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    all: bool,
}

/// Handler for the movie listing
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> AppResult<Json<Vec<Movie>>> {
    let movies = catalog::list_movies(&state.graph, params.all).await?;
    Ok(Json(movies))
}

/// Handler for the genres of one movie
pub async fn genres(
    State(state): State<Arc<AppState>>,
    Path(movie): Path<String>,
) -> AppResult<Json<Vec<NodeRef>>> {
    let movie = NodeRef::parse_in(Table::Movie, &movie)?;
    let genres = catalog::movie_genres(&state.graph, &movie).await?;
    Ok(Json(genres))
}

/// Handler for "users who rated this also rated"
pub async fn similar(
    State(state): State<Arc<AppState>>,
    Path(movie): Path<String>,
) -> AppResult<Json<Vec<Movie>>> {
    let movie = NodeRef::parse_in(Table::Movie, &movie)?;
    let movies = catalog::co_rated_movies(&state.graph, &movie).await?;
    Ok(Json(movies))
}
