use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

use crate::{
    error::AppResult,
    graph::{
        extract, node_ref_of,
        query::{GENRES_FIELD, MOVIES_FIELD},
        GraphReader, NodeRef, Statement, Table,
    },
    models::{
        latest_per_movie, parse_timestamp, snapshot::movie_node, GraphSnapshot, Movie, MovieEntry,
        RatedMovie, RatingEdge, RatingLink, UserNode,
    },
};

/// Point lookup of a single movie. `Ok(None)` when the store has no such
/// record.
pub async fn fetch_movie(graph: &GraphReader, id: &NodeRef) -> AppResult<Option<Movie>> {
    let records = graph.query(&Statement::movie_by_id(id)).await?;
    Ok(records.iter().find_map(Movie::from_record))
}

/// Turns a traversal entry into a full movie, looking up bare references.
pub async fn resolve_entry(graph: &GraphReader, entry: MovieEntry) -> AppResult<Option<Movie>> {
    match entry {
        MovieEntry::Full(movie) => Ok(Some(movie)),
        MovieEntry::Bare(id) => {
            tracing::debug!(movie = %id, "Resolving bare movie reference");
            fetch_movie(graph, &id).await
        }
    }
}

/// Lists movies newest first; featured ones only unless `all` is set.
pub async fn list_movies(graph: &GraphReader, all: bool) -> AppResult<Vec<Movie>> {
    let records = graph.query(&Statement::list_movies(all)).await?;
    let movies: Vec<Movie> = records.iter().filter_map(Movie::from_record).collect();

    tracing::info!(all, movies = movies.len(), "Listed movies");

    Ok(movies)
}

/// Genres a movie belongs to, sorted and without duplicates.
pub async fn movie_genres(graph: &GraphReader, movie: &NodeRef) -> AppResult<Vec<NodeRef>> {
    let records = graph.query(&Statement::movie_genres(movie)).await?;

    let genres: BTreeSet<NodeRef> = records
        .iter()
        .flat_map(|record| extract(record, &[GENRES_FIELD]))
        .filter_map(|value| node_ref_of(&value, Table::Genre))
        .collect();

    Ok(genres.into_iter().collect())
}

/// A user's rating history with one entry per movie.
///
/// The store projects the rated movies, scores and timestamps as three
/// parallel arrays; a movie without a score at its index is skipped.
pub async fn user_ratings(graph: &GraphReader, user: &NodeRef) -> AppResult<Vec<RatedMovie>> {
    let records = graph.query(&Statement::user_ratings(user)).await?;

    let mut ratings = Vec::new();
    for record in &records {
        let movies = extract(record, &["movie"]);
        let scores = extract(record, &["score"]);
        let timestamps = extract(record, &["created_at"]);

        for (index, value) in movies.iter().enumerate() {
            let Some(entry) = MovieEntry::classify(value) else {
                continue;
            };
            let Some(score) = scores.get(index).and_then(Value::as_i64) else {
                continue;
            };
            let created_at = timestamps.get(index).and_then(parse_timestamp);

            let edge = RatingEdge {
                user: user.clone(),
                movie: entry.id().clone(),
                score,
                created_at,
            };
            let movie = match entry {
                MovieEntry::Full(movie) => Some(movie),
                MovieEntry::Bare(_) => None,
            };
            ratings.push((edge, movie));
        }
    }

    let rated = latest_per_movie(ratings);
    tracing::info!(user = %user, ratings = rated.len(), "Loaded rating history");

    Ok(rated)
}

/// Movies rated by users who also rated `movie`, in order of first
/// appearance, excluding `movie` itself.
pub async fn co_rated_movies(graph: &GraphReader, movie: &NodeRef) -> AppResult<Vec<Movie>> {
    let records = graph.query(&Statement::co_rated_movies(movie)).await?;

    let mut seen: HashSet<NodeRef> = HashSet::new();
    seen.insert(movie.clone());

    let mut movies = Vec::new();
    for value in records
        .iter()
        .flat_map(|record| extract(record, &[MOVIES_FIELD]))
    {
        let Some(entry) = MovieEntry::classify(&value) else {
            continue;
        };
        if !seen.insert(entry.id().clone()) {
            continue;
        }
        if let Some(resolved) = resolve_entry(graph, entry).await? {
            movies.push(resolved);
        }
    }

    Ok(movies)
}

/// Whole-graph view of users, movies and rating edges. The three reads run
/// concurrently; any failure fails the snapshot.
pub async fn graph_snapshot(graph: &GraphReader) -> AppResult<GraphSnapshot> {
    let users_stmt = Statement::graph_users();
    let movies_stmt = Statement::graph_movies();
    let ratings_stmt = Statement::graph_ratings();
    let (users, movies, ratings) = tokio::try_join!(
        graph.query(&users_stmt),
        graph.query(&movies_stmt),
        graph.query(&ratings_stmt),
    )?;

    let snapshot = GraphSnapshot {
        users: users.iter().filter_map(UserNode::from_record).collect(),
        movies: movies.iter().filter_map(movie_node).collect(),
        ratings: ratings.iter().filter_map(RatingLink::from_record).collect(),
    };

    tracing::info!(
        users = snapshot.users.len(),
        movies = snapshot.movies.len(),
        ratings = snapshot.ratings.len(),
        "Built graph snapshot"
    );

    Ok(snapshot)
}
