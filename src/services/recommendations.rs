use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use crate::{
    config::Config,
    error::AppResult,
    graph::{
        extract, node_ref_of,
        query::{GENRE_MOVIES, MOVIES_FIELD, RATED_GENRES},
        GraphReader, NodeRef, Statement, Table,
    },
    models::{Movie, MovieEntry},
    services::{
        candidates::{CandidateAccumulator, Signal, SignalContribution},
        catalog,
    },
};

/// Why a recommendation list looks the way it does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Basis {
    /// Candidates were ranked from at least one working signal (the list may
    /// still be empty if every match was already rated)
    Ranked,
    /// The user has not rated anything
    NoRatings,
    /// Rated movies yielded neither genres nor directors
    NoInterests,
    /// Every traversal that could produce a signal failed
    SignalsUnavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendations {
    pub movies: Vec<Movie>,
    pub basis: Basis,
}

impl Recommendations {
    fn empty(basis: Basis) -> Self {
        Self {
            movies: Vec::new(),
            basis,
        }
    }
}

/// Content-based recommender over the rating graph
///
/// Scores unseen movies by how many of the user's genres and directors they
/// share. Traversal failures only remove the signal they would have produced;
/// a misconfigured store scope is the one error that reaches the caller.
#[derive(Clone)]
pub struct RecommendationEngine {
    graph: GraphReader,
    default_limit: usize,
}

impl RecommendationEngine {
    pub fn new(graph: GraphReader, default_limit: usize) -> Self {
        Self {
            graph,
            default_limit,
        }
    }

    pub fn from_config(graph: GraphReader, config: &Config) -> Self {
        Self::new(graph, config.recommendation_limit)
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Ranked unseen movies for `user`, at most `max_results` (default limit
    /// when `None`).
    pub async fn recommend(
        &self,
        user: &NodeRef,
        max_results: Option<usize>,
    ) -> AppResult<Vec<Movie>> {
        Ok(self.recommend_detailed(user, max_results).await?.movies)
    }

    pub async fn recommend_detailed(
        &self,
        user: &NodeRef,
        max_results: Option<usize>,
    ) -> AppResult<Recommendations> {
        let start = Instant::now();
        let limit = max_results.unwrap_or(self.default_limit);

        // 1. Movies already rated; nothing to go on without them
        let Some(excluded) = degrade(self.rated_movie_refs(user).await, "rated_movie_refs")? else {
            return Ok(Recommendations::empty(Basis::SignalsUnavailable));
        };
        if excluded.is_empty() {
            tracing::info!(user = %user, "No rated movies, nothing to recommend from");
            return Ok(Recommendations::empty(Basis::NoRatings));
        }

        // 2. Directors of rated movies
        let rated = degrade(self.rated_movies(user).await, "rated_movies")?;
        let directors: BTreeSet<String> = rated
            .iter()
            .flatten()
            .filter_map(|movie| movie.director_name().map(str::to_string))
            .collect();

        // 3. Genres of rated movies
        let genres = degrade(self.rated_genres(user).await, "rated_genres")?;

        tracing::info!(
            user = %user,
            rated = excluded.len(),
            genres = genres.as_ref().map_or(0, BTreeSet::len),
            directors = directors.len(),
            "Built interest sets"
        );

        let interests_incomplete = rated.is_none() || genres.is_none();
        let genres = genres.unwrap_or_default();
        if genres.is_empty() && directors.is_empty() {
            if interests_incomplete {
                tracing::warn!(user = %user, "Interest traversals failed, no signals left");
                return Ok(Recommendations::empty(Basis::SignalsUnavailable));
            }
            tracing::info!(user = %user, "No genres or directors found");
            return Ok(Recommendations::empty(Basis::NoInterests));
        }

        // 4 + 5. Fan out one task per genre and per director
        let excluded = Arc::new(excluded);
        let mut tasks = JoinSet::new();
        let mut signals = Vec::new();

        for genre in genres {
            let engine = self.clone();
            let excluded = excluded.clone();
            let index = signals.len();
            signals.push((Signal::Genre, genre.to_string()));
            tasks.spawn(async move { (index, engine.genre_signal(&genre, &excluded).await) });
        }

        for director in directors {
            let engine = self.clone();
            let excluded = excluded.clone();
            let index = signals.len();
            signals.push((Signal::Director, director.clone()));
            tasks.spawn(async move { (index, engine.director_signal(&director, &excluded).await) });
        }

        let signal_count = signals.len();
        let mut failed = 0;
        let mut contributions: Vec<Option<SignalContribution>> =
            (0..signal_count).map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(contribution))) => {
                    let (signal, label) = &signals[index];
                    tracing::debug!(
                        signal = ?signal,
                        source = %label,
                        matches = contribution.len(),
                        "Signal gathered"
                    );
                    contributions[index] = Some(contribution);
                }
                Ok((_, Err(e))) if e.is_fatal() => {
                    tasks.abort_all();
                    return Err(e);
                }
                Ok((index, Err(e))) => {
                    let (signal, label) = &signals[index];
                    tracing::warn!(
                        error = %e,
                        signal = ?signal,
                        source = %label,
                        "Signal traversal failed, skipping"
                    );
                    failed += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Task join error");
                    failed += 1;
                }
            }
        }

        // Single writer: contributions are merged here, in spawn order
        let mut accumulator = CandidateAccumulator::new(excluded);
        for contribution in contributions.into_iter().flatten() {
            accumulator.merge(contribution);
        }

        if failed > 0 {
            tracing::warn!(
                success_count = signal_count - failed,
                error_count = failed,
                "Partial signal failure"
            );
        }

        let basis = if failed == signal_count && accumulator.is_empty() {
            Basis::SignalsUnavailable
        } else {
            Basis::Ranked
        };

        let candidates = accumulator.ranked(limit);
        let movies: Vec<Movie> = candidates.into_iter().map(|c| c.movie).collect();

        tracing::info!(
            user = %user,
            recommendations = movies.len(),
            basis = ?basis,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Recommendations computed"
        );

        Ok(Recommendations { movies, basis })
    }

    async fn rated_movie_refs(&self, user: &NodeRef) -> AppResult<HashSet<NodeRef>> {
        let records = self
            .graph
            .query(&Statement::rated_movie_refs(user))
            .await?;

        Ok(records
            .iter()
            .flat_map(|record| extract(record, &[MOVIES_FIELD]))
            .filter_map(|value| node_ref_of(&value, Table::Movie))
            .collect())
    }

    async fn rated_movies(&self, user: &NodeRef) -> AppResult<Vec<Movie>> {
        let records = self.graph.query(&Statement::rated_movies(user)).await?;

        let mut seen = HashSet::new();
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
            if let Some(movie) = self.resolve(entry).await? {
                movies.push(movie);
            }
        }

        Ok(movies)
    }

    async fn rated_genres(&self, user: &NodeRef) -> AppResult<BTreeSet<NodeRef>> {
        let records = self.graph.query(&Statement::rated_genres(user)).await?;
        let segments = RATED_GENRES.segments();

        Ok(records
            .iter()
            .flat_map(|record| extract(record, &segments))
            .filter_map(|value| node_ref_of(&value, Table::Genre))
            .collect())
    }

    async fn genre_signal(
        &self,
        genre: &NodeRef,
        excluded: &HashSet<NodeRef>,
    ) -> AppResult<SignalContribution> {
        let records = self.graph.query(&Statement::movies_in_genre(genre)).await?;
        let segments = GENRE_MOVIES.segments();

        let mut contribution = SignalContribution::new(Signal::Genre);
        for value in records.iter().flat_map(|record| extract(record, &segments)) {
            self.add_candidate(&mut contribution, &value, excluded)
                .await?;
        }

        Ok(contribution)
    }

    async fn director_signal(
        &self,
        director: &str,
        excluded: &HashSet<NodeRef>,
    ) -> AppResult<SignalContribution> {
        let records = self
            .graph
            .query(&Statement::movies_by_director(director))
            .await?;

        let mut contribution = SignalContribution::new(Signal::Director);
        for record in &records {
            self.add_candidate(&mut contribution, record, excluded)
                .await?;
        }

        Ok(contribution)
    }

    /// Adds a traversal entry to a signal unless it is excluded or already
    /// counted. Bare references are looked up first.
    async fn add_candidate(
        &self,
        contribution: &mut SignalContribution,
        value: &serde_json::Value,
        excluded: &HashSet<NodeRef>,
    ) -> AppResult<()> {
        let Some(entry) = MovieEntry::classify(value) else {
            return Ok(());
        };
        if excluded.contains(entry.id()) || contribution.contains(entry.id()) {
            return Ok(());
        }
        if let Some(movie) = self.resolve(entry).await? {
            contribution.add(movie);
        }
        Ok(())
    }

    /// Point lookups are best effort: a failed or empty lookup drops the
    /// movie, a scope error still propagates.
    async fn resolve(&self, entry: MovieEntry) -> AppResult<Option<Movie>> {
        let id = entry.id().clone();
        match catalog::resolve_entry(&self.graph, entry).await {
            Ok(Some(movie)) => Ok(Some(movie)),
            Ok(None) => {
                tracing::debug!(movie = %id, "Movie lookup found nothing, dropping");
                Ok(None)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                tracing::warn!(error = %e, movie = %id, "Movie lookup failed, dropping");
                Ok(None)
            }
        }
    }
}

/// Absorbs a non-fatal traversal error as `None` after logging it.
fn degrade<T>(result: AppResult<T>, traversal: &'static str) -> AppResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, traversal, "Traversal failed, continuing without it");
            Ok(None)
        }
    }
}
