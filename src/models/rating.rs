use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::Movie;
use crate::graph::NodeRef;

/// A `user -> rated -> movie` edge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingEdge {
    #[serde(rename = "in")]
    pub user: NodeRef,
    #[serde(rename = "out")]
    pub movie: NodeRef,
    pub score: i64,
    pub created_at: Option<DateTime<Utc>>,
}

/// One entry of a user's rating history
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RatedMovie {
    pub movie_id: NodeRef,
    pub score: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub movie: Option<Movie>,
}

/// Reads a rating timestamp.
///
/// The store hands back RFC 3339 datetimes, but ratings written by older
/// clients carry naive ISO timestamps; those are taken as UTC.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Collapses duplicate rating edges to the most recent one per movie.
///
/// A timestamped rating wins over one without a timestamp; on equal
/// timestamps the first edge seen is kept. Output is ordered by movie
/// reference.
pub fn latest_per_movie(ratings: Vec<(RatingEdge, Option<Movie>)>) -> Vec<RatedMovie> {
    let mut latest: BTreeMap<NodeRef, RatedMovie> = BTreeMap::new();

    for (edge, movie) in ratings {
        let candidate = RatedMovie {
            movie_id: edge.movie,
            score: edge.score,
            created_at: edge.created_at,
            movie,
        };
        match latest.get(&candidate.movie_id) {
            Some(existing) if existing.created_at >= candidate.created_at => {}
            _ => {
                latest.insert(candidate.movie_id.clone(), candidate);
            }
        }
    }

    latest.into_values().collect()
}
