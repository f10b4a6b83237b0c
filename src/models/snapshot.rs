use serde::Serialize;
use serde_json::Value;

use super::{Movie, RatingEdge};
use crate::graph::{node_ref_of, NodeRef, Table};

/// A user vertex in the graph snapshot
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserNode {
    pub id: NodeRef,
    pub name: String,
    pub email: String,
}

impl UserNode {
    /// Missing `name`/`email` become empty strings; records without a user id
    /// are skipped.
    pub fn from_record(record: &Value) -> Option<Self> {
        Some(Self {
            id: node_ref_of(record, Table::User)?,
            name: text_field(record, "name"),
            email: text_field(record, "email"),
        })
    }
}

/// A rating edge as drawn between a user and a movie
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RatingLink {
    pub id: String,
    pub source: NodeRef,
    pub target: NodeRef,
    pub score: i64,
}

impl RatingLink {
    /// Edges missing either endpoint, or with no (or a zero) score, are
    /// skipped.
    pub fn from_record(record: &Value) -> Option<Self> {
        let edge: RatingEdge = serde_json::from_value(record.clone()).ok()?;
        if edge.score == 0 {
            return None;
        }
        Some(Self {
            id: text_field(record, "id"),
            source: edge.user,
            target: edge.movie,
            score: edge.score,
        })
    }
}

/// Every user, movie and rating edge, for drawing the whole graph
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GraphSnapshot {
    pub users: Vec<UserNode>,
    pub movies: Vec<Movie>,
    pub ratings: Vec<RatingLink>,
}

/// Movie vertex for the snapshot. Unlike [`Movie::from_record`] an untitled
/// movie is kept with an empty title.
pub fn movie_node(record: &Value) -> Option<Movie> {
    Some(Movie {
        id: node_ref_of(record, Table::Movie)?,
        title: text_field(record, "title"),
        year: record
            .get("year")
            .and_then(Value::as_i64)
            .and_then(|year| i32::try_from(year).ok()),
        director: record
            .get("director")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn text_field(record: &Value, field: &str) -> String {
    record
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
