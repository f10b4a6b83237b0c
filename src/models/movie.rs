use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::{node_ref_of, NodeRef, Table};

/// A movie as returned to clients
///
/// Extra store fields (`featured`, ...) are ignored when reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: NodeRef,
    pub title: String,
    pub year: Option<i32>,
    pub director: Option<String>,
}

impl Movie {
    /// Reads a full movie record; `None` for anything that is not one.
    pub fn from_record(record: &Value) -> Option<Self> {
        let movie: Movie = serde_json::from_value(record.clone()).ok()?;
        (movie.id.table() == Table::Movie).then_some(movie)
    }

    /// Director name with surrounding whitespace removed, if any is left
    pub fn director_name(&self) -> Option<&str> {
        self.director
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// A movie as it appears inside a traversal result
///
/// Fetched links come back as full records, unfetched ones as a bare
/// reference that still needs a point lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieEntry {
    Full(Movie),
    Bare(NodeRef),
}

impl MovieEntry {
    pub fn classify(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => node_ref_of(value, Table::Movie).map(MovieEntry::Bare),
            Value::Object(map) if map.contains_key("title") => {
                Movie::from_record(value).map(MovieEntry::Full)
            }
            Value::Object(_) => node_ref_of(value, Table::Movie).map(MovieEntry::Bare),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) => None,
        }
    }

    pub fn id(&self) -> &NodeRef {
        match self {
            MovieEntry::Full(movie) => &movie.id,
            MovieEntry::Bare(id) => id,
        }
    }
}
