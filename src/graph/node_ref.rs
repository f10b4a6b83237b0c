use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

use crate::error::{AppError, AppResult};

const MAX_KEY_LEN: usize = 64;

/// Graph tables the service reads from
///
/// Variants are declared in alphabetical order so the derived `Ord` agrees
/// with the `table:key` string order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Genre,
    Movie,
    User,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Genre => "genre",
            Table::Movie => "movie",
            Table::User => "user",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "genre" => Some(Table::Genre),
            "movie" => Some(Table::Movie),
            "user" => Some(Table::User),
            _ => None,
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated `table:key` record identifier
///
/// Only references built through this type are ever spliced into statement
/// text, so the key grammar is deliberately narrow: ASCII letters, digits and
/// underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeRef {
    // Field order matters for the derived `Ord`.
    table: Table,
    key: String,
}

impl NodeRef {
    pub fn new(table: Table, key: &str) -> AppResult<Self> {
        if !is_valid_key(key) {
            return Err(AppError::InvalidInput(format!(
                "Invalid {} key: {:?}",
                table, key
            )));
        }
        Ok(Self {
            table,
            key: key.to_string(),
        })
    }

    /// Parses a full `table:key` reference.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let (table, key) = raw.split_once(':').ok_or_else(|| {
            AppError::InvalidInput(format!("Node reference has no table prefix: {:?}", raw))
        })?;
        let table = Table::parse(table).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown table in node reference: {:?}", raw))
        })?;
        Self::new(table, key)
    }

    /// Parses either `table:key` or a bare key belonging to `table`.
    ///
    /// A full reference pointing at another table is rejected.
    pub fn parse_in(table: Table, raw: &str) -> AppResult<Self> {
        if !raw.contains(':') {
            return Self::new(table, raw);
        }
        let node = Self::parse(raw)?;
        if node.table != table {
            return Err(AppError::InvalidInput(format!(
                "Expected a {} reference, got {:?}",
                table, raw
            )));
        }
        Ok(node)
    }

    pub fn table(&self) -> Table {
        self.table
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Display for NodeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.table, self.key)
    }
}

impl FromStr for NodeRef {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodeRef {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NodeRef> for String {
    fn from(node: NodeRef) -> Self {
        node.to_string()
    }
}

/// Reads a reference of the given table out of a store value.
///
/// The store returns linked records either as a bare `"table:key"` string or,
/// when fetched, as an object carrying an `id` field. Anything else yields
/// `None`.
pub fn node_ref_of(value: &Value, table: Table) -> Option<NodeRef> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("id")?.as_str()?,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) => return None,
    };
    match NodeRef::parse(raw) {
        Ok(node) if node.table == table => Some(node),
        Ok(_) => None,
        Err(e) => {
            tracing::trace!(reference = %raw, error = %e, "Skipping unparseable node reference");
            None
        }
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Whether `name` can be used unquoted as a namespace or database name.
pub fn is_identifier(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {}
        _ => return false,
    }
    name.len() <= MAX_KEY_LEN && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
