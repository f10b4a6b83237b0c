use serde_json::{Map, Value};

use super::Record;
use crate::error::{AppError, AppResult};

/// Placeholder the store returns as a successful result when no scope is set
pub const NAMESPACE_SENTINEL: &str = "Specify a namespace to use";

const SENTINEL_PREFIX: &str = "Specify";

/// Keys a statement outcome may carry. An object holding `result` and nothing
/// outside this set is treated as an (untagged) statement outcome.
const STATEMENT_KEYS: [&str; 4] = ["result", "time", "status", "detail"];

/// Flattens a raw store response into an ordered list of records.
///
/// Statement-level errors are skipped, except errors mentioning the
/// namespace or database: those mean the service is misconfigured and fail
/// the whole call with [`AppError::Configuration`]. Shapes that are not
/// understood contribute nothing instead of failing.
pub fn normalize(raw: Value) -> AppResult<Vec<Record>> {
    let mut records = Vec::new();

    match raw {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(map) if is_statement(&map) => {
                        apply_statement(map, &mut records)?
                    }
                    other => push_record(other, &mut records),
                }
            }
        }
        Value::Object(map) if is_statement(&map) => apply_statement(map, &mut records)?,
        // A bare payload is one implicit successful statement.
        other => push_payload(other, &mut records),
    }

    Ok(records)
}

/// Whether an error text points at the namespace/database scope.
pub(crate) fn mentions_scope(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("namespace") || lower.contains("database")
}

/// A statement outcome either carries an `OK`/`ERR` status or holds `result`
/// with no keys outside [`STATEMENT_KEYS`]. Any other object is data, even
/// when it has a `status` field of its own.
fn is_statement(map: &Map<String, Value>) -> bool {
    let tagged = map
        .get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| {
            status.eq_ignore_ascii_case("OK") || status.eq_ignore_ascii_case("ERR")
        });
    tagged
        || (map.contains_key("result")
            && map.keys().all(|k| STATEMENT_KEYS.contains(&k.as_str())))
}

fn apply_statement(mut map: Map<String, Value>, records: &mut Vec<Record>) -> AppResult<()> {
    let status = map
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_ascii_uppercase);

    match status.as_deref() {
        Some("ERR") => {
            let message = error_text(&map);
            if mentions_scope(&message) {
                tracing::error!(error = %message, "Graph store rejected the configured scope");
                return Err(AppError::Configuration(message));
            }
            tracing::warn!(error = %message, "Skipping failed graph statement");
        }
        Some("OK") | None => {
            if let Some(payload) = map.remove("result") {
                push_payload(payload, records);
            }
        }
        Some(other) => {
            tracing::debug!(status = %other, "Ignoring statement with unknown status");
        }
    }

    Ok(())
}

fn error_text(map: &Map<String, Value>) -> String {
    match (map.get("result"), map.get("detail")) {
        (Some(Value::String(text)), _) => text.clone(),
        (_, Some(Value::String(text))) => text.clone(),
        (Some(other), _) => other.to_string(),
        (None, _) => "Unknown error".to_string(),
    }
}

/// Unwraps one statement payload: sequences are flattened one level, `null`
/// contributes nothing.
fn push_payload(payload: Value, records: &mut Vec<Record>) {
    match payload {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                push_record(item, records);
            }
        }
        other => push_record(other, records),
    }
}

fn push_record(record: Value, records: &mut Vec<Record>) {
    if let Value::String(text) = &record {
        if text.starts_with(SENTINEL_PREFIX) {
            tracing::debug!(text = %text, "Dropping namespace sentinel from graph result");
            return;
        }
    }
    records.push(record);
}
