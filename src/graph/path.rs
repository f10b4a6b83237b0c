use serde_json::Value;

/// Collects the values reached by walking `segments` through a record.
///
/// The store keys nested traversal results by the literal arrow token used in
/// the query (`"->rated"`, `"<-movie"`, ...). Each segment is looked up in the
/// current mapping; an intermediate sequence of mappings is walked element by
/// element. The value at the end of the path must be a sequence, and nested
/// sequences inside it are flattened.
///
/// Absent segments and unexpected shapes yield an empty result: nodes with no
/// outgoing edges at some hop are normal, not an error.
pub fn extract<S: AsRef<str>>(record: &Value, segments: &[S]) -> Vec<Value> {
    let mut found = Vec::new();
    descend(record, segments, &mut found);
    found
}

fn descend<S: AsRef<str>>(current: &Value, segments: &[S], found: &mut Vec<Value>) {
    let Some((segment, rest)) = segments.split_first() else {
        flatten_into(current, found);
        return;
    };

    match current {
        Value::Object(map) => match map.get(segment.as_ref()) {
            Some(next) => descend(next, rest, found),
            None => tracing::trace!(segment = segment.as_ref(), "Traversal segment absent"),
        },
        Value::Array(items) => {
            for item in items {
                descend(item, segments, found);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            tracing::trace!(
                segment = segment.as_ref(),
                "Expected a mapping while walking traversal result"
            );
        }
    }
}

fn flatten_into(value: &Value, found: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Array(_) => flatten_into(item, found),
                    other => found.push(other.clone()),
                }
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Object(_) => {
            tracing::trace!("Expected a sequence at the end of a traversal path");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::query::{GENRE_MOVIES, RATED_GENRES};
    use serde_json::json;

    #[test]
    fn test_walks_arrow_keys() {
        let record = json!({
            "->rated": {"->movie": {"->belongs_to": {"->genre": ["genre:a", "genre:b"]}}}
        });
        assert_eq!(
            extract(&record, &RATED_GENRES.segments()),
            vec![json!("genre:a"), json!("genre:b")]
        );
    }

    #[test]
    fn test_missing_intermediate_segment_is_empty() {
        let record = json!({"->rated": {"->movie": {}}});
        assert!(extract(&record, &RATED_GENRES.segments()).is_empty());

        let record = json!({"->rated": {"->movie": {"->belongs_to": null}}});
        assert!(extract(&record, &RATED_GENRES.segments()).is_empty());
    }

    #[test]
    fn test_scalar_where_mapping_expected_is_empty() {
        let record = json!({"<-belongs_to": "movie:heat"});
        assert!(extract(&record, &GENRE_MOVIES.segments()).is_empty());
        assert!(extract(&json!(12), &GENRE_MOVIES.segments()).is_empty());
    }

    #[test]
    fn test_final_value_must_be_sequence() {
        let record = json!({"<-belongs_to": {"<-movie": {"id": "movie:heat"}}});
        assert!(extract(&record, &GENRE_MOVIES.segments()).is_empty());
    }

    #[test]
    fn test_nested_sequences_are_flattened() {
        let record = json!({
            "->rated": {"->movie": {"->belongs_to": {"->genre": [["genre:a"], ["genre:b", "genre:a"], []]}}}
        });
        assert_eq!(
            extract(&record, &RATED_GENRES.segments()),
            vec![json!("genre:a"), json!("genre:b"), json!("genre:a")]
        );
    }

    #[test]
    fn test_intermediate_sequence_fans_out() {
        let record = json!({
            "<-belongs_to": [
                {"<-movie": [{"id": "movie:a"}]},
                {"unrelated": true},
                {"<-movie": [{"id": "movie:b"}]}
            ]
        });
        assert_eq!(
            extract(&record, &GENRE_MOVIES.segments()),
            vec![json!({"id": "movie:a"}), json!({"id": "movie:b"})]
        );
    }

    #[test]
    fn test_plain_field_segments() {
        let record = json!({"movies": ["movie:a", "movie:b"]});
        assert_eq!(extract(&record, &["movies"]).len(), 2);
        assert!(extract(&record, &["missing"]).is_empty());
    }

    #[test]
    fn test_empty_path() {
        let none: [&str; 0] = [];
        assert_eq!(extract(&json!([1, 2]), &none), vec![json!(1), json!(2)]);
        assert!(extract(&json!({"a": 1}), &none).is_empty());
    }
}
