#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use cinebrain_api::{
    error::{AppError, AppResult},
    graph::{GraphStore, NodeRef, Statement},
};

#[derive(Clone)]
enum Reply {
    Raw(Value),
    Fail,
    Stall,
}

/// In-memory graph store answering canned responses per statement
pub struct FakeGraph {
    replies: Mutex<HashMap<Statement, Reply>>,
    calls: Mutex<Vec<Statement>>,
    fail_unknown: bool,
}

impl FakeGraph {
    /// Unknown statements return an empty result set.
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_unknown: false,
        }
    }

    /// Unknown statements fail like an unreachable store.
    pub fn failing() -> Self {
        Self {
            fail_unknown: true,
            ..Self::new()
        }
    }

    /// Answers `statement` the way the store does over HTTP: the `USE`
    /// directive's outcome followed by the statement's own.
    pub fn respond(&self, statement: Statement, result: Value) {
        self.respond_raw(
            statement,
            json!([
                {"status": "OK", "time": "12µs", "result": null},
                {"status": "OK", "time": "1ms", "result": result}
            ]),
        );
    }

    pub fn respond_raw(&self, statement: Statement, raw: Value) {
        self.replies
            .lock()
            .unwrap()
            .insert(statement, Reply::Raw(raw));
    }

    pub fn fail(&self, statement: Statement) {
        self.replies.lock().unwrap().insert(statement, Reply::Fail);
    }

    pub fn stall(&self, statement: Statement) {
        self.replies.lock().unwrap().insert(statement, Reply::Stall);
    }

    pub fn calls(&self) -> Vec<Statement> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl GraphStore for FakeGraph {
    async fn execute(&self, statement: &Statement) -> AppResult<Value> {
        self.calls.lock().unwrap().push(statement.clone());
        let reply = self.replies.lock().unwrap().get(statement).cloned();

        match reply {
            Some(Reply::Raw(raw)) => Ok(raw),
            Some(Reply::Fail) => Err(AppError::GraphStore("connection refused".to_string())),
            Some(Reply::Stall) => {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(Value::Null)
            }
            None if self.fail_unknown => {
                Err(AppError::GraphStore("connection refused".to_string()))
            }
            None => Ok(json!([
                {"status": "OK", "result": null},
                {"status": "OK", "result": []}
            ])),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

pub fn node(raw: &str) -> NodeRef {
    NodeRef::parse(raw).unwrap()
}

pub fn movie(key: &str, director: Option<&str>) -> Value {
    json!({
        "id": format!("movie:{}", key),
        "title": key.to_uppercase(),
        "year": 2000,
        "director": director,
        "featured": true
    })
}

/// User `u` rated m1 (genre g1, director D1) and m2 (genre g2, director D1).
/// Unrated: m3 (genre g1), m4 (director D1), m5 (genre g1, director D1).
pub fn scenario_graph() -> FakeGraph {
    let graph = FakeGraph::new();
    let user = node("user:u");

    graph.respond(
        Statement::rated_movie_refs(&user),
        json!([{"movies": ["movie:m1", "movie:m2"]}]),
    );
    graph.respond(
        Statement::rated_movies(&user),
        json!([{"movies": [movie("m1", Some("D1")), movie("m2", Some("D1"))]}]),
    );
    graph.respond(
        Statement::rated_genres(&user),
        json!([{"->rated": {"->movie": {"->belongs_to": {"->genre": [["genre:g1"], ["genre:g2"]]}}}}]),
    );
    graph.respond(
        Statement::movies_in_genre(&node("genre:g1")),
        json!([{"<-belongs_to": {"<-movie": [
            movie("m1", Some("D1")),
            movie("m3", None),
            movie("m5", Some("D1"))
        ]}}]),
    );
    graph.respond(
        Statement::movies_in_genre(&node("genre:g2")),
        json!([{"<-belongs_to": {"<-movie": [movie("m2", Some("D1"))]}}]),
    );
    graph.respond(
        Statement::movies_by_director("D1"),
        json!([
            movie("m1", Some("D1")),
            movie("m2", Some("D1")),
            movie("m4", Some("D1")),
            movie("m5", Some("D1"))
        ]),
    );

    graph
}
