mod common;

use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cinebrain_api::{
    error::AppError,
    graph::{GraphReader, Statement},
    services::{Basis, RecommendationEngine},
};
use common::{movie, node, scenario_graph, FakeGraph};

fn engine_for(graph: Arc<FakeGraph>) -> RecommendationEngine {
    RecommendationEngine::new(GraphReader::new(graph, Duration::from_secs(2)), 10)
}

fn ids(movies: &[cinebrain_api::models::Movie]) -> Vec<String> {
    movies.iter().map(|m| m.id.to_string()).collect()
}

#[tokio::test]
async fn test_genre_and_director_signals_combine() {
    let engine = engine_for(Arc::new(scenario_graph()));

    let result = engine
        .recommend_detailed(&node("user:u"), None)
        .await
        .unwrap();

    assert_eq!(result.basis, Basis::Ranked);
    assert_eq!(ids(&result.movies), vec!["movie:m5", "movie:m3", "movie:m4"]);
    assert_eq!(result.movies[0].title, "M5");
    assert_eq!(result.movies[0].director.as_deref(), Some("D1"));
}

#[tokio::test]
async fn test_recommendations_are_deterministic() {
    let engine = engine_for(Arc::new(scenario_graph()));
    let user = node("user:u");

    let first = engine.recommend(&user, None).await.unwrap();
    let second = engine.recommend(&user, None).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_rated_movies_never_recommended() {
    let engine = engine_for(Arc::new(scenario_graph()));

    let movies = engine.recommend(&node("user:u"), Some(50)).await.unwrap();
    let returned = ids(&movies);
    assert!(!returned.contains(&"movie:m1".to_string()));
    assert!(!returned.contains(&"movie:m2".to_string()));
}

#[tokio::test]
async fn test_ranking_respects_weight_then_reference() {
    let graph = scenario_graph();
    // Extra weight-1 candidates that sort around m3/m4 by reference
    graph.respond(
        Statement::movies_in_genre(&node("genre:g2")),
        json!([{"<-belongs_to": {"<-movie": [
            movie("m2", Some("D1")),
            movie("zz", None),
            movie("m0", None)
        ]}}]),
    );
    let engine = engine_for(Arc::new(graph));

    let movies = engine.recommend(&node("user:u"), None).await.unwrap();
    assert_eq!(
        ids(&movies),
        vec!["movie:m5", "movie:m0", "movie:m3", "movie:m4", "movie:zz"]
    );

    let weights: HashMap<&str, u32> = [
        ("movie:m5", 2),
        ("movie:m0", 1),
        ("movie:m3", 1),
        ("movie:m4", 1),
        ("movie:zz", 1),
    ]
    .into();
    let returned = ids(&movies);
    for i in 0..returned.len() {
        for j in (i + 1)..returned.len() {
            let (a, b) = (&returned[i], &returned[j]);
            let (wa, wb) = (weights[a.as_str()], weights[b.as_str()]);
            assert!(wa > wb || (wa == wb && a < b), "{} before {}", a, b);
        }
    }
}

#[tokio::test]
async fn test_result_is_truncated() {
    let engine = engine_for(Arc::new(scenario_graph()));

    let movies = engine.recommend(&node("user:u"), Some(2)).await.unwrap();
    assert_eq!(ids(&movies), vec!["movie:m5", "movie:m3"]);
}

#[tokio::test]
async fn test_user_without_ratings_issues_no_fan_out() {
    let graph = Arc::new(FakeGraph::new());
    let user = node("user:newcomer");
    graph.respond(Statement::rated_movie_refs(&user), json!([{"movies": []}]));

    let result = engine_for(graph.clone())
        .recommend_detailed(&user, None)
        .await
        .unwrap();

    assert!(result.movies.is_empty());
    assert_eq!(result.basis, Basis::NoRatings);
    assert_eq!(graph.calls(), vec![Statement::rated_movie_refs(&user)]);
}

#[tokio::test]
async fn test_every_traversal_failing_yields_empty() {
    let graph = Arc::new(FakeGraph::failing());

    let movies = engine_for(graph)
        .recommend(&node("user:u"), None)
        .await
        .unwrap();
    assert!(movies.is_empty());
}

#[tokio::test]
async fn test_fan_out_failures_yield_empty_without_error() {
    let graph = scenario_graph();
    graph.fail(Statement::movies_in_genre(&node("genre:g1")));
    graph.fail(Statement::movies_in_genre(&node("genre:g2")));
    graph.fail(Statement::movies_by_director("D1"));

    let result = engine_for(Arc::new(graph))
        .recommend_detailed(&node("user:u"), None)
        .await
        .unwrap();
    assert!(result.movies.is_empty());
    assert_eq!(result.basis, Basis::SignalsUnavailable);
}

#[tokio::test]
async fn test_failed_signal_only_drops_its_own_weight() {
    let graph = scenario_graph();
    graph.fail(Statement::movies_by_director("D1"));

    let movies = engine_for(Arc::new(graph))
        .recommend(&node("user:u"), None)
        .await
        .unwrap();
    assert_eq!(ids(&movies), vec!["movie:m3", "movie:m5"]);
}

#[tokio::test]
async fn test_timed_out_signal_is_skipped() {
    let graph = scenario_graph();
    graph.stall(Statement::movies_by_director("D1"));
    let engine = RecommendationEngine::new(
        GraphReader::new(Arc::new(graph), Duration::from_millis(100)),
        10,
    );

    let movies = engine.recommend(&node("user:u"), None).await.unwrap();
    assert_eq!(ids(&movies), vec!["movie:m3", "movie:m5"]);
}

#[tokio::test]
async fn test_scope_error_in_signal_propagates() {
    let graph = scenario_graph();
    graph.respond_raw(
        Statement::movies_in_genre(&node("genre:g2")),
        json!([{"status": "ERR", "result": "The database 'movies' does not exist"}]),
    );

    let err = engine_for(Arc::new(graph))
        .recommend(&node("user:u"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Configuration(_)));
}

#[tokio::test]
async fn test_unrelated_statement_error_is_absorbed() {
    let graph = scenario_graph();
    graph.respond_raw(
        Statement::movies_in_genre(&node("genre:g2")),
        json!([
            {"status": "OK", "result": null},
            {"status": "ERR", "result": "Parse error: unexpected token"}
        ]),
    );

    let movies = engine_for(Arc::new(graph))
        .recommend(&node("user:u"), None)
        .await
        .unwrap();
    assert_eq!(ids(&movies), vec!["movie:m5", "movie:m3", "movie:m4"]);
}

#[tokio::test]
async fn test_bare_candidate_references_are_looked_up() {
    let graph = scenario_graph();
    graph.respond(
        Statement::movies_in_genre(&node("genre:g1")),
        json!([{"<-belongs_to": {"<-movie": ["movie:m1", "movie:m3", {"id": "movie:m5"}]}}]),
    );
    graph.respond(Statement::movie_by_id(&node("movie:m3")), json!([movie("m3", None)]));
    graph.respond(
        Statement::movie_by_id(&node("movie:m5")),
        json!([movie("m5", Some("D1"))]),
    );
    let graph = Arc::new(graph);

    let movies = engine_for(graph.clone())
        .recommend(&node("user:u"), None)
        .await
        .unwrap();

    assert_eq!(ids(&movies), vec!["movie:m5", "movie:m3", "movie:m4"]);
    assert_eq!(movies[1].title, "M3");

    let calls = graph.calls();
    assert!(calls.contains(&Statement::movie_by_id(&node("movie:m3"))));
    // Excluded movies are never looked up
    assert!(!calls.contains(&Statement::movie_by_id(&node("movie:m1"))));
}

#[tokio::test]
async fn test_unresolvable_bare_reference_is_dropped() {
    let graph = scenario_graph();
    graph.respond(
        Statement::movies_in_genre(&node("genre:g1")),
        json!([{"<-belongs_to": {"<-movie": ["movie:ghost", movie("m3", None)]}}]),
    );
    graph.fail(Statement::movie_by_id(&node("movie:ghost")));

    let movies = engine_for(Arc::new(graph))
        .recommend(&node("user:u"), None)
        .await
        .unwrap();
    assert_eq!(ids(&movies), vec!["movie:m3", "movie:m4", "movie:m5"]);
}

#[tokio::test]
async fn test_duplicates_count_once_per_signal() {
    let graph = scenario_graph();
    graph.respond(
        Statement::rated_movie_refs(&node("user:u")),
        json!([{"movies": ["movie:m1", "movie:m2", "movie:m1"]}]),
    );
    graph.respond(
        Statement::movies_in_genre(&node("genre:g1")),
        json!([{"<-belongs_to": {"<-movie": [
            movie("m3", None),
            movie("m3", None),
            movie("m3", None),
            movie("m5", Some("D1"))
        ]}}]),
    );

    let movies = engine_for(Arc::new(graph))
        .recommend(&node("user:u"), None)
        .await
        .unwrap();
    assert_eq!(ids(&movies), vec!["movie:m5", "movie:m3", "movie:m4"]);
}

#[tokio::test]
async fn test_sentinel_in_results_is_ignored() {
    let graph = scenario_graph();
    graph.respond_raw(
        Statement::movies_by_director("D1"),
        json!([
            {"status": "OK", "result": "Specify a namespace to use"},
            {"status": "OK", "result": [movie("m4", Some("D1"))]}
        ]),
    );

    let movies = engine_for(Arc::new(graph))
        .recommend(&node("user:u"), None)
        .await
        .unwrap();
    assert_eq!(ids(&movies), vec!["movie:m3", "movie:m4", "movie:m5"]);
}
