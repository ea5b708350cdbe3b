//! Integration tests for the Syndicate API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, over an in-memory store and scripted dice.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use syndicate_api::router::build_router;
use syndicate_api::state::AppState;
use syndicate_core::CrimeEngine;
use syndicate_core::RankTable;
use syndicate_core::dice::ScriptedDice;
use syndicate_core::memory::InMemoryStore;
use syndicate_types::{CrimeDefinition, CrimeId, RankTier};
use tower::ServiceExt;

fn crime(id: &str, success_rate: f64, cooldown_secs: u64) -> CrimeDefinition {
    CrimeDefinition {
        id: CrimeId::from(id),
        name: id.to_owned(),
        description: String::new(),
        min_reward: 50,
        max_reward: 50,
        success_rate,
        cooldown_secs,
        xp_award: 10,
    }
}

/// Router over a two-crime catalog, rolling `unit` on every attempt.
fn make_router(unit: f64) -> Router {
    let ranks = RankTable::new(vec![
        RankTier::new("Street Rat", 0),
        RankTier::new("Thug", 10),
    ])
    .unwrap();
    let store = Arc::new(InMemoryStore::with_catalog(
        vec![crime("mugging", 0.5, 60), crime("pickpocket", 0.9, 30)],
        ranks,
    ));
    let engine = CrimeEngine::new(store, ScriptedDice::always(unit));
    build_router(Arc::new(AppState::new(engine)))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::post(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, json: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

async fn register(router: &Router, name: &str) -> String {
    let (status, json) = send(
        router,
        post_json("/api/players", &serde_json::json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["id"].as_str().unwrap().to_owned()
}

// ---------------------------------------------------------------------------
// Health and catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let router = make_router(0.0);
    let (status, json) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn crimes_lists_catalog() {
    let router = make_router(0.0);
    let (status, json) = send(&router, get("/api/crimes")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["crimes"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn ranks_lists_ladder() {
    let router = make_router(0.0);
    let (status, json) = send(&router, get("/api/ranks")).await;
    assert_eq!(status, StatusCode::OK);
    let ranks = json["ranks"].as_array().unwrap();
    assert_eq!(ranks.len(), 2);
    assert_eq!(ranks[1]["label"], "Thug");
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[tokio::test]
async fn register_then_fetch_player() {
    let router = make_router(0.0);
    let id = register(&router, "Vito").await;

    let (status, json) = send(&router, get(&format!("/api/players/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Vito");
    assert_eq!(json["rank"], "Street Rat");
    assert_eq!(json["cash"], 0);
}

#[tokio::test]
async fn duplicate_name_is_conflict() {
    let router = make_router(0.0);
    register(&router, "Vito").await;

    let (status, json) = send(
        &router,
        post_json("/api/players", &serde_json::json!({ "name": "vito" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);
}

#[tokio::test]
async fn blank_name_is_bad_request() {
    let router = make_router(0.0);
    let (status, json) = send(
        &router,
        post_json("/api/players", &serde_json::json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn malformed_register_body_gets_json_error() {
    let router = make_router(0.0);
    let request = Request::post("/api/players")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, json) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].is_string());

    let (status, json) = send(
        &router,
        post_json("/api/players", &serde_json::json!({ "alias": "Vito" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["status"], 422);
}

#[tokio::test]
async fn register_without_content_type_gets_json_error() {
    let router = make_router(0.0);
    let request = Request::post("/api/players")
        .body(Body::from(r#"{"name":"Vito"}"#))
        .unwrap();
    let (status, json) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(json["status"], 415);
}

#[tokio::test]
async fn unknown_player_is_not_found() {
    let router = make_router(0.0);
    let uri = format!("/api/players/{}", uuid::Uuid::now_v7());
    let (status, json) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], 404);
}

#[tokio::test]
async fn malformed_player_id_is_bad_request() {
    let router = make_router(0.0);
    let (status, _) = send(&router, get("/api/players/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Attempts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_attempt_then_cooldown() {
    let router = make_router(0.0);
    let id = register(&router, "Vito").await;
    let uri = format!("/api/players/{id}/crimes/mugging");

    let (status, json) = send(&router, post_empty(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["outcome"], "success");
    assert_eq!(json["reward"], 50);
    assert_eq!(json["xp_gained"], 10);
    assert_eq!(json["player"]["cash"], 50);
    assert_eq!(json["player"]["rank"], "Thug");
    assert!(json["jailed_until"].is_null());
    assert!(json["message"].as_str().unwrap().contains("50"));

    let (status, json) = send(&router, post_empty(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["outcome"], "on_cooldown");
    assert_eq!(json["reward"], 0);
    let remaining = json["remaining_secs"].as_u64().unwrap();
    assert!((1..=60).contains(&remaining));
    assert_eq!(json["player"]["cash"], 50);
}

#[tokio::test]
async fn failed_attempt_jails_across_crimes() {
    let router = make_router(0.99);
    let id = register(&router, "Vito").await;

    let (status, json) = send(
        &router,
        post_empty(&format!("/api/players/{id}/crimes/mugging")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], false);
    assert_eq!(json["outcome"], "failure");
    assert!(json["jailed_until"].is_string());

    let (status, json) = send(
        &router,
        post_empty(&format!("/api/players/{id}/crimes/pickpocket")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"], "jailed");
    assert!(json["remaining_secs"].as_u64().unwrap() >= 1);
    assert_eq!(json["player"]["counters"]["total"], 1);
}

#[tokio::test]
async fn unknown_crime_is_not_found() {
    let router = make_router(0.0);
    let id = register(&router, "Vito").await;
    let (status, _) = send(
        &router,
        post_empty(&format!("/api/players/{id}/crimes/arson")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_crime_id_is_bad_request() {
    let router = make_router(0.0);
    let id = register(&router, "Vito").await;
    let (status, _) = send(
        &router,
        post_empty(&format!("/api/players/{id}/crimes/bad$id")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attempt_for_unknown_player_is_not_found() {
    let router = make_router(0.0);
    let uri = format!("/api/players/{}/crimes/mugging", uuid::Uuid::now_v7());
    let (status, _) = send(&router, post_empty(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Timers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn timers_reflect_cooldown() {
    let router = make_router(0.0);
    let id = register(&router, "Vito").await;
    let timers = format!("/api/players/{id}/timers/mugging");

    let (status, json) = send(&router, get(&timers)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], true);
    assert!(json["cooldown_remaining_secs"].is_null());

    send(&router, post_empty(&format!("/api/players/{id}/crimes/mugging"))).await;

    let (_, json) = send(&router, get(&timers)).await;
    assert_eq!(json["available"], false);
    assert!(json["cooldown_remaining_secs"].as_u64().unwrap() >= 1);
    assert!(json["jail_remaining_secs"].is_null());

    let (_, other) = send(&router, get(&format!("/api/players/{id}/timers/pickpocket"))).await;
    assert_eq!(other["available"], true);
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[tokio::test]
async fn leaderboard_orders_by_xp_by_default() {
    let router = make_router(0.0);
    let rich = register(&router, "Vito").await;
    register(&router, "Sonny").await;
    send(
        &router,
        post_empty(&format!("/api/players/{rich}/crimes/mugging")),
    )
    .await;

    let (status, json) = send(&router, get("/api/leaderboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["by"], "xp");
    assert_eq!(json["count"], 2);
    assert_eq!(json["entries"][0]["name"], "Vito");
    assert_eq!(json["entries"][0]["position"], 1);

    let (_, json) = send(&router, get("/api/leaderboard?by=cash&limit=1")).await;
    assert_eq!(json["by"], "cash");
    assert_eq!(json["count"], 1);
    assert_eq!(json["entries"][0]["cash"], 50);
}

#[tokio::test]
async fn leaderboard_rejects_unknown_ordering() {
    let router = make_router(0.0);
    let (status, json) = send(&router, get("/api/leaderboard?by=charisma")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let router = make_router(0.0);
    let response = router.oneshot(get("/api/nothing")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
