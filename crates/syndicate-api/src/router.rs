//! Axum router construction for the Syndicate API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use syndicate_core::dice::Dice;
use syndicate_core::store::GameStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness
/// - `POST /api/players` -- register a player
/// - `GET /api/players/{id}` -- player snapshot
/// - `GET /api/players/{id}/timers/{crime_id}` -- jail and cooldown status
/// - `POST /api/players/{id}/crimes/{crime_id}` -- attempt a crime
/// - `GET /api/crimes` -- crime catalog
/// - `GET /api/ranks` -- rank ladder
/// - `GET /api/leaderboard` -- top players by XP or cash
///
/// CORS allows any origin so a browser client can be served from
/// elsewhere during development.
pub fn build_router<S, D>(state: Arc<AppState<S, D>>) -> Router
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::<S, D>))
        .route("/api/players", post(handlers::register_player::<S, D>))
        .route("/api/players/{id}", get(handlers::get_player::<S, D>))
        .route(
            "/api/players/{id}/timers/{crime_id}",
            get(handlers::get_timers::<S, D>),
        )
        .route(
            "/api/players/{id}/crimes/{crime_id}",
            post(handlers::attempt_crime::<S, D>),
        )
        .route("/api/crimes", get(handlers::list_crimes::<S, D>))
        .route("/api/ranks", get(handlers::list_ranks::<S, D>))
        .route("/api/leaderboard", get(handlers::leaderboard::<S, D>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
