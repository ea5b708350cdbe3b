//! HTTP request handlers.
//!
//! Each handler reads the wall clock once and hands that instant to the
//! engine, so every gate and timestamp in one request agrees. Handlers
//! are generic over the store and dice; the router instantiates them.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;
use syndicate_core::dice::Dice;
use syndicate_core::engine::DEFAULT_LEADERBOARD_LIMIT;
use syndicate_core::store::GameStore;
use syndicate_types::{AttemptResponse, CrimeId, LeaderboardKind, PlayerId};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Longest crime slug accepted in a path.
const MAX_CRIME_ID_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /api/players`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Desired display name.
    pub name: String,
}

/// Query parameters of `GET /api/leaderboard`.
#[derive(Debug, Default, Deserialize)]
pub struct LeaderboardParams {
    /// Ordering, `xp` (default) or `cash`.
    pub by: Option<LeaderboardKind>,
    /// Maximum entries to return.
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// `GET /health`
#[allow(clippy::unused_async)]
pub async fn health<S, D>(State(state): State<Arc<AppState<S, D>>>) -> impl IntoResponse
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let uptime_secs = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds()
        .max(0);
    Json(serde_json::json!({
        "status": "ok",
        "uptime_secs": uptime_secs,
    }))
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// `POST /api/players`
pub async fn register_player<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let Json(body) = body?;
    let player = state.engine.register_player(&body.name, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// `GET /api/players/{id}`
pub async fn get_player<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError>
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let player_id = parse_player_id(&id_str)?;
    let player = state.engine.player(player_id).await?;
    Ok(Json(player))
}

/// `GET /api/players/{id}/timers/{crime_id}`
pub async fn get_timers<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    Path((id_str, crime_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError>
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let player_id = parse_player_id(&id_str)?;
    let crime_id = parse_crime_id(&crime_str)?;
    let status = state
        .engine
        .timer_status(player_id, &crime_id, Utc::now())
        .await?;
    Ok(Json(status))
}

/// `POST /api/players/{id}/crimes/{crime_id}`
///
/// Jail and cooldown rejections are `200 OK` with `success: false`; only
/// unknown IDs and infrastructure failures are HTTP errors.
pub async fn attempt_crime<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    Path((id_str, crime_str)): Path<(String, String)>,
) -> Result<Json<AttemptResponse>, ApiError>
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let player_id = parse_player_id(&id_str)?;
    let crime_id = parse_crime_id(&crime_str)?;
    let resolution = state
        .engine
        .attempt_crime(player_id, &crime_id, Utc::now())
        .await?;
    Ok(Json(resolution.into_response()))
}

// ---------------------------------------------------------------------------
// Catalog and leaderboard
// ---------------------------------------------------------------------------

/// `GET /api/crimes`
pub async fn list_crimes<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let crimes = state.engine.crimes().await?;
    Ok(Json(serde_json::json!({
        "count": crimes.len(),
        "crimes": crimes,
    })))
}

/// `GET /api/ranks`
pub async fn list_ranks<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
) -> Result<impl IntoResponse, ApiError>
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let ranks = state.engine.rank_table().await?;
    Ok(Json(serde_json::json!({
        "ranks": ranks.tiers(),
    })))
}

/// `GET /api/leaderboard?by=xp|cash&limit=N`
pub async fn leaderboard<S, D>(
    State(state): State<Arc<AppState<S, D>>>,
    params: Result<Query<LeaderboardParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    S: GameStore,
    D: Dice + Send + 'static,
{
    let Query(params) = params?;
    let kind = params.by.unwrap_or_default();
    let limit = params.limit.unwrap_or(DEFAULT_LEADERBOARD_LIMIT);
    let entries = state.engine.leaderboard(kind, limit).await?;
    Ok(Json(serde_json::json!({
        "by": kind,
        "count": entries.len(),
        "entries": entries,
    })))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a path segment as a [`PlayerId`].
fn parse_player_id(s: &str) -> Result<PlayerId, ApiError> {
    Uuid::parse_str(s)
        .map(PlayerId::from)
        .map_err(|e| ApiError::InvalidId(format!("{s}: {e}")))
}

/// Accept a crime slug of ASCII letters, digits, `_`, and `-`.
fn parse_crime_id(s: &str) -> Result<CrimeId, ApiError> {
    let well_formed = !s.is_empty()
        && s.len() <= MAX_CRIME_ID_LEN
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if well_formed {
        Ok(CrimeId::from(s))
    } else {
        Err(ApiError::InvalidId(format!("malformed crime id {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crime_slugs_are_checked() {
        assert!(parse_crime_id("car_theft").is_ok());
        assert!(parse_crime_id("bank-job2").is_ok());
        assert!(parse_crime_id("").is_err());
        assert!(parse_crime_id("drop;table").is_err());
        assert!(parse_crime_id(&"x".repeat(MAX_CRIME_ID_LEN + 1)).is_err());
    }

    #[test]
    fn player_ids_must_be_uuids() {
        assert!(parse_player_id("not-a-uuid").is_err());
        let id = PlayerId::new();
        assert_eq!(parse_player_id(&id.to_string()).ok(), Some(id));
    }
}
