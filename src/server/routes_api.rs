use crate::actions::ActionKey;
use crate::engine::{ClickOutcome, EngineError};
use crate::server::AppContext;
use crate::state::ActionState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/actions", get(list_actions))
        .route("/actions/:key", get(get_action))
        .route("/actions/:key/click", post(click_action))
        .route("/actions/:key/play", post(play_action))
        .route("/actions/:key/pause", post(pause_action))
        .route("/actions/:key/toggle", post(toggle_action))
        .route("/actions/:key/ready", post(media_ready))
        .route("/actions/:key/ended", post(media_ended))
        .route("/playback", get(get_playback))
}

fn engine_error(err: EngineError) -> (StatusCode, String) {
    let status = match err {
        EngineError::UnknownAction(_) => StatusCode::NOT_FOUND,
        EngineError::NotActive(_) | EngineError::NotPlayable(_) => StatusCode::CONFLICT,
    };
    (status, err.to_string())
}

async fn health(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "active": ctx.engine.active_key(),
        "playing": ctx.engine.playing(),
    }))
}

async fn version() -> impl IntoResponse {
    Json(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_actions(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.engine.snapshot())
}

async fn get_action(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<ActionState>, (StatusCode, String)> {
    let key = ctx.engine.resolve(&key).map_err(engine_error)?;
    Ok(Json(ctx.engine.snapshot_one(key)))
}

#[derive(Serialize)]
struct ClickResponse {
    key: ActionKey,
    outcome: ClickOutcome,
}

async fn click_action(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<ClickResponse>, (StatusCode, String)> {
    let key = ctx.engine.resolve(&key).map_err(engine_error)?;
    let outcome = ctx.engine.click(key);
    Ok(Json(ClickResponse { key, outcome }))
}

#[derive(Serialize)]
struct PlaybackSnapshot {
    playing: Option<ActionKey>,
}

async fn play_action(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<PlaybackSnapshot>, (StatusCode, String)> {
    let key = ctx.engine.resolve(&key).map_err(engine_error)?;
    let playing = ctx.engine.play(key).map_err(engine_error)?;
    Ok(Json(PlaybackSnapshot { playing }))
}

async fn pause_action(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<PlaybackSnapshot>, (StatusCode, String)> {
    let key = ctx.engine.resolve(&key).map_err(engine_error)?;
    let playing = ctx.engine.pause(key).map_err(engine_error)?;
    Ok(Json(PlaybackSnapshot { playing }))
}

async fn toggle_action(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<PlaybackSnapshot>, (StatusCode, String)> {
    let key = ctx.engine.resolve(&key).map_err(engine_error)?;
    let playing = ctx.engine.toggle_play(key).map_err(engine_error)?;
    Ok(Json(PlaybackSnapshot { playing }))
}

async fn media_ready(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<PlaybackSnapshot>, (StatusCode, String)> {
    let key = ctx.engine.resolve(&key).map_err(engine_error)?;
    let playing = ctx.engine.media_ready(key).map_err(engine_error)?;
    Ok(Json(PlaybackSnapshot { playing }))
}

async fn media_ended(
    State(ctx): State<AppContext>,
    Path(key): Path<String>,
) -> Result<Json<PlaybackSnapshot>, (StatusCode, String)> {
    let key = ctx.engine.resolve(&key).map_err(engine_error)?;
    let playing = ctx.engine.media_ended(key);
    Ok(Json(PlaybackSnapshot { playing }))
}

async fn get_playback(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(PlaybackSnapshot {
        playing: ctx.engine.playing(),
    })
}
