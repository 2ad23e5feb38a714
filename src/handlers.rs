// handlers.rs
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use crate::error::AppError;
use crate::identity::Identity;
use crate::models::{PollPayload, VoteRequest};
use crate::routes::AppState;
use crate::{polls, votes};

/// Create a poll with its ordered options
pub async fn create_poll(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<PollPayload>,
) -> Result<impl IntoResponse, AppError> {
    let poll = polls::create_poll(state.store.as_ref(), &identity, payload).await?;
    Ok((StatusCode::CREATED, Json(poll)))
}

/// List all polls, newest first
pub async fn list_polls(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let polls = polls::list_polls(state.store.as_ref()).await?;
    Ok(Json(polls))
}

/// Fetch one poll with its options
pub async fn get_poll(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = polls::get_poll(state.store.as_ref(), id).await?;
    Ok(Json(detail))
}

/// Replace a poll's fields and option set (owner only)
pub async fn update_poll(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<PollPayload>,
) -> Result<impl IntoResponse, AppError> {
    polls::update_poll(state.store.as_ref(), &identity, id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a poll (owner only)
pub async fn delete_poll(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    polls::delete_poll(state.store.as_ref(), &identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cast a vote; 409 when this identity already voted
pub async fn submit_vote(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(payload): Json<VoteRequest>,
) -> Result<impl IntoResponse, AppError> {
    votes::submit_vote(state.store.as_ref(), &identity, id, payload.option_id).await?;
    // The client is expected to move the voter to the results view.
    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}

/// Current tallies, recomputed per request
pub async fn poll_results(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let results = votes::compute_results(state.store.as_ref(), id).await?;
    Ok(Json(results))
}
