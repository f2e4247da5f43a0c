use std::sync::Arc;

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{
    api::{ApiError, AppState, session::CurrentSession},
    engine::RefreshSummary,
    types::TrackAnalysis,
};

// Engine work runs in its own task: if the client goes away mid-request the
// outbound call still completes and history stays consistent with it.

pub async fn next_track(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Value>, ApiError> {
    let engine = Arc::clone(&state.engine);
    let track_id = tokio::spawn(async move { engine.next_track(&session).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(json!({ "track_id": track_id })))
}

pub async fn refresh_analysis(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<RefreshSummary>, ApiError> {
    let engine = Arc::clone(&state.engine);
    let summary = tokio::spawn(async move { engine.refresh_analysis(&session).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(summary))
}

pub async fn list_analysis(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<TrackAnalysis>>, ApiError> {
    Ok(Json(state.engine.cache.all(&session).await?))
}
