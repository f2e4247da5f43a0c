use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::api::{ApiError, AppState, session::CurrentSession};

#[derive(Debug, Deserialize)]
pub struct TrackParams {
    pub track_id: Option<String>,
}

fn require_track_id(params: TrackParams) -> Result<String, ApiError> {
    params
        .track_id
        .filter(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| ApiError::BadRequest("No track ID provided".to_string()))
}

/// Track object merged with its audio features and the session's valence.
///
/// A failing audio-features lookup degrades to the bare track object.
pub async fn track(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(params): Query<TrackParams>,
) -> Result<Json<Value>, ApiError> {
    let track_id = require_track_id(params)?;
    let token = state.engine.tokens.get_valid_access_token(&session).await?;

    let mut track = state.spotify.track(&token, &track_id).await?;
    let features = match state.spotify.audio_features(&token, &track_id).await {
        Ok(features) => features,
        Err(e) => {
            warn!(track_id = %track_id, error = %e, "audio features unavailable");
            return Ok(Json(track));
        }
    };

    let mood = state.engine.current_mood(&session).await?;
    if let Some(obj) = track.as_object_mut() {
        obj.insert("audio_features".to_string(), features);
        obj.insert("valence".to_string(), json!(mood.valence));
    }
    Ok(Json(track))
}

/// Starts playback of the track on the first available device.
pub async fn play(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(params): Query<TrackParams>,
) -> Result<Response, ApiError> {
    let track_id = require_track_id(params)?;
    let token = state.engine.tokens.get_valid_access_token(&session).await?;
    let mood = state.engine.current_mood(&session).await?;

    let devices = state.spotify.devices(&token).await?;
    let Some(device_id) = devices.into_iter().find_map(|d| d.id) else {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No available playback devices", "valence": mood.valence })),
        )
            .into_response());
    };

    state.spotify.play(&token, &device_id, &track_id).await?;
    Ok(Json(json!({
        "success": true,
        "deviceId": device_id,
        "valence": mood.valence,
    }))
    .into_response())
}
