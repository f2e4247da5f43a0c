use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use serde::Deserialize;

use crate::{
    api::{ApiError, AppState, session::CurrentSession},
    types::MoodTarget,
};

#[derive(Debug, Default, Deserialize)]
pub struct MoodParams {
    pub tempo: Option<f64>,
    pub valence: Option<f64>,
}

pub async fn update_mood_query(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(params): Query<MoodParams>,
) -> Result<Json<MoodTarget>, ApiError> {
    let target = state
        .engine
        .update_mood(&session, params.tempo, params.valence)
        .await?;
    Ok(Json(target))
}

/// Accepts the fields as a JSON body, the query string, or both; body wins.
pub async fn update_mood_body(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<MoodParams>,
    body: Bytes,
) -> Result<Json<MoodTarget>, ApiError> {
    let from_body: MoodParams = if body.iter().all(u8::is_ascii_whitespace) {
        MoodParams::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid mood payload: {e}")))?
    };

    let target = state
        .engine
        .update_mood(
            &session,
            from_body.tempo.or(query.tempo),
            from_body.valence.or(query.valence),
        )
        .await?;
    Ok(Json(target))
}

pub async fn current_mood(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<MoodTarget>, ApiError> {
    Ok(Json(state.engine.current_mood(&session).await?))
}
