use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::{
    api::{
        ApiError, AppState, PendingLogin,
        session::{CurrentSession, expired_session_cookie, session_cookie, session_from_headers},
    },
    utils,
};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

async fn begin_login(state: &AppState) -> Result<String, ApiError> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let oauth_state = utils::generate_state();

    let url = state.authorizer.url(&oauth_state, &code_challenge)?;
    state
        .remember_login(
            oauth_state,
            PendingLogin {
                code_verifier,
                created_at: Utc::now(),
            },
        )
        .await;
    Ok(url)
}

pub async fn authorize(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let url = begin_login(&state).await?;
    Ok(Json(json!({ "authUrl": url })))
}

pub async fn login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let url = begin_login(&state).await?;
    Ok(Redirect::to(&url))
}

fn failed(state: &AppState, reason: &str) -> Response {
    let separator = if state.frontend_url.contains('?') { '&' } else { '?' };
    Redirect::to(&format!("{}{separator}error={reason}", state.frontend_url)).into_response()
}

/// Completes the login. A request that already carries a known session is
/// reconnected in place; otherwise a new session is created.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(error) = params.error {
        warn!(error = %error, "authorization denied");
        return failed(&state, "authorization_failed");
    }

    let pending = match params.state {
        Some(s) => state.take_login(&s).await,
        None => None,
    };
    let Some(pending) = pending else {
        warn!("oauth state mismatch");
        return failed(&state, "state_mismatch");
    };
    let Some(code) = params.code else {
        return failed(&state, "missing_code");
    };

    let pair = match state.engine.tokens.exchange(&code, &pending.code_verifier).await {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "token exchange failed");
            return failed(&state, "authentication_failed");
        }
    };

    let existing = match session_from_headers(&headers) {
        Some(session) => match state.engine.sessions.meta(&session).await {
            Ok(Some(_)) => Some(session),
            _ => None,
        },
        None => None,
    };
    let outcome = match existing {
        Some(session) => state
            .engine
            .reconnect(&session, &pair)
            .await
            .map(|()| session),
        None => state.engine.begin_session(&pair).await,
    };

    match outcome {
        Ok(session) => {
            info!(session = %session, "login completed");
            (
                AppendHeaders([(SET_COOKIE, session_cookie(&session))]),
                Redirect::to(&state.frontend_url),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "could not create session");
            failed(&state, "authentication_failed")
        }
    }
}

pub async fn check_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let authenticated = match session_from_headers(&headers) {
        Some(session) => state.engine.tokens.is_authenticated(&session).await?,
        None => false,
    };
    Ok(Json(json!({ "authenticated": authenticated })))
}

/// Signs the session out of Spotify; mood, history and cache stay.
pub async fn disconnect(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Value>, ApiError> {
    state.engine.disconnect(&session).await?;
    info!(session = %session, "spotify tokens revoked");
    Ok(Json(json!({ "disconnected": true })))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<impl IntoResponse, ApiError> {
    state.engine.end_session(&session).await?;
    Ok((
        AppendHeaders([(SET_COOKIE, expired_session_cookie())]),
        Json(json!({ "logged_out": true })),
    ))
}
