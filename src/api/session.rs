use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
};

use crate::{api::AppState, errors::EngineError, types::SessionId, utils};

pub const SESSION_COOKIE: &str = "moodtune_session";
pub const SESSION_HEADER: &str = "x-session-id";

/// Session named by the `moodtune_session` cookie, or by the
/// `X-Session-Id` header for non-browser clients.
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|h| utils::cookie_value(h, SESSION_COOKIE));

    let from_header = || {
        headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
    };

    from_cookie.or_else(from_header).and_then(SessionId::parse)
}

pub fn session_cookie(session: &SessionId) -> String {
    format!("{SESSION_COOKIE}={session}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Extractor for a known session; bumps its `last_seen`.
///
/// Rejects with 401 when the request names no session or an unknown one.
pub struct CurrentSession(pub SessionId);

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = EngineError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = session_from_headers(&parts.headers).ok_or(EngineError::NotAuthenticated)?;
        if !state.engine.sessions.touch(&session).await? {
            return Err(EngineError::NotAuthenticated);
        }
        Ok(CurrentSession(session))
    }
}
