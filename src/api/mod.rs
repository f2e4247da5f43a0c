//! # API Module
//!
//! HTTP endpoints of the moodtune server, built on [Axum](https://docs.rs/axum).
//! Handlers stay thin: they resolve the session, call into the
//! [`MoodEngine`] or the [`SpotifyClient`], and map [`EngineError`] kinds to
//! status codes (see [`ApiError`]).
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`authorize`] / [`login`] - start the OAuth authorization-code flow (PKCE + state)
//! - [`callback`] - complete it, create the session and set its cookie
//! - [`check_auth`] - whether the caller's session holds a token
//! - [`disconnect`] - drop the session's Spotify tokens, keep its mood state
//! - [`logout`] - destroy the session
//!
//! ### Mood matching
//!
//! - [`update_mood_query`] / [`update_mood_body`] - set tempo and/or valence
//! - [`current_mood`] - read the stored target
//! - [`next_track`] - pick the next track
//! - [`refresh_analysis`] / [`list_analysis`] - maintain the analysis cache
//!
//! ### Playback
//!
//! - [`track`] - track details with audio features
//! - [`play`] - start playback on the first available device
//!
//! ### Monitoring
//!
//! - [`health`] - status and version
//!
//! Sessions are identified by the `moodtune_session` cookie or the
//! `X-Session-Id` header.
//!
//! [`EngineError`]: crate::errors::EngineError

mod callback;
mod error;
mod health;
mod mood;
mod player;
pub mod session;
mod tracks;

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

pub use callback::{authorize, callback, check_auth, disconnect, login, logout};
pub use error::ApiError;
pub use health::health;
pub use mood::{current_mood, update_mood_body, update_mood_query};
pub use player::{play, track};
pub use tracks::{list_analysis, next_track, refresh_analysis};

use crate::{
    engine::MoodEngine,
    spotify::{Authorizer, SpotifyClient},
};

const PENDING_LOGIN_TTL_MINUTES: i64 = 10;

/// PKCE verifier of a login that has not reached the callback yet.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub code_verifier: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MoodEngine>,
    pub spotify: Arc<SpotifyClient>,
    pub authorizer: Arc<Authorizer>,
    pub frontend_url: String,
    pending: Arc<Mutex<HashMap<String, PendingLogin>>>,
}

impl AppState {
    pub fn new(
        engine: Arc<MoodEngine>,
        spotify: Arc<SpotifyClient>,
        authorizer: Arc<Authorizer>,
        frontend_url: String,
    ) -> Self {
        Self {
            engine,
            spotify,
            authorizer,
            frontend_url,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Stores a login under its `state`, dropping logins older than ten minutes.
    pub async fn remember_login(&self, state: String, login: PendingLogin) {
        let cutoff = Utc::now() - Duration::minutes(PENDING_LOGIN_TTL_MINUTES);
        let mut pending = self.pending.lock().await;
        pending.retain(|_, p| p.created_at > cutoff);
        pending.insert(state, login);
    }

    /// Removes and returns the login for `state`; a state is usable once.
    pub async fn take_login(&self, state: &str) -> Option<PendingLogin> {
        self.pending.lock().await.remove(state)
    }
}
