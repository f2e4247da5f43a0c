//! # Spotify integration
//!
//! HTTP clients for the two Spotify services moodtune talks to:
//!
//! - [`auth`] - accounts service: authorization URL construction and the
//!   `authorization_code` / `refresh_token` grants ([`SpotifyAccounts`]
//!   implements [`TokenEndpoint`](crate::management::TokenEndpoint)).
//! - [`tracks`] - Web API: top artists and tracks, seeded recommendations,
//!   track lookup, audio features and playback control ([`SpotifyClient`]
//!   implements [`MusicService`](crate::engine::MusicService)).
//!
//! ## Error handling
//!
//! Transport failures and non-success statuses become
//! [`EngineError::Upstream`] naming the collaborator. A failed refresh grant
//! becomes [`EngineError::TokenRefreshFailed`]. Nothing here retries; the
//! caller decides.
//!
//! ## Endpoints
//!
//! - `POST /api/token` - token exchange and refresh
//! - `GET /me/top/artists`, `GET /me/top/tracks` - recommendation seeds
//! - `GET /recommendations` - seeded recommendations with tempo/valence targets
//! - `GET /tracks/{id}`, `GET /audio-features/{id}` - track details
//! - `GET /me/player/devices`, `PUT /me/player/play` - playback

pub mod auth;
pub mod tracks;

pub use auth::{Authorizer, SpotifyAccounts};
pub use tracks::SpotifyClient;

use crate::errors::{Collaborator, EngineError};

pub(crate) fn transport_error(collaborator: Collaborator, err: reqwest::Error) -> EngineError {
    EngineError::upstream(collaborator, err.to_string())
}
