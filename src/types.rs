use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

pub const DEFAULT_TEMPO: f64 = 120.0;
pub const DEFAULT_VALENCE: f64 = 0.5;

/// Opaque session identifier.
///
/// Restricted to `[A-Za-z0-9_-]` so it can name a directory in the file store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= 128
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| SessionId(raw.to_string()))
    }

    pub(crate) fn from_alphanumeric(raw: String) -> Self {
        debug_assert!(raw.chars().all(|c| c.is_ascii_alphanumeric()));
        SessionId(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Result of a token-endpoint grant.
///
/// `refresh_token` is only present when the service rotated it.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshedToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodTarget {
    pub tempo: f64,
    pub valence: f64,
}

impl Default for MoodTarget {
    fn default() -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            valence: DEFAULT_VALENCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAnalysis {
    pub track_id: String,
    pub title: String,
    pub tempo: f64,
    pub valence: f64,
}

#[derive(Tabled)]
pub struct AnalysisTableRow {
    pub track_id: String,
    pub title: String,
    pub tempo: String,
    pub valence: String,
}

impl From<&TrackAnalysis> for AnalysisTableRow {
    fn from(a: &TrackAnalysis) -> Self {
        Self {
            track_id: a.track_id.clone(),
            title: a.title.clone(),
            tempo: format!("{:.1}", a.tempo),
            valence: format!("{:.2}", a.valence),
        }
    }
}

#[derive(Tabled)]
pub struct SessionTableRow {
    pub session: String,
    pub last_seen: String,
    pub tempo: String,
    pub valence: String,
    pub analyzed: usize,
    pub played: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

// Spotify Web API payloads

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopArtistsResponse {
    pub items: Vec<Artist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

impl Track {
    /// Free-text description handed to the analysis service.
    pub fn describe(&self) -> String {
        let artists = self
            .artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        if artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} by {}", self.name, artists)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopTracksResponse {
    pub items: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default)]
    pub tracks: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevicesResponse {
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartPlaybackRequest {
    pub uris: Vec<String>,
}
