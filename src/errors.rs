//! Error kinds surfaced by the mood engine.
//!
//! Every failure is scoped to a single request and session. Expected
//! outcomes such as "not authenticated" or "nothing to play" are ordinary
//! variants here and callers branch on them.

use std::fmt;

use thiserror::Error;

/// The external service an [`EngineError::Upstream`] originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    TokenEndpoint,
    MusicService,
    AnalysisService,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collaborator::TokenEndpoint => "token endpoint",
            Collaborator::MusicService => "music service",
            Collaborator::AnalysisService => "analysis service",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    /// No token pair for the session and no way to obtain one.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The refresh grant failed and there is no access token to fall back to.
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    /// Neither the analysis cache nor the recommender produced a track.
    #[error("No candidates: {0}")]
    NoCandidates(String),

    /// Non-success response or transport failure from an external service.
    #[error("Upstream error from {collaborator}: {message}")]
    Upstream {
        collaborator: Collaborator,
        message: String,
    },

    /// The analysis service gave no usable (tempo, valence) estimate.
    #[error("Analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    pub fn upstream(collaborator: Collaborator, message: impl Into<String>) -> Self {
        EngineError::Upstream {
            collaborator,
            message: message.into(),
        }
    }

    /// Whether the caller has to go through the OAuth flow again.
    pub fn is_auth_required(&self) -> bool {
        matches!(
            self,
            EngineError::NotAuthenticated | EngineError::TokenRefreshFailed(_)
        )
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
