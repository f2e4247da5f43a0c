//! Configuration management for moodtune.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Lookup order:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf};

use chrono::Duration;

use crate::errors::{EngineError, Result};

const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_SCOPE: &str = "user-read-playback-state user-modify-playback-state user-read-currently-playing streaming app-remote-control user-read-email user-top-read";
const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
const DEFAULT_SESSION_TTL_MINUTES: i64 = 720;

/// Platform data directory for moodtune, e.g. `~/.local/share/moodtune` on Linux.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("moodtune");
    path
}

/// Data directory honouring `MOODTUNE_DATA_DIR`.
///
/// The override lets several servers, or tests, keep separate session
/// stores. Without it this is [`data_dir`].
pub fn resolve_data_dir() -> PathBuf {
    optional("MOODTUNE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(data_dir)
}

/// Session TTL from `MOODTUNE_SESSION_TTL_MINUTES`, or the default of 12 hours.
///
/// # Errors
///
/// Returns [`EngineError::Config`] when the variable is set but is not a
/// positive integer.
///
/// # Example
///
/// ```ignore
/// // MOODTUNE_SESSION_TTL_MINUTES=90
/// assert_eq!(config::session_ttl()?, chrono::Duration::minutes(90));
/// ```
pub fn session_ttl() -> Result<Duration> {
    let minutes = match optional("MOODTUNE_SESSION_TTL_MINUTES") {
        Some(raw) => raw.parse::<i64>().ok().filter(|m| *m > 0).ok_or_else(|| {
            EngineError::Config(format!(
                "MOODTUNE_SESSION_TTL_MINUTES must be a positive integer, got {raw}"
            ))
        })?,
        None => DEFAULT_SESSION_TTL_MINUTES,
    };
    Ok(Duration::minutes(minutes))
}

/// Loads environment variables from `<data_dir>/.env`.
///
/// Creates the data directory when missing. An absent `.env` file is not an
/// error: every value can also be supplied through the process environment.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/moodtune/.env`
/// - macOS: `~/Library/Application Support/moodtune/.env`
/// - Windows: `%LOCALAPPDATA%/moodtune/.env`
///
/// # Errors
///
/// Returns an I/O error when the data directory cannot be created, or
/// [`EngineError::Config`] when the `.env` file exists but cannot be parsed.
///
/// # Example
///
/// ```ignore
/// config::load_env().await?;
/// let config = Config::from_env()?;
/// ```
pub async fn load_env() -> Result<()> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir).await?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| EngineError::Config(e.to_string()))?;
    }
    Ok(())
}

/// Runtime settings, resolved once at startup.
///
/// Every field maps to one environment variable; the mapping is listed in
/// `.env.example`. Only the client id and the redirect URI are required.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address (`SERVER_ADDRESS`), default `127.0.0.1:8080`.
    pub server_address: String,
    /// OAuth client id (`SPOTIFY_API_AUTH_CLIENT_ID`).
    pub spotify_client_id: String,
    /// OAuth client secret; PKCE works without it.
    pub spotify_client_secret: Option<String>,
    /// Must match the redirect URI registered for the client.
    pub spotify_redirect_uri: String,
    pub spotify_scope: String,
    pub spotify_auth_url: String,
    pub spotify_token_url: String,
    /// Web API root, without a trailing slash.
    pub spotify_api_url: String,
    /// Enables track analysis when set.
    pub openai_api_key: Option<String>,
    pub openai_url: String,
    pub openai_model: String,
    /// Where the OAuth callback redirects after a successful login.
    pub frontend_url: String,
    pub data_dir: PathBuf,
    /// Idle time after which a session is purged.
    pub session_ttl: Duration,
}

impl Config {
    /// Builds the configuration from the process environment.
    ///
    /// Call [`load_env`] first so values from the `.env` file are visible.
    /// Blank variables count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] when `SPOTIFY_API_AUTH_CLIENT_ID` or
    /// `SPOTIFY_API_REDIRECT_URI` is missing, or when
    /// `MOODTUNE_SESSION_TTL_MINUTES` is not a positive integer.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server_address: or_default("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            spotify_client_id: required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            spotify_client_secret: optional("SPOTIFY_API_AUTH_CLIENT_SECRET"),
            spotify_redirect_uri: required("SPOTIFY_API_REDIRECT_URI")?,
            spotify_scope: or_default("SPOTIFY_API_AUTH_SCOPE", DEFAULT_SCOPE),
            spotify_auth_url: or_default("SPOTIFY_API_AUTH_URL", DEFAULT_AUTH_URL),
            spotify_token_url: or_default("SPOTIFY_API_TOKEN_URL", DEFAULT_TOKEN_URL),
            spotify_api_url: or_default("SPOTIFY_API_URL", DEFAULT_API_URL),
            openai_api_key: optional("OPENAI_API_KEY"),
            openai_url: or_default("OPENAI_API_URL", DEFAULT_OPENAI_URL),
            openai_model: or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            frontend_url: or_default("MOODTUNE_FRONTEND_URL", "/"),
            data_dir: resolve_data_dir(),
            session_ttl: session_ttl()?,
        })
    }

    /// Directory holding one subdirectory per session for the file store.
    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| EngineError::Config(format!("{key} must be set")))
}
