use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::{
    engine::MusicService,
    errors::{Collaborator, EngineError, Result},
    spotify::transport_error,
    types::{
        Artist, Device, DevicesResponse, MoodTarget, RecommendationsResponse,
        StartPlaybackRequest, TopArtistsResponse, TopTracksResponse, Track,
    },
};

/// Spotify Web API client for the endpoints moodtune uses.
///
/// Every call takes the listener's bearer token explicitly; the client holds
/// no per-session state and is shared by all sessions. Non-success replies
/// are logged with their body and surface as [`EngineError::Upstream`] naming
/// the music service, which the API layer turns into a 502.
pub struct SpotifyClient {
    client: Client,
    api_url: String,
}

impl SpotifyClient {
    /// Creates a client rooted at `api_url` (normally `https://api.spotify.com/v1`).
    ///
    /// # Example
    ///
    /// ```ignore
    /// let spotify = SpotifyClient::new(reqwest::Client::new(), config.spotify_api_url.clone());
    /// let devices = spotify.devices(&token).await?;
    /// ```
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let res = request
            .send()
            .await
            .map_err(|e| transport_error(Collaborator::MusicService, e))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "{what} failed");
            return Err(EngineError::upstream(
                Collaborator::MusicService,
                format!("{what} failed with {status}"),
            ));
        }
        Ok(res)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let request = self.client.get(self.url(path)).bearer_auth(token).query(query);
        self.send(request, what)
            .await?
            .json::<T>()
            .await
            .map_err(|e| transport_error(Collaborator::MusicService, e))
    }

    /// Raw track object, as returned by `GET /tracks/{id}`.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token for the session
    /// * `track_id` - Spotify track id, already validated by the caller
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Upstream`] when the service is unreachable or
    /// answers with a non-success status, for example 404 for an unknown id.
    pub async fn track(&self, token: &str, track_id: &str) -> Result<Value> {
        self.get_json(token, &format!("/tracks/{track_id}"), &[], "track fetch")
            .await
    }

    /// Raw audio features, as returned by `GET /audio-features/{id}`.
    ///
    /// # Errors
    ///
    /// Same as [`SpotifyClient::track`].
    pub async fn audio_features(&self, token: &str, track_id: &str) -> Result<Value> {
        self.get_json(
            token,
            &format!("/audio-features/{track_id}"),
            &[],
            "audio features fetch",
        )
        .await
    }

    /// Devices the listener can currently play on.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Upstream`] when the device list cannot be fetched.
    pub async fn devices(&self, token: &str) -> Result<Vec<Device>> {
        let res: DevicesResponse = self
            .get_json(token, "/me/player/devices", &[], "devices fetch")
            .await?;
        Ok(res.devices)
    }

    /// Starts playback of a single track on the given device.
    ///
    /// # Arguments
    ///
    /// * `token` - Valid access token with the `user-modify-playback-state` scope
    /// * `device_id` - Target device, as listed by [`SpotifyClient::devices`]
    /// * `track_id` - Track to play; sent as a `spotify:track:` URI
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Upstream`] when playback is refused, which
    /// includes inactive devices and accounts without Premium.
    ///
    /// # Example
    ///
    /// ```ignore
    /// spotify.play(&token, &device.id, "4uLU6hMCjMI75M1A2tKUQC").await?;
    /// ```
    pub async fn play(&self, token: &str, device_id: &str, track_id: &str) -> Result<()> {
        let request = self
            .client
            .put(self.url("/me/player/play"))
            .bearer_auth(token)
            .query(&[("device_id", device_id)])
            .json(&StartPlaybackRequest {
                uris: vec![format!("spotify:track:{track_id}")],
            });
        self.send(request, "start playback").await?;
        Ok(())
    }
}

#[async_trait]
impl MusicService for SpotifyClient {
    /// `GET /me/top/artists` limited to `limit` items.
    async fn top_artists(&self, token: &str, limit: u32) -> Result<Vec<Artist>> {
        let res: TopArtistsResponse = self
            .get_json(
                token,
                "/me/top/artists",
                &[("limit", limit.to_string())],
                "top artists fetch",
            )
            .await?;
        Ok(res.items)
    }

    /// `GET /me/top/tracks` limited to `limit` items.
    async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<Track>> {
        let res: TopTracksResponse = self
            .get_json(
                token,
                "/me/top/tracks",
                &[("limit", limit.to_string())],
                "top tracks fetch",
            )
            .await?;
        Ok(res.items)
    }

    /// One recommendation seeded with the given artists and tuned to the
    /// mood target.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Upstream`] when the request fails. An empty
    /// track list is not an error here; the caller decides what it means.
    async fn recommendations(
        &self,
        token: &str,
        seed_artists: &[String],
        target: MoodTarget,
    ) -> Result<Vec<Track>> {
        let res: RecommendationsResponse = self
            .get_json(
                token,
                "/recommendations",
                &[
                    ("limit", "1".to_string()),
                    ("seed_artists", seed_artists.join(",")),
                    ("target_tempo", target.tempo.to_string()),
                    ("target_valence", target.valence.to_string()),
                ],
                "recommendation fetch",
            )
            .await?;
        Ok(res.tracks)
    }
}
