use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Url};

use crate::{
    config::Config,
    errors::{Collaborator, EngineError, Result},
    management::TokenEndpoint,
    spotify::transport_error,
    types::{RefreshedToken, TokenPair, TokenResponse},
};

const DEFAULT_EXPIRES_IN: i64 = 3600;

/// Builds the Spotify authorization URL a listener is redirected to.
///
/// Holds only the public parts of the OAuth client registration (client id,
/// redirect URI and scope). Per-login values such as the CSRF `state` and the
/// PKCE challenge are passed to [`Authorizer::url`] for every login.
#[derive(Debug, Clone)]
pub struct Authorizer {
    auth_url: String,
    client_id: String,
    redirect_uri: String,
    scope: String,
}

impl Authorizer {
    /// Creates an authorizer from the loaded configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies `SPOTIFY_API_AUTH_URL`, the client id, the
    ///   redirect URI and the requested scope
    ///
    /// # Example
    ///
    /// ```ignore
    /// let authorizer = Authorizer::new(&Config::from_env()?);
    /// ```
    pub fn new(config: &Config) -> Self {
        Self {
            auth_url: config.spotify_auth_url.clone(),
            client_id: config.spotify_client_id.clone(),
            redirect_uri: config.spotify_redirect_uri.clone(),
            scope: config.spotify_scope.clone(),
        }
    }

    /// Authorization-code URL carrying the CSRF `state` and PKCE challenge.
    ///
    /// `show_dialog=true` makes the service ask again even when the user
    /// already granted access, so a different account can be picked.
    ///
    /// # Arguments
    ///
    /// * `state` - Opaque value echoed back to the callback
    /// * `code_challenge` - S256 challenge derived from the login's verifier
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] when the configured authorization URL
    /// cannot be parsed.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let verifier = utils::generate_code_verifier();
    /// let url = authorizer.url(&utils::generate_state(), &utils::generate_code_challenge(&verifier))?;
    /// ```
    pub fn url(&self, state: &str, code_challenge: &str) -> Result<String> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("state", state),
                ("scope", self.scope.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge),
                ("show_dialog", "true"),
            ],
        )
        .map_err(|e| EngineError::Config(format!("invalid SPOTIFY_API_AUTH_URL: {e}")))?;
        Ok(url.into())
    }
}

/// Spotify accounts service token endpoint.
///
/// Performs the `authorization_code` and `refresh_token` grants as form
/// posts. The client secret is sent only when one is configured; PKCE alone
/// is enough for public clients.
pub struct SpotifyAccounts {
    client: Client,
    token_url: String,
    client_id: String,
    client_secret: Option<String>,
    redirect_uri: String,
}

impl SpotifyAccounts {
    /// Creates a token endpoint client sharing the given HTTP client.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared reqwest client
    /// * `config` - Supplies `SPOTIFY_API_TOKEN_URL`, client credentials and
    ///   the redirect URI sent with the code grant
    ///
    /// # Example
    ///
    /// ```ignore
    /// let accounts = SpotifyAccounts::new(reqwest::Client::new(), &config);
    /// let pair = accounts.exchange_code(&code, &verifier).await?;
    /// ```
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            token_url: config.spotify_token_url.clone(),
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            redirect_uri: config.spotify_redirect_uri.clone(),
        }
    }

    /// Posts one grant to the token URL and decodes the token response.
    async fn grant(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("client_id", self.client_id.as_str()));
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }

        let res = self
            .client
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| transport_error(Collaborator::TokenEndpoint, e))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(EngineError::upstream(
                Collaborator::TokenEndpoint,
                format!("{status}: {body}"),
            ));
        }

        res.json::<TokenResponse>()
            .await
            .map_err(|e| transport_error(Collaborator::TokenEndpoint, e))
    }
}

fn expires_at(expires_in: Option<i64>) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::seconds(expires_in.unwrap_or(DEFAULT_EXPIRES_IN))
}

#[async_trait]
impl TokenEndpoint for SpotifyAccounts {
    /// Exchanges an authorization code for a token pair.
    ///
    /// A missing `expires_in` counts as one hour.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Upstream`] naming the token endpoint when the
    /// request fails or the service rejects the code.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenPair> {
        let token = self
            .grant(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("code_verifier", code_verifier),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .await?;

        Ok(TokenPair {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: expires_at(token.expires_in),
        })
    }

    /// Runs the refresh grant.
    ///
    /// An empty or absent rotated refresh token comes back as `None`, so the
    /// caller keeps the one it already holds.
    ///
    /// # Errors
    ///
    /// Every failure, transport or rejected grant, is reported as
    /// [`EngineError::TokenRefreshFailed`].
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken> {
        let token = self
            .grant(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await
            .map_err(|e| EngineError::TokenRefreshFailed(e.to_string()))?;

        Ok(RefreshedToken {
            access_token: token.access_token,
            refresh_token: token.refresh_token.filter(|t| !t.is_empty()),
            expires_at: expires_at(token.expires_in),
        })
    }
}
