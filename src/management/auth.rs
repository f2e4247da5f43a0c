use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    errors::{EngineError, Result},
    management::{
        SessionLocks,
        store::{self, ENTITY_TOKEN, KeyValueStore},
    },
    types::{RefreshedToken, SessionId, TokenPair},
};

/// OAuth token endpoint of the music service.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// `authorization_code` grant.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenPair>;

    /// `refresh_token` grant.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken>;
}

pub struct TokenStore {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<SessionLocks>,
    endpoint: Arc<dyn TokenEndpoint>,
}

impl TokenStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        locks: Arc<SessionLocks>,
        endpoint: Arc<dyn TokenEndpoint>,
    ) -> Self {
        TokenStore {
            store,
            locks,
            endpoint,
        }
    }

    /// Trades an authorization code for a fresh token pair.
    pub async fn exchange(&self, code: &str, code_verifier: &str) -> Result<TokenPair> {
        self.endpoint.exchange_code(code, code_verifier).await
    }

    pub async fn store(&self, session: &SessionId, pair: &TokenPair) -> Result<()> {
        let _guard = self.locks.lock(session).await;
        store::save(self.store.as_ref(), session, ENTITY_TOKEN, pair).await
    }

    pub async fn current(&self, session: &SessionId) -> Result<Option<TokenPair>> {
        store::load(self.store.as_ref(), session, ENTITY_TOKEN).await
    }

    /// Forgets the session's tokens; the session itself stays.
    pub async fn revoke(&self, session: &SessionId) -> Result<()> {
        let _guard = self.locks.lock(session).await;
        self.store.remove(session, ENTITY_TOKEN).await?;
        debug!(session = %session, "tokens revoked");
        Ok(())
    }

    pub async fn is_authenticated(&self, session: &SessionId) -> Result<bool> {
        Ok(self
            .current(session)
            .await?
            .is_some_and(|pair| !pair.access_token.is_empty()))
    }

    /// Returns an access token for the session, refreshing first.
    ///
    /// Whenever a refresh token is stored one refresh grant is issued before
    /// returning, regardless of `expires_at`. A failed refresh falls back to
    /// the stored access token and leaves the stored pair untouched.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAuthenticated`] when the session holds no token pair,
    ///   or holds neither an access token nor a refresh token.
    /// - [`EngineError::TokenRefreshFailed`] when the refresh fails and there is
    ///   no previous access token.
    pub async fn get_valid_access_token(&self, session: &SessionId) -> Result<String> {
        let _guard = self.locks.lock(session).await;

        let Some(mut pair) = self.current(session).await? else {
            return Err(EngineError::NotAuthenticated);
        };

        if let Some(refresh_token) = pair.refresh_token.clone().filter(|t| !t.is_empty()) {
            match self.endpoint.refresh(&refresh_token).await {
                Ok(refreshed) if !refreshed.access_token.is_empty() => {
                    pair.access_token = refreshed.access_token;
                    if let Some(rotated) = refreshed.refresh_token {
                        pair.refresh_token = Some(rotated);
                    }
                    pair.expires_at = refreshed.expires_at;
                    store::save(self.store.as_ref(), session, ENTITY_TOKEN, &pair).await?;
                    debug!(session = %session, "access token refreshed");
                    return Ok(pair.access_token);
                }
                Ok(_) => {
                    warn!(session = %session, "token endpoint returned an empty access token");
                    if pair.access_token.is_empty() {
                        return Err(EngineError::TokenRefreshFailed(
                            "empty access token in refresh response".to_string(),
                        ));
                    }
                }
                Err(e) => {
                    warn!(session = %session, error = %e, "token refresh failed");
                    if pair.access_token.is_empty() {
                        return Err(EngineError::TokenRefreshFailed(e.to_string()));
                    }
                }
            }
        }

        if pair.access_token.is_empty() {
            return Err(EngineError::NotAuthenticated);
        }
        Ok(pair.access_token)
    }
}
