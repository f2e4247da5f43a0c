mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use moodtune::{
    errors::EngineError,
    management::{MemoryStore, SessionLocks, TokenStore},
    types::{RefreshedToken, SessionId},
};

use common::{FakeEndpoint, pair};

fn token_store(endpoint: Arc<FakeEndpoint>) -> TokenStore {
    TokenStore::new(
        Arc::new(MemoryStore::new()),
        Arc::new(SessionLocks::new()),
        endpoint,
    )
}

fn session() -> SessionId {
    SessionId::parse("listener").unwrap()
}

#[tokio::test]
async fn test_refresh_replaces_access_token_and_keeps_refresh_token() {
    let endpoint = Arc::new(FakeEndpoint::refreshing_to("new-access", None));
    let tokens = token_store(Arc::clone(&endpoint));
    let s = session();
    tokens
        .store(&s, &pair("old-access", Some("refresh-1")))
        .await
        .unwrap();

    let access = tokens.get_valid_access_token(&s).await.unwrap();
    assert_eq!(access, "new-access");
    assert_eq!(endpoint.calls(), 1);

    let stored = tokens.current(&s).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "new-access");
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn test_refresh_rotates_refresh_token_when_returned() {
    let endpoint = Arc::new(FakeEndpoint::refreshing_to("new-access", Some("refresh-2")));
    let tokens = token_store(Arc::clone(&endpoint));
    let s = session();
    tokens
        .store(&s, &pair("old-access", Some("refresh-1")))
        .await
        .unwrap();

    tokens.get_valid_access_token(&s).await.unwrap();

    let stored = tokens.current(&s).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_refresh_updates_expiry() {
    let expires_at = Utc::now() + Duration::hours(2);
    let endpoint = Arc::new(FakeEndpoint::default());
    endpoint.push_refresh(Ok(RefreshedToken {
        access_token: "new-access".to_string(),
        refresh_token: None,
        expires_at,
    }));
    let tokens = token_store(Arc::clone(&endpoint));
    let s = session();
    let mut expired = pair("old-access", Some("refresh-1"));
    expired.expires_at = Utc::now() - Duration::hours(1);
    tokens.store(&s, &expired).await.unwrap();

    tokens.get_valid_access_token(&s).await.unwrap();

    assert_eq!(
        tokens.current(&s).await.unwrap().unwrap().expires_at,
        expires_at
    );
}

#[tokio::test]
async fn test_refreshes_even_when_token_is_not_expired() {
    let endpoint = Arc::new(FakeEndpoint::default());
    for access in ["a1", "a2", "a3"] {
        endpoint.push_refresh(Ok(RefreshedToken {
            access_token: access.to_string(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
        }));
    }
    let tokens = token_store(Arc::clone(&endpoint));
    let s = session();
    tokens
        .store(&s, &pair("fresh", Some("refresh-1")))
        .await
        .unwrap();

    assert_eq!(tokens.get_valid_access_token(&s).await.unwrap(), "a1");
    assert_eq!(tokens.get_valid_access_token(&s).await.unwrap(), "a2");
    assert_eq!(tokens.get_valid_access_token(&s).await.unwrap(), "a3");
    assert_eq!(endpoint.calls(), 3);
}

#[tokio::test]
async fn test_failed_refresh_falls_back_to_stored_token() {
    let endpoint = Arc::new(FakeEndpoint::failing());
    let tokens = token_store(Arc::clone(&endpoint));
    let s = session();
    let original = pair("old-access", Some("refresh-1"));
    tokens.store(&s, &original).await.unwrap();

    let access = tokens.get_valid_access_token(&s).await.unwrap();
    assert_eq!(access, "old-access");
    assert_eq!(endpoint.calls(), 1);
    assert_eq!(tokens.current(&s).await.unwrap().unwrap(), original);
}

#[tokio::test]
async fn test_failed_refresh_without_access_token() {
    let endpoint = Arc::new(FakeEndpoint::failing());
    let tokens = token_store(endpoint);
    let s = session();
    tokens.store(&s, &pair("", Some("refresh-1"))).await.unwrap();

    let err = tokens.get_valid_access_token(&s).await.unwrap_err();
    assert!(matches!(err, EngineError::TokenRefreshFailed(_)));
    assert!(err.is_auth_required());
}

#[tokio::test]
async fn test_unknown_session_is_not_authenticated() {
    let endpoint = Arc::new(FakeEndpoint::default());
    let tokens = token_store(Arc::clone(&endpoint));

    let err = tokens.get_valid_access_token(&session()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAuthenticated));
    assert_eq!(endpoint.calls(), 0);
    assert!(!tokens.is_authenticated(&session()).await.unwrap());
}

#[tokio::test]
async fn test_access_token_without_refresh_token() {
    let endpoint = Arc::new(FakeEndpoint::default());
    let tokens = token_store(Arc::clone(&endpoint));
    let s = session();
    tokens.store(&s, &pair("only-access", None)).await.unwrap();

    assert_eq!(tokens.get_valid_access_token(&s).await.unwrap(), "only-access");
    assert_eq!(endpoint.calls(), 0);

    tokens.store(&s, &pair("", None)).await.unwrap();
    let err = tokens.get_valid_access_token(&s).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAuthenticated));
}

#[tokio::test]
async fn test_exchange_then_store() {
    let tokens = token_store(Arc::new(FakeEndpoint::default()));
    let s = session();

    let exchanged = tokens.exchange("code-123", "verifier").await.unwrap();
    tokens.store(&s, &exchanged).await.unwrap();

    assert!(tokens.is_authenticated(&s).await.unwrap());
    assert_eq!(
        tokens.current(&s).await.unwrap().unwrap().access_token,
        "access-for-code-123"
    );
}

#[tokio::test]
async fn test_revoke_forgets_tokens() {
    let endpoint = Arc::new(FakeEndpoint::default());
    let tokens = token_store(Arc::clone(&endpoint));
    let s = session();
    tokens.store(&s, &pair("access", Some("refresh-1"))).await.unwrap();

    tokens.revoke(&s).await.unwrap();
    tokens.revoke(&s).await.unwrap();

    assert!(!tokens.is_authenticated(&s).await.unwrap());
    let err = tokens.get_valid_access_token(&s).await.unwrap_err();
    assert!(matches!(err, EngineError::NotAuthenticated));
    assert_eq!(endpoint.calls(), 0);
}
