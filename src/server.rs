use std::{net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use chrono::Utc;
use reqwest::Client;
use tracing::{info, warn};

use crate::{
    api::{self, AppState},
    config::Config,
    engine::{AnalysisClient, MoodEngine, MusicService},
    errors::{EngineError, Result},
    llm::OpenAiAnalyzer,
    management::KeyValueStore,
    spotify::{Authorizer, SpotifyAccounts, SpotifyClient},
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/spotify/authorize", get(api::authorize))
        .route("/spotify/login", get(api::login))
        .route("/spotify/callback", get(api::callback).post(api::callback))
        .route("/spotify/check-auth", get(api::check_auth))
        .route("/spotify/disconnect", post(api::disconnect))
        .route("/spotify/logout", post(api::logout))
        .route("/spotify/track", get(api::track))
        .route("/spotify/play", post(api::play))
        .route(
            "/api/mood",
            get(api::update_mood_query).post(api::update_mood_body),
        )
        .route(
            "/api/external-api",
            get(api::update_mood_query).post(api::update_mood_body),
        )
        .route("/api/mood/current", get(api::current_mood))
        .route("/api/next-track", get(api::next_track))
        .route("/api/analysis", get(api::list_analysis))
        .route("/api/analysis/refresh", post(api::refresh_analysis))
        .with_state(state)
}

/// Wires the Spotify clients, the analysis client and the engine over `store`.
pub fn build_state(config: &Config, store: Arc<dyn KeyValueStore>) -> Result<AppState> {
    let client = Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| EngineError::Config(e.to_string()))?;

    let accounts = Arc::new(SpotifyAccounts::new(client.clone(), config));
    let spotify = Arc::new(SpotifyClient::new(
        client.clone(),
        config.spotify_api_url.clone(),
    ));
    let analyzer = OpenAiAnalyzer::from_config(client, config)
        .map(|a| Arc::new(a) as Arc<dyn AnalysisClient>);
    if analyzer.is_none() {
        warn!("OPENAI_API_KEY not set; analysis refresh disabled");
    }

    let engine = Arc::new(MoodEngine::new(
        store,
        accounts,
        Arc::clone(&spotify) as Arc<dyn MusicService>,
        analyzer,
    ));

    Ok(AppState::new(
        engine,
        spotify,
        Arc::new(Authorizer::new(config)),
        config.frontend_url.clone(),
    ))
}

/// Periodically destroys sessions idle for longer than the configured TTL.
fn spawn_session_sweeper(engine: Arc<MoodEngine>, ttl: chrono::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match engine.sessions.purge_expired(ttl, Utc::now()).await {
                Ok(purged) if !purged.is_empty() => {
                    info!(count = purged.len(), "expired sessions purged")
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "session sweep failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

pub async fn start_api_server(config: &Config, state: AppState) -> Result<()> {
    let addr = SocketAddr::from_str(&config.server_address).map_err(|e| {
        EngineError::Config(format!(
            "invalid SERVER_ADDRESS {}: {e}",
            config.server_address
        ))
    })?;

    spawn_session_sweeper(Arc::clone(&state.engine), config.session_ttl);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| EngineError::Config(format!("cannot bind {addr}: {e}")))?;
    info!(%addr, "moodtune listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| EngineError::Config(format!("server error: {e}")))
}
