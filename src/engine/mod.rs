//! # Mood engine
//!
//! Picks the next track for a session by matching its mood target against
//! the session's analysis cache, falling back to the music service's seeded
//! recommendations once every cached track has been played.
//!
//! ```text
//! mood update ──► MoodTargetStore
//! next track  ──► Matcher ──► AnalysisCache + PlayHistoryTracker
//!                    │
//!                    └─(nothing unplayed)─► Recommender ──► TokenStore ──► MusicService
//! ```
//!
//! External services are reached only through the [`MusicService`],
//! [`AnalysisClient`] and [`TokenEndpoint`](crate::management::TokenEndpoint)
//! traits, and every store is keyed by [`SessionId`].

mod library;
mod matcher;
mod recommender;

use std::sync::Arc;

use async_trait::async_trait;

pub use library::{AnalysisLibrary, RefreshSummary, TOP_TRACKS_LIMIT};
pub use matcher::{Matcher, mood_distance, nearest_unplayed};
pub use recommender::{SEED_LIMIT, SeededRecommender};

use crate::{
    errors::{EngineError, Result},
    management::{
        AnalysisCache, KeyValueStore, MoodTargetStore, PlayHistoryTracker, SessionLocks,
        SessionManager, TokenEndpoint, TokenStore,
    },
    types::{Artist, MoodTarget, SessionId, TokenPair, Track, TrackAnalysis},
};

/// Music-service queries the engine depends on.
#[async_trait]
pub trait MusicService: Send + Sync {
    async fn top_artists(&self, token: &str, limit: u32) -> Result<Vec<Artist>>;

    async fn top_tracks(&self, token: &str, limit: u32) -> Result<Vec<Track>>;

    async fn recommendations(
        &self,
        token: &str,
        seed_artists: &[String],
        target: MoodTarget,
    ) -> Result<Vec<Track>>;
}

/// Estimates tempo and valence for a track from a free-text description.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Fails with [`EngineError::AnalysisUnavailable`] when no usable estimate
    /// comes back.
    async fn analyze(&self, track_id: &str, title: &str) -> Result<TrackAnalysis>;
}

/// Source of a fresh track when the analysis cache has nothing unplayed.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn recommend_fresh(&self, session: &SessionId) -> Result<String>;
}

pub struct MoodEngine {
    pub sessions: SessionManager,
    pub tokens: Arc<TokenStore>,
    pub moods: Arc<MoodTargetStore>,
    pub history: Arc<PlayHistoryTracker>,
    pub cache: Arc<AnalysisCache>,
    matcher: Matcher,
    library: Option<AnalysisLibrary>,
}

impl MoodEngine {
    /// Wires every component over one store. Without an analyzer the
    /// analysis refresh is unavailable but matching still works.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        endpoint: Arc<dyn TokenEndpoint>,
        music: Arc<dyn MusicService>,
        analyzer: Option<Arc<dyn AnalysisClient>>,
    ) -> Self {
        let locks = Arc::new(SessionLocks::new());
        let tokens = Arc::new(TokenStore::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            endpoint,
        ));
        let moods = Arc::new(MoodTargetStore::new(Arc::clone(&store), Arc::clone(&locks)));
        let history = Arc::new(PlayHistoryTracker::new(
            Arc::clone(&store),
            Arc::clone(&locks),
        ));
        let cache = Arc::new(AnalysisCache::new(Arc::clone(&store), Arc::clone(&locks)));

        let recommender = Arc::new(SeededRecommender::new(
            Arc::clone(&tokens),
            Arc::clone(&moods),
            Arc::clone(&music),
        ));
        let matcher = Matcher::new(
            Arc::clone(&moods),
            Arc::clone(&cache),
            Arc::clone(&history),
            recommender,
        );
        let library = analyzer.map(|analyzer| {
            AnalysisLibrary::new(Arc::clone(&tokens), music, analyzer, Arc::clone(&cache))
        });

        Self {
            sessions: SessionManager::new(store, locks),
            tokens,
            moods,
            history,
            cache,
            matcher,
            library,
        }
    }

    /// Creates a session owning the given tokens.
    pub async fn begin_session(&self, pair: &TokenPair) -> Result<SessionId> {
        let session = self.sessions.create().await?;
        self.tokens.store(&session, pair).await?;
        Ok(session)
    }

    /// Stores freshly exchanged tokens in an existing session, keeping its
    /// mood target, history and analysis cache.
    pub async fn reconnect(&self, session: &SessionId, pair: &TokenPair) -> Result<()> {
        self.tokens.store(session, pair).await
    }

    /// Drops the session's tokens but keeps everything else.
    pub async fn disconnect(&self, session: &SessionId) -> Result<()> {
        self.tokens.revoke(session).await
    }

    pub async fn end_session(&self, session: &SessionId) -> Result<()> {
        self.sessions.destroy(session).await
    }

    pub async fn update_mood(
        &self,
        session: &SessionId,
        tempo: Option<f64>,
        valence: Option<f64>,
    ) -> Result<MoodTarget> {
        self.moods.set_target(session, tempo, valence).await
    }

    pub async fn current_mood(&self, session: &SessionId) -> Result<MoodTarget> {
        self.moods.get_target(session).await
    }

    pub async fn next_track(&self, session: &SessionId) -> Result<String> {
        self.matcher.find_best_track(session).await
    }

    pub async fn refresh_analysis(&self, session: &SessionId) -> Result<RefreshSummary> {
        match &self.library {
            Some(library) => library.refresh_from_top_tracks(session).await,
            None => Err(EngineError::Config(
                "no analysis service configured (set OPENAI_API_KEY)".to_string(),
            )),
        }
    }
}
