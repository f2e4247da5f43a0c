use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    engine::{MusicService, Recommender},
    errors::{EngineError, Result},
    management::{MoodTargetStore, TokenStore},
    types::SessionId,
};

pub const SEED_LIMIT: u32 = 5;

/// Recommender backed by the music service's seeded recommendations.
pub struct SeededRecommender {
    tokens: Arc<TokenStore>,
    moods: Arc<MoodTargetStore>,
    music: Arc<dyn MusicService>,
}

impl SeededRecommender {
    pub fn new(
        tokens: Arc<TokenStore>,
        moods: Arc<MoodTargetStore>,
        music: Arc<dyn MusicService>,
    ) -> Self {
        Self {
            tokens,
            moods,
            music,
        }
    }
}

#[async_trait]
impl Recommender for SeededRecommender {
    async fn recommend_fresh(&self, session: &SessionId) -> Result<String> {
        let token = self.tokens.get_valid_access_token(session).await?;

        let artists = self.music.top_artists(&token, SEED_LIMIT).await?;
        if artists.is_empty() {
            return Err(EngineError::NoCandidates("no top artists".to_string()));
        }
        let tracks = self.music.top_tracks(&token, SEED_LIMIT).await?;
        if tracks.is_empty() {
            return Err(EngineError::NoCandidates("no top tracks".to_string()));
        }

        // only artists seed the request; top tracks just gate it
        let seeds: Vec<String> = artists.into_iter().map(|a| a.id).collect();
        let target = self.moods.get_target(session).await?;
        debug!(session = %session, seeds = seeds.join(","), "requesting recommendation");

        let recommended = self.music.recommendations(&token, &seeds, target).await?;
        recommended
            .into_iter()
            .next()
            .map(|t| t.id)
            .ok_or_else(|| EngineError::NoCandidates("empty recommendation response".to_string()))
    }
}
