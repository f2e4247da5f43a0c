use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    engine::{AnalysisClient, MusicService},
    errors::{EngineError, Result},
    management::{AnalysisCache, TokenStore},
    types::SessionId,
};

pub const TOP_TRACKS_LIMIT: u32 = 20;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshSummary {
    pub added: usize,
    pub skipped: usize,
    pub total: usize,
}

/// Fills a session's analysis cache from its top tracks.
pub struct AnalysisLibrary {
    tokens: Arc<TokenStore>,
    music: Arc<dyn MusicService>,
    analyzer: Arc<dyn AnalysisClient>,
    cache: Arc<AnalysisCache>,
}

impl AnalysisLibrary {
    pub fn new(
        tokens: Arc<TokenStore>,
        music: Arc<dyn MusicService>,
        analyzer: Arc<dyn AnalysisClient>,
        cache: Arc<AnalysisCache>,
    ) -> Self {
        Self {
            tokens,
            music,
            analyzer,
            cache,
        }
    }

    /// Analyzes every top track not yet in the cache, once each.
    ///
    /// Tracks the analysis service cannot estimate are skipped and not
    /// retried; other errors abort the refresh.
    pub async fn refresh_from_top_tracks(&self, session: &SessionId) -> Result<RefreshSummary> {
        let token = self.tokens.get_valid_access_token(session).await?;
        let tracks = self.music.top_tracks(&token, TOP_TRACKS_LIMIT).await?;

        let mut added = 0;
        let mut skipped = 0;
        for track in tracks {
            if self.cache.contains(session, &track.id).await? {
                continue;
            }
            match self.analyzer.analyze(&track.id, &track.describe()).await {
                Ok(analysis) => {
                    self.cache.append(session, analysis).await?;
                    added += 1;
                }
                Err(EngineError::AnalysisUnavailable(reason)) => {
                    debug!(session = %session, track_id = %track.id, reason = %reason, "analysis skipped");
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let total = self.cache.all(session).await?.len();
        info!(session = %session, added, skipped, total, "analysis cache refreshed");
        Ok(RefreshSummary {
            added,
            skipped,
            total,
        })
    }
}
