use std::{collections::HashSet, sync::Arc};

use tracing::{info, warn};

use crate::{
    engine::Recommender,
    errors::{EngineError, Result},
    management::{AnalysisCache, MoodTargetStore, PlayHistoryTracker},
    types::{MoodTarget, SessionId, TrackAnalysis},
};

/// Euclidean distance in the (tempo, valence) plane.
///
/// Tempo is not rescaled, so at typical values it dominates valence.
/// `hypot` keeps the result finite for any finite inputs.
pub fn mood_distance(target: &MoodTarget, tempo: f64, valence: f64) -> f64 {
    (target.tempo - tempo).hypot(target.valence - valence)
}

/// Closest entry not in `played`; ties go to the earliest entry.
///
/// Entries with a NaN distance never win. Infinite distances still compete,
/// so an unplayed entry is always found when one exists with numeric fields.
pub fn nearest_unplayed<'a>(
    target: &MoodTarget,
    entries: &'a [TrackAnalysis],
    played: &HashSet<String>,
) -> Option<&'a TrackAnalysis> {
    let mut best: Option<(&TrackAnalysis, f64)> = None;
    for entry in entries.iter().filter(|e| !played.contains(&e.track_id)) {
        let d = mood_distance(target, entry.tempo, entry.valence);
        if d.is_nan() {
            continue;
        }
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((entry, d));
        }
    }
    best.map(|(entry, _)| entry)
}

pub struct Matcher {
    moods: Arc<MoodTargetStore>,
    cache: Arc<AnalysisCache>,
    history: Arc<PlayHistoryTracker>,
    recommender: Arc<dyn Recommender>,
}

impl Matcher {
    pub fn new(
        moods: Arc<MoodTargetStore>,
        cache: Arc<AnalysisCache>,
        history: Arc<PlayHistoryTracker>,
        recommender: Arc<dyn Recommender>,
    ) -> Self {
        Self {
            moods,
            cache,
            history,
            recommender,
        }
    }

    /// Picks the next track for the session and records it as played.
    ///
    /// The nearest unplayed cached analysis wins. When every cached track has
    /// been played (or the cache is empty) the recommender is asked instead;
    /// its pick is not checked against the history.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NoCandidates`] when the recommender cannot produce a track.
    /// - Authentication errors from the recommender are passed through so the
    ///   caller can ask the user to log in again.
    pub async fn find_best_track(&self, session: &SessionId) -> Result<String> {
        let target = self.moods.get_target(session).await?;
        let entries = self.cache.all(session).await?;
        let played = self.history.played(session).await?;

        if let Some(winner) = nearest_unplayed(&target, &entries, &played) {
            info!(
                session = %session,
                track_id = %winner.track_id,
                distance = mood_distance(&target, winner.tempo, winner.valence),
                "nearest cached match"
            );
            self.history.mark_played(session, &winner.track_id).await?;
            return Ok(winner.track_id.clone());
        }

        match self.recommender.recommend_fresh(session).await {
            Ok(track_id) => {
                info!(session = %session, track_id = %track_id, "recommender fallback");
                self.history.mark_played(session, &track_id).await?;
                Ok(track_id)
            }
            Err(e) if e.is_auth_required() => Err(e),
            Err(e) => {
                warn!(session = %session, error = %e, "recommender fallback failed");
                Err(EngineError::NoCandidates(e.to_string()))
            }
        }
    }
}
