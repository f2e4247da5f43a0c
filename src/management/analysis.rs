use std::sync::Arc;

use crate::{
    errors::Result,
    management::{
        SessionLocks,
        store::{self, ENTITY_ANALYSIS, KeyValueStore},
    },
    types::{SessionId, TrackAnalysis},
};

/// Append-only log of (tempo, valence) estimates per session.
///
/// Re-analysing a track appends a second entry; readers get every entry in
/// insertion order.
pub struct AnalysisCache {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<SessionLocks>,
}

impl AnalysisCache {
    pub fn new(store: Arc<dyn KeyValueStore>, locks: Arc<SessionLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn append(&self, session: &SessionId, analysis: TrackAnalysis) -> Result<()> {
        let _guard = self.locks.lock(session).await;

        let mut entries = self.all(session).await?;
        entries.push(analysis);
        store::save(self.store.as_ref(), session, ENTITY_ANALYSIS, &entries).await
    }

    pub async fn all(&self, session: &SessionId) -> Result<Vec<TrackAnalysis>> {
        Ok(store::load(self.store.as_ref(), session, ENTITY_ANALYSIS)
            .await?
            .unwrap_or_default())
    }

    pub async fn contains(&self, session: &SessionId, track_id: &str) -> Result<bool> {
        Ok(self
            .all(session)
            .await?
            .iter()
            .any(|a| a.track_id == track_id))
    }
}
