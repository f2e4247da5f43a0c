use std::{collections::HashSet, sync::Arc};

use crate::{
    errors::Result,
    management::{
        SessionLocks,
        store::{self, ENTITY_HISTORY, KeyValueStore},
    },
    types::SessionId,
};

/// Tracks already handed out to a session, in play order.
pub struct PlayHistoryTracker {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<SessionLocks>,
}

impl PlayHistoryTracker {
    pub fn new(store: Arc<dyn KeyValueStore>, locks: Arc<SessionLocks>) -> Self {
        Self { store, locks }
    }

    async fn load(&self, session: &SessionId) -> Result<Vec<String>> {
        Ok(store::load(self.store.as_ref(), session, ENTITY_HISTORY)
            .await?
            .unwrap_or_default())
    }

    pub async fn has_played(&self, session: &SessionId, track_id: &str) -> Result<bool> {
        Ok(self.load(session).await?.iter().any(|id| id == track_id))
    }

    /// Idempotent: marking a played track again changes nothing.
    pub async fn mark_played(&self, session: &SessionId, track_id: &str) -> Result<()> {
        let _guard = self.locks.lock(session).await;

        let mut played = self.load(session).await?;
        if played.iter().any(|id| id == track_id) {
            return Ok(());
        }
        played.push(track_id.to_string());
        store::save(self.store.as_ref(), session, ENTITY_HISTORY, &played).await
    }

    pub async fn played(&self, session: &SessionId) -> Result<HashSet<String>> {
        Ok(self.load(session).await?.into_iter().collect())
    }

    pub async fn count(&self, session: &SessionId) -> Result<usize> {
        Ok(self.load(session).await?.len())
    }
}
