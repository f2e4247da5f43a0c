use std::sync::Arc;

use tracing::debug;

use crate::{
    errors::Result,
    management::{
        SessionLocks,
        store::{self, ENTITY_MOOD, KeyValueStore},
    },
    types::{MoodTarget, SessionId},
};

const MIN_TEMPO: f64 = 1.0;

pub struct MoodTargetStore {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<SessionLocks>,
}

impl MoodTargetStore {
    pub fn new(store: Arc<dyn KeyValueStore>, locks: Arc<SessionLocks>) -> Self {
        Self { store, locks }
    }

    /// Stored target, or the defaults (120 BPM, 0.5) when none was set.
    pub async fn get_target(&self, session: &SessionId) -> Result<MoodTarget> {
        Ok(store::load(self.store.as_ref(), session, ENTITY_MOOD)
            .await?
            .unwrap_or_default())
    }

    /// Updates the fields that are given and keeps the others.
    ///
    /// Valence is clamped into `[0, 1]` and tempo to at least 1 BPM. Non-finite
    /// values count as omitted.
    pub async fn set_target(
        &self,
        session: &SessionId,
        tempo: Option<f64>,
        valence: Option<f64>,
    ) -> Result<MoodTarget> {
        let _guard = self.locks.lock(session).await;

        let mut target = self.get_target(session).await?;
        if let Some(tempo) = tempo.filter(|t| t.is_finite()) {
            target.tempo = tempo.max(MIN_TEMPO);
        }
        if let Some(valence) = valence.filter(|v| v.is_finite()) {
            target.valence = valence.clamp(0.0, 1.0);
        }

        store::save(self.store.as_ref(), session, ENTITY_MOOD, &target).await?;
        debug!(session = %session, tempo = target.tempo, valence = target.valence, "mood target updated");
        Ok(target)
    }
}
