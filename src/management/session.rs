use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::{
    errors::Result,
    management::store::{self, ENTITY_META, KeyValueStore},
    types::{SessionId, SessionMeta},
    utils,
};

/// Per-session async mutexes guarding read-modify-write cycles.
///
/// Sessions never share a lock, so work for different sessions never waits
/// on each other.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, session: &SessionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(session.clone()).or_default())
        };
        lock.lock_owned().await
    }

    pub async fn forget(&self, session: &SessionId) {
        self.locks.lock().await.remove(session);
    }

    /// Number of sessions that currently have a lock entry.
    pub async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<SessionLocks>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, locks: Arc<SessionLocks>) -> Self {
        Self { store, locks }
    }

    pub async fn create(&self) -> Result<SessionId> {
        let session = utils::generate_session_id();
        let now = Utc::now();
        let meta = SessionMeta {
            created_at: now,
            last_seen: now,
        };
        store::save(self.store.as_ref(), &session, ENTITY_META, &meta).await?;
        info!(session = %session, "session created");
        Ok(session)
    }

    pub async fn meta(&self, session: &SessionId) -> Result<Option<SessionMeta>> {
        store::load(self.store.as_ref(), session, ENTITY_META).await
    }

    /// Bumps `last_seen`. Returns false when the session does not exist.
    ///
    /// Unknown ids are rejected before a lock is taken, so arbitrary ids from
    /// clients leave no entry behind in [`SessionLocks`].
    pub async fn touch(&self, session: &SessionId) -> Result<bool> {
        if self.meta(session).await?.is_none() {
            return Ok(false);
        }

        let guard = self.locks.lock(session).await;
        // destroyed between the check and the lock
        let Some(mut meta) = self.meta(session).await? else {
            drop(guard);
            self.locks.forget(session).await;
            return Ok(false);
        };
        meta.last_seen = Utc::now();
        store::save(self.store.as_ref(), session, ENTITY_META, &meta).await?;
        Ok(true)
    }

    pub async fn destroy(&self, session: &SessionId) -> Result<()> {
        {
            let _guard = self.locks.lock(session).await;
            self.store.remove_session(session).await?;
        }
        self.locks.forget(session).await;
        info!(session = %session, "session destroyed");
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<(SessionId, Option<SessionMeta>)>> {
        let mut sessions = Vec::new();
        for session in self.store.sessions().await? {
            let meta = self.meta(&session).await?;
            sessions.push((session, meta));
        }
        Ok(sessions)
    }

    /// Destroys sessions idle for longer than `ttl` as of `now`.
    ///
    /// Partitions without metadata are treated as expired.
    pub async fn purge_expired(&self, ttl: Duration, now: DateTime<Utc>) -> Result<Vec<SessionId>> {
        let mut purged = Vec::new();
        for (session, meta) in self.list().await? {
            let expired = meta.is_none_or(|m| now - m.last_seen > ttl);
            if expired {
                debug!(session = %session, "session expired");
                self.destroy(&session).await?;
                purged.push(session);
            }
        }
        Ok(purged)
    }
}
