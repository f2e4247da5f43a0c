use std::{collections::HashMap, io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use futures::TryStreamExt;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{errors::Result, types::SessionId};

pub const ENTITY_TOKEN: &str = "token";
pub const ENTITY_MOOD: &str = "mood";
pub const ENTITY_ANALYSIS: &str = "analysis";
pub const ENTITY_HISTORY: &str = "history";
pub const ENTITY_META: &str = "meta";

/// Key-value storage keyed by (session, entity).
///
/// Values are JSON documents so the trait stays object safe; use [`load`]
/// and [`save`] for typed access.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, session: &SessionId, entity: &str) -> Result<Option<Value>>;

    async fn put(&self, session: &SessionId, entity: &str, value: Value) -> Result<()>;

    /// Drops one entity. Missing entities are a no-op.
    async fn remove(&self, session: &SessionId, entity: &str) -> Result<()>;

    /// Drops every entity of the session. Unknown sessions are a no-op.
    async fn remove_session(&self, session: &SessionId) -> Result<()>;

    async fn sessions(&self) -> Result<Vec<SessionId>>;
}

pub async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    session: &SessionId,
    entity: &str,
) -> Result<Option<T>> {
    match store.get(session, entity).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn save<T: Serialize>(
    store: &dyn KeyValueStore,
    session: &SessionId,
    entity: &str,
    value: &T,
) -> Result<()> {
    store
        .put(session, entity, serde_json::to_value(value)?)
        .await
}

#[derive(Default)]
pub struct MemoryStore {
    partitions: RwLock<HashMap<SessionId, HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, session: &SessionId, entity: &str) -> Result<Option<Value>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(session)
            .and_then(|p| p.get(entity))
            .cloned())
    }

    async fn put(&self, session: &SessionId, entity: &str, value: Value) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(session.clone())
            .or_default()
            .insert(entity.to_string(), value);
        Ok(())
    }

    async fn remove(&self, session: &SessionId, entity: &str) -> Result<()> {
        if let Some(partition) = self.partitions.write().await.get_mut(session) {
            partition.remove(entity);
        }
        Ok(())
    }

    async fn remove_session(&self, session: &SessionId) -> Result<()> {
        self.partitions.write().await.remove(session);
        Ok(())
    }

    async fn sessions(&self) -> Result<Vec<SessionId>> {
        let mut ids: Vec<SessionId> = self.partitions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

/// One JSON file per entity under `<root>/<session>/<entity>.json`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn session_dir(&self, session: &SessionId) -> PathBuf {
        self.root.join(session.as_str())
    }

    fn entity_path(&self, session: &SessionId, entity: &str) -> PathBuf {
        self.session_dir(session).join(format!("{entity}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, session: &SessionId, entity: &str) -> Result<Option<Value>> {
        match async_fs::read_to_string(self.entity_path(session, entity)).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, session: &SessionId, entity: &str, value: Value) -> Result<()> {
        async_fs::create_dir_all(self.session_dir(session)).await?;

        // write-then-rename so readers never see a half-written document
        let path = self.entity_path(session, entity);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&value)?;
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, session: &SessionId, entity: &str) -> Result<()> {
        match async_fs::remove_file(self.entity_path(session, entity)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn remove_session(&self, session: &SessionId) -> Result<()> {
        match async_fs::remove_dir_all(self.session_dir(session)).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn sessions(&self) -> Result<Vec<SessionId>> {
        let entries: Vec<async_fs::DirEntry> = match async_fs::read_dir(&self.root).await {
            Ok(dir) => dir.try_collect().await?,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(id) = entry.file_name().to_str().and_then(SessionId::parse) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }
}
