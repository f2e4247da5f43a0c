use std::sync::Arc;

use chrono::Utc;
use tabled::Table;

use crate::{
    Res, config, error,
    management::{
        AnalysisCache, FileStore, KeyValueStore, MoodTargetStore, PlayHistoryTracker,
        SessionLocks, SessionManager,
    },
    success,
    types::{AnalysisTableRow, SessionId, SessionTableRow},
    warning,
};

/// The persisted session stores, opened without the network clients.
struct SessionStores {
    sessions: SessionManager,
    moods: MoodTargetStore,
    history: PlayHistoryTracker,
    cache: AnalysisCache,
}

impl SessionStores {
    fn open() -> Self {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(
            config::resolve_data_dir().join("sessions"),
        ));
        let locks = Arc::new(SessionLocks::new());
        Self {
            sessions: SessionManager::new(Arc::clone(&store), Arc::clone(&locks)),
            moods: MoodTargetStore::new(Arc::clone(&store), Arc::clone(&locks)),
            history: PlayHistoryTracker::new(Arc::clone(&store), Arc::clone(&locks)),
            cache: AnalysisCache::new(store, locks),
        }
    }
}

fn parse_session(raw: &str) -> SessionId {
    match SessionId::parse(raw) {
        Some(s) => s,
        None => error!("Invalid session id: {}", raw),
    }
}

async fn session_rows(stores: &SessionStores) -> Res<Vec<SessionTableRow>> {
    let mut rows = Vec::new();
    for (session, meta) in stores.sessions.list().await? {
        let target = stores.moods.get_target(&session).await?;
        rows.push(SessionTableRow {
            last_seen: meta
                .map(|m| m.last_seen.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            tempo: format!("{:.1}", target.tempo),
            valence: format!("{:.2}", target.valence),
            analyzed: stores.cache.all(&session).await?.len(),
            played: stores.history.count(&session).await?,
            session: session.to_string(),
        });
    }
    Ok(rows)
}

pub async fn list_sessions() {
    let stores = SessionStores::open();
    match session_rows(&stores).await {
        Ok(rows) if rows.is_empty() => warning!("No sessions stored."),
        Ok(rows) => println!("{}", Table::new(rows)),
        Err(e) => error!("Failed to load sessions. Err: {}", e),
    }
}

pub async fn show_session(raw: &str) {
    let session = parse_session(raw);
    let stores = SessionStores::open();

    match stores.sessions.meta(&session).await {
        Ok(Some(_)) => {}
        Ok(None) => error!("Unknown session: {}", session),
        Err(e) => error!("Failed to load session. Err: {}", e),
    }

    let entries = match stores.cache.all(&session).await {
        Ok(entries) => entries,
        Err(e) => error!("Failed to load analysis cache. Err: {}", e),
    };
    if entries.is_empty() {
        warning!("No analyzed tracks for session {}.", session);
        return;
    }

    let rows: Vec<AnalysisTableRow> = entries.iter().map(AnalysisTableRow::from).collect();
    println!("{}", Table::new(rows));
}

pub async fn clear_session(raw: &str) {
    let session = parse_session(raw);
    let stores = SessionStores::open();
    match stores.sessions.destroy(&session).await {
        Ok(()) => success!("Session {} removed.", session),
        Err(e) => error!("Failed to remove session. Err: {}", e),
    }
}

pub async fn purge_sessions() {
    let ttl = match config::session_ttl() {
        Ok(ttl) => ttl,
        Err(e) => error!("{}", e),
    };
    let stores = SessionStores::open();
    match stores.sessions.purge_expired(ttl, Utc::now()).await {
        Ok(purged) => success!("Removed {} expired session(s).", purged.len()),
        Err(e) => error!("Failed to purge sessions. Err: {}", e),
    }
}
