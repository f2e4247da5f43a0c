mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use moodtune::{
    management::{
        AnalysisCache, FileStore, KeyValueStore, MemoryStore, MoodTargetStore, PlayHistoryTracker,
        SessionLocks, SessionManager,
        store::{self, ENTITY_META},
    },
    types::{MoodTarget, SessionId, SessionMeta},
};

use common::analysis;

fn session(raw: &str) -> SessionId {
    SessionId::parse(raw).unwrap()
}

fn stores(store: Arc<dyn KeyValueStore>) -> (MoodTargetStore, PlayHistoryTracker, AnalysisCache) {
    let locks = Arc::new(SessionLocks::new());
    (
        MoodTargetStore::new(Arc::clone(&store), Arc::clone(&locks)),
        PlayHistoryTracker::new(Arc::clone(&store), Arc::clone(&locks)),
        AnalysisCache::new(store, locks),
    )
}

#[tokio::test]
async fn test_mood_target_defaults() {
    let (moods, _, _) = stores(Arc::new(MemoryStore::new()));

    let target = moods.get_target(&session("fresh")).await.unwrap();
    assert_eq!(
        target,
        MoodTarget {
            tempo: 120.0,
            valence: 0.5
        }
    );
}

#[tokio::test]
async fn test_mood_target_partial_update_keeps_other_field() {
    let (moods, _, _) = stores(Arc::new(MemoryStore::new()));
    let s = session("s1");

    let target = moods.set_target(&s, None, Some(0.9)).await.unwrap();
    assert_eq!(target.tempo, 120.0);
    assert_eq!(target.valence, 0.9);

    let target = moods.set_target(&s, Some(90.0), None).await.unwrap();
    assert_eq!(target.tempo, 90.0);
    assert_eq!(target.valence, 0.9);

    assert_eq!(moods.get_target(&s).await.unwrap(), target);
}

#[tokio::test]
async fn test_mood_target_clamping() {
    let (moods, _, _) = stores(Arc::new(MemoryStore::new()));
    let s = session("s1");

    let target = moods.set_target(&s, Some(-10.0), Some(1.7)).await.unwrap();
    assert_eq!(target.tempo, 1.0);
    assert_eq!(target.valence, 1.0);

    let target = moods.set_target(&s, None, Some(-0.3)).await.unwrap();
    assert_eq!(target.valence, 0.0);

    // Non-finite values are ignored
    let target = moods
        .set_target(&s, Some(f64::NAN), Some(f64::INFINITY))
        .await
        .unwrap();
    assert_eq!(target.tempo, 1.0);
    assert_eq!(target.valence, 0.0);
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let (moods, history, cache) = stores(Arc::new(MemoryStore::new()));
    let a = session("a");
    let b = session("b");

    moods.set_target(&a, Some(140.0), Some(0.1)).await.unwrap();
    history.mark_played(&a, "t1").await.unwrap();
    cache.append(&a, analysis("t1", 100.0, 0.2)).await.unwrap();

    assert_eq!(moods.get_target(&b).await.unwrap(), MoodTarget::default());
    assert!(!history.has_played(&b, "t1").await.unwrap());
    assert!(cache.all(&b).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_played_is_idempotent() {
    let (_, history, _) = stores(Arc::new(MemoryStore::new()));
    let s = session("s1");

    assert!(!history.has_played(&s, "t1").await.unwrap());
    history.mark_played(&s, "t1").await.unwrap();
    history.mark_played(&s, "t1").await.unwrap();
    history.mark_played(&s, "t2").await.unwrap();

    assert!(history.has_played(&s, "t1").await.unwrap());
    assert_eq!(history.count(&s).await.unwrap(), 2);
}

#[tokio::test]
async fn test_analysis_cache_keeps_duplicates_in_order() {
    let (_, _, cache) = stores(Arc::new(MemoryStore::new()));
    let s = session("s1");

    cache.append(&s, analysis("t1", 100.0, 0.2)).await.unwrap();
    cache.append(&s, analysis("t2", 130.0, 0.9)).await.unwrap();
    cache.append(&s, analysis("t1", 105.0, 0.3)).await.unwrap();

    let ids: Vec<String> = cache
        .all(&s)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.track_id)
        .collect();
    assert_eq!(ids, vec!["t1", "t2", "t1"]);

    assert!(cache.contains(&s, "t2").await.unwrap());
    assert!(!cache.contains(&s, "t3").await.unwrap());
}

#[tokio::test]
async fn test_concurrent_appends_are_not_lost() {
    let (_, history, cache) = stores(Arc::new(MemoryStore::new()));
    let cache = Arc::new(cache);
    let history = Arc::new(history);
    let s = session("s1");

    let mut handles = Vec::new();
    for i in 0..20 {
        let cache = Arc::clone(&cache);
        let history = Arc::clone(&history);
        let s = s.clone();
        handles.push(tokio::spawn(async move {
            cache
                .append(&s, analysis(&format!("t{i}"), 100.0, 0.5))
                .await
                .unwrap();
            history.mark_played(&s, &format!("t{i}")).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cache.all(&s).await.unwrap().len(), 20);
    assert_eq!(history.count(&s).await.unwrap(), 20);
}

#[tokio::test]
async fn test_file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let s = session("persisted");

    {
        let (moods, history, cache) = stores(Arc::new(FileStore::new(dir.path().to_path_buf())));
        moods.set_target(&s, Some(98.0), Some(0.4)).await.unwrap();
        history.mark_played(&s, "t1").await.unwrap();
        cache.append(&s, analysis("t1", 98.0, 0.4)).await.unwrap();
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir.path().to_path_buf()));
    assert_eq!(store.sessions().await.unwrap(), vec![s.clone()]);

    let (moods, history, cache) = stores(store);
    assert_eq!(
        moods.get_target(&s).await.unwrap(),
        MoodTarget {
            tempo: 98.0,
            valence: 0.4
        }
    );
    assert!(history.has_played(&s, "t1").await.unwrap());
    assert_eq!(cache.all(&s).await.unwrap(), vec![analysis("t1", 98.0, 0.4)]);
}

#[tokio::test]
async fn test_file_store_missing_data() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("not-created-yet"));

    assert!(store.sessions().await.unwrap().is_empty());
    assert!(store.get(&session("nobody"), "mood").await.unwrap().is_none());
    store.remove_session(&session("nobody")).await.unwrap();
}

#[tokio::test]
async fn test_session_lifecycle() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let locks = Arc::new(SessionLocks::new());
    let sessions = SessionManager::new(Arc::clone(&store), Arc::clone(&locks));
    let (moods, _, _) = stores(Arc::clone(&store));

    let s = sessions.create().await.unwrap();
    assert!(sessions.meta(&s).await.unwrap().is_some());
    assert!(sessions.touch(&s).await.unwrap());
    moods.set_target(&s, Some(100.0), None).await.unwrap();

    sessions.destroy(&s).await.unwrap();
    assert!(sessions.meta(&s).await.unwrap().is_none());
    assert!(!sessions.touch(&s).await.unwrap());
    assert_eq!(moods.get_target(&s).await.unwrap(), MoodTarget::default());
    assert!(sessions.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_purge_expired_sessions() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let sessions = SessionManager::new(Arc::clone(&store), Arc::new(SessionLocks::new()));
    let now = Utc::now();

    let stale = session("stale");
    let active = session("active");
    let orphan = session("orphan");
    for (s, last_seen) in [(&stale, now - Duration::hours(3)), (&active, now)] {
        let meta = SessionMeta {
            created_at: last_seen,
            last_seen,
        };
        store::save(store.as_ref(), s, ENTITY_META, &meta)
            .await
            .unwrap();
    }
    // partition without metadata
    store
        .put(&orphan, "mood", serde_json::json!({"tempo": 100.0, "valence": 0.5}))
        .await
        .unwrap();

    let mut purged = sessions
        .purge_expired(Duration::hours(1), now)
        .await
        .unwrap();
    purged.sort();
    assert_eq!(purged, vec![orphan, stale]);

    let remaining: Vec<SessionId> = sessions
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|(s, _)| s)
        .collect();
    assert_eq!(remaining, vec![active]);
}

#[tokio::test]
async fn test_touch_unknown_session_leaves_no_lock() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let locks = Arc::new(SessionLocks::new());
    let sessions = SessionManager::new(Arc::clone(&store), Arc::clone(&locks));

    for i in 0..1000 {
        assert!(!sessions.touch(&session(&format!("stranger-{i}"))).await.unwrap());
    }
    assert_eq!(locks.tracked().await, 0);

    let s = sessions.create().await.unwrap();
    assert!(sessions.touch(&s).await.unwrap());
    assert_eq!(locks.tracked().await, 1);

    sessions.destroy(&s).await.unwrap();
    assert_eq!(locks.tracked().await, 0);
}
