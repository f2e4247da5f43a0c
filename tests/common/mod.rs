#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use moodtune::{
    engine::{AnalysisClient, MoodEngine, MusicService},
    errors::{Collaborator, EngineError, Result},
    management::{KeyValueStore, MemoryStore, TokenEndpoint},
    types::{Artist, MoodTarget, RefreshedToken, TokenPair, Track, TrackAnalysis},
};

pub fn pair(access: &str, refresh: Option<&str>) -> TokenPair {
    TokenPair {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_at: Utc::now() + Duration::hours(1),
    }
}

pub fn analysis(track_id: &str, tempo: f64, valence: f64) -> TrackAnalysis {
    TrackAnalysis {
        track_id: track_id.to_string(),
        title: format!("{track_id} title"),
        tempo,
        valence,
    }
}

pub fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        name: format!("{id} name"),
        artists: vec![Artist {
            id: format!("{id}_artist"),
            name: format!("{id} artist"),
        }],
    }
}

pub fn artist(id: &str) -> Artist {
    Artist {
        id: id.to_string(),
        name: format!("{id} name"),
    }
}

/// Token endpoint answering refreshes from a queue of canned outcomes.
#[derive(Default)]
pub struct FakeEndpoint {
    pub refresh_calls: AtomicUsize,
    pub refresh_outcomes: Mutex<Vec<std::result::Result<RefreshedToken, String>>>,
}

impl FakeEndpoint {
    pub fn refreshing_to(access: &str, refresh: Option<&str>) -> Self {
        let endpoint = Self::default();
        endpoint.push_refresh(Ok(RefreshedToken {
            access_token: access.to_string(),
            refresh_token: refresh.map(str::to_string),
            expires_at: Utc::now() + Duration::hours(1),
        }));
        endpoint
    }

    pub fn failing() -> Self {
        let endpoint = Self::default();
        endpoint.push_refresh(Err("invalid_grant".to_string()));
        endpoint
    }

    pub fn push_refresh(&self, outcome: std::result::Result<RefreshedToken, String>) {
        self.refresh_outcomes.lock().unwrap().push(outcome);
    }

    pub fn calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenEndpoint for FakeEndpoint {
    async fn exchange_code(&self, code: &str, _code_verifier: &str) -> Result<TokenPair> {
        Ok(pair(&format!("access-for-{code}"), Some("refresh-1")))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedToken> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let mut outcomes = self.refresh_outcomes.lock().unwrap();
        let outcome = if outcomes.is_empty() {
            Err("no canned refresh".to_string())
        } else {
            outcomes.remove(0)
        };
        outcome.map_err(EngineError::TokenRefreshFailed)
    }
}

/// Music service with fixed top lists and recommendations.
#[derive(Default)]
pub struct FakeMusic {
    pub artists: Vec<Artist>,
    pub top_tracks: Vec<Track>,
    pub recommended: Vec<Track>,
    pub fail_recommendations: bool,
    pub seen_seeds: Mutex<Vec<String>>,
    pub seen_targets: Mutex<Vec<MoodTarget>>,
    pub seen_tokens: Mutex<Vec<String>>,
}

impl FakeMusic {
    pub fn recommending(id: &str) -> Self {
        Self {
            artists: vec![artist("a1"), artist("a2")],
            top_tracks: vec![track("top1")],
            recommended: vec![track(id)],
            ..Self::default()
        }
    }
}

#[async_trait]
impl MusicService for FakeMusic {
    async fn top_artists(&self, token: &str, limit: u32) -> Result<Vec<Artist>> {
        self.seen_tokens.lock().unwrap().push(token.to_string());
        Ok(self.artists.iter().take(limit as usize).cloned().collect())
    }

    async fn top_tracks(&self, _token: &str, limit: u32) -> Result<Vec<Track>> {
        Ok(self.top_tracks.iter().take(limit as usize).cloned().collect())
    }

    async fn recommendations(
        &self,
        _token: &str,
        seed_artists: &[String],
        target: MoodTarget,
    ) -> Result<Vec<Track>> {
        self.seen_seeds
            .lock()
            .unwrap()
            .extend(seed_artists.iter().cloned());
        self.seen_targets.lock().unwrap().push(target);
        if self.fail_recommendations {
            return Err(EngineError::upstream(
                Collaborator::MusicService,
                "status 500",
            ));
        }
        Ok(self.recommended.clone())
    }
}

/// Analyzer with a fixed estimate per track; unknown tracks are unavailable.
#[derive(Default)]
pub struct FakeAnalyzer {
    pub estimates: Vec<(String, f64, f64)>,
    pub calls: AtomicUsize,
}

impl FakeAnalyzer {
    pub fn with(estimates: &[(&str, f64, f64)]) -> Self {
        Self {
            estimates: estimates
                .iter()
                .map(|(id, tempo, valence)| (id.to_string(), *tempo, *valence))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AnalysisClient for FakeAnalyzer {
    async fn analyze(&self, track_id: &str, title: &str) -> Result<TrackAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.estimates
            .iter()
            .find(|(id, _, _)| id == track_id)
            .map(|(id, tempo, valence)| TrackAnalysis {
                track_id: id.clone(),
                title: title.to_string(),
                tempo: *tempo,
                valence: *valence,
            })
            .ok_or_else(|| EngineError::AnalysisUnavailable(format!("no estimate for {track_id}")))
    }
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

pub fn engine(
    endpoint: Arc<FakeEndpoint>,
    music: Arc<FakeMusic>,
    analyzer: Option<Arc<FakeAnalyzer>>,
) -> MoodEngine {
    MoodEngine::new(
        memory_store(),
        endpoint,
        music,
        analyzer.map(|a| a as Arc<dyn AnalysisClient>),
    )
}

/// Records tracing events so tests can assert on what was logged.
#[derive(Clone, Default)]
pub struct LogCapture {
    records: Arc<Mutex<Vec<(tracing::Level, String)>>>,
}

impl LogCapture {
    pub fn contains(&self, level: tracing::Level, pattern: &str) -> bool {
        self.records
            .lock()
            .unwrap()
            .iter()
            .any(|(l, m)| *l == level && m.contains(pattern))
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        struct MessageVisitor(String);

        impl tracing::field::Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{value:?}");
                }
            }
        }

        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.records
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}
