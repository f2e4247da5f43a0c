//! Language-model backed tempo/valence estimation.
//!
//! The chat-completions endpoint is asked for a JSON object with `tempo`
//! and `valence` keys. Any failure along the way (transport, status, an
//! unparsable or out-of-shape reply) is reported as
//! [`EngineError::AnalysisUnavailable`] so the caller simply skips the track.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::{
    config::Config,
    engine::AnalysisClient,
    errors::{Collaborator, EngineError, Result},
    types::TrackAnalysis,
};

const SYSTEM_PROMPT: &str = "You are a music analysis assistant. Given a song title and artist, \
estimate its tempo (in BPM) and emotional valence (from 0 to 1, where 0 is sad/negative and 1 is \
happy/positive). Reply with a JSON object with exactly the keys \"tempo\" and \"valence\".";

const TEMPERATURE: f64 = 0.7;

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MoodEstimate {
    pub tempo: f64,
    pub valence: f64,
}

/// Parses the model's reply, tolerating a fenced code block around the JSON.
pub fn parse_estimate(content: &str) -> Option<MoodEstimate> {
    let trimmed = content.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    let estimate: MoodEstimate = serde_json::from_str(trimmed.get(start..=end)?).ok()?;

    let plausible = estimate.tempo.is_finite()
        && estimate.tempo > 0.0
        && (0.0..=1.0).contains(&estimate.valence);
    plausible.then_some(estimate)
}

pub struct OpenAiAnalyzer {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAiAnalyzer {
    pub fn new(client: Client, url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            url,
            api_key,
            model,
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(client: Client, config: &Config) -> Option<Self> {
        let api_key = config.openai_api_key.clone()?;
        Some(Self::new(
            client,
            config.openai_url.clone(),
            api_key,
            config.openai_model.clone(),
        ))
    }
}

#[async_trait]
impl AnalysisClient for OpenAiAnalyzer {
    async fn analyze(&self, track_id: &str, title: &str) -> Result<TrackAnalysis> {
        let unavailable =
            |reason: String| EngineError::AnalysisUnavailable(format!("{title}: {reason}"));

        let res = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": format!("Song: {title}") },
                ],
                "temperature": TEMPERATURE,
            }))
            .send()
            .await
            .map_err(|e| {
                warn!(
                    collaborator = %Collaborator::AnalysisService,
                    error = %e,
                    "analysis request failed"
                );
                unavailable(e.to_string())
            })?;

        // a bad key or quota shows up here on every track
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(
                collaborator = %Collaborator::AnalysisService,
                status = %status,
                body = %body,
                "analysis service rejected request"
            );
            return Err(unavailable(format!("analysis service returned {status}")));
        }

        let completion: ChatCompletion =
            res.json().await.map_err(|e| unavailable(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| unavailable("empty completion".to_string()))?;

        let estimate = parse_estimate(&content)
            .ok_or_else(|| unavailable(format!("unexpected response format: {content}")))?;

        Ok(TrackAnalysis {
            track_id: track_id.to_string(),
            title: title.to_string(),
            tempo: estimate.tempo,
            valence: estimate.valence,
        })
    }
}
