// SPDX-License-Identifier: MPL-2.0

use crate::config::{CLASSIFIER_TIMEOUT_SECS, USER_AGENT};
use crate::relevance::RelevanceError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// A text-classification service that answers a prompt with free-form text.
#[async_trait]
pub trait ClassificationService: Send + Sync {
    /// Deterministic completion (temperature 0). A reply that cannot be read
    /// as text comes back as an empty string, not an error.
    async fn complete(&self, prompt: &str) -> Result<String, RelevanceError>;
}

/// OpenAI-compatible chat completions endpoint
pub struct OpenAiClassifier {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    model: String,
}

impl OpenAiClassifier {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, RelevanceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(CLASSIFIER_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        let base_url = Url::parse(base_url)
            .map_err(|e| RelevanceError::Network(format!("invalid classifier url: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_key,
            model: model.into(),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ClassificationService for OpenAiClassifier {
    async fn complete(&self, prompt: &str) -> Result<String, RelevanceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RelevanceError::Auth("classifier API key not configured".to_string()))?;
        let endpoint = self
            .base_url
            .join("v1/chat/completions")
            .map_err(|e| RelevanceError::Network(e.to_string()))?;

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        debug!(model = %self.model, "requesting classification");
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RelevanceError::Auth(body),
                StatusCode::TOO_MANY_REQUESTS => RelevanceError::RateLimited,
                other => RelevanceError::Status(other.as_u16()),
            });
        }

        let body = response.text().await?;
        let answer = match serde_json::from_str::<ChatResponse>(&body) {
            Ok(parsed) => parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default(),
            Err(e) => {
                warn!("unreadable classifier response: {e}");
                String::new()
            }
        };
        Ok(answer)
    }
}
