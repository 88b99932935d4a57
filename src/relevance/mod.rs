// SPDX-License-Identifier: MPL-2.0

//! Esports profile link check: fetch the page, take its first heading, and
//! ask a language model whether it fits the fan's profile.

mod service;

pub use service::{ClassificationService, OpenAiClassifier};

use crate::config::{PAGE_FETCH_TIMEOUT_SECS, USER_AGENT};
use crate::html::inner_text;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RelevanceError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("classifier rate limit exceeded")]
    RateLimited,
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for RelevanceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RelevanceError::Timeout
        } else {
            RelevanceError::Network(e.to_string())
        }
    }
}

/// First `<h1>`, `<h2>` or `<title>` in document order
static HEADING_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?is)<(?:h1|h2|title)(?:\s[^>]*)?>(.*?)</(?:h1|h2|title)\s*>").unwrap()
});

/// Prompt input; lives only for the duration of one check
struct RelevanceQuery<'a> {
    profile_summary: &'a str,
    page_excerpt: &'a str,
}

impl RelevanceQuery<'_> {
    fn prompt(&self) -> String {
        format!(
            "Você é um modelo que verifica se um link de e-sports é relevante ao perfil do fã. \
             O perfil do usuário: {}. \
             Conteúdo extraído: {}. \
             Responda apenas 'SIM' ou 'NÃO' se for relevante.",
            self.profile_summary, self.page_excerpt
        )
    }
}

pub struct RelevanceClassifier {
    http: reqwest::Client,
    service: Box<dyn ClassificationService>,
}

impl RelevanceClassifier {
    pub fn new(service: Box<dyn ClassificationService>) -> Result<Self, RelevanceError> {
        Self::with_page_timeout(service, Duration::from_secs(PAGE_FETCH_TIMEOUT_SECS))
    }

    pub fn with_page_timeout(
        service: Box<dyn ClassificationService>,
        timeout: Duration,
    ) -> Result<Self, RelevanceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, service })
    }

    /// Whether the page at `url` is relevant to `profile_summary`.
    /// Page and service transport failures are errors; an unusable answer is `false`.
    pub async fn is_relevant(&self, url: &str, profile_summary: &str) -> Result<bool, RelevanceError> {
        let html = self.fetch_page(url).await?;
        let excerpt = extract_excerpt(&html);
        debug!(url, excerpt = %excerpt, "page excerpt");

        let query = RelevanceQuery {
            profile_summary,
            page_excerpt: &excerpt,
        };
        let answer = self.service.complete(&query.prompt()).await?;

        let relevant = parse_verdict(&answer);
        info!(url, relevant, "esports link classified");
        Ok(relevant)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, RelevanceError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelevanceError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// Text of the first heading or title element, or empty when there is none
fn extract_excerpt(html: &str) -> String {
    HEADING_RE
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| inner_text(m.as_str()))
        .unwrap_or_default()
}

/// Affirmative iff the first word of the answer starts with "SIM"
fn parse_verdict(answer: &str) -> bool {
    answer
        .trim()
        .to_uppercase()
        .split_whitespace()
        .next()
        .is_some_and(|token| token.starts_with("SIM"))
}
