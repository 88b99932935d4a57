// SPDX-License-Identifier: MPL-2.0

//! Best-effort fallback that scrapes a public, Nitter-style timeline mirror.
//! No credentials, no author metadata, no caching.

use crate::config::{SOCIAL_TIMEOUT_SECS, USER_AGENT};
use crate::html::inner_text;
use crate::social::SourceError;
use crate::social::types::{Post, Source, sort_most_recent_first};
use chrono::{NaiveDateTime, Utc};
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

const ITEM_MARKER: &str = "class=\"timeline-item";

static STATUS_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r#"href="/[^/"]+/status/(\d+)"#).unwrap());

static DATE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"class="tweet-date"[^>]*>\s*<a[^>]*title="([^"]+)""#).unwrap()
});

static CONTENT_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"(?s)class="tweet-content[^"]*"[^>]*>(.*?)</div>"#).unwrap()
});

/// e.g. `Apr 2, 2025 · 12:00 PM UTC`
const DATE_FORMAT: &str = "%b %d, %Y · %I:%M %p UTC";

pub struct ScrapeSource {
    http: reqwest::Client,
    mirror: Url,
}

impl ScrapeSource {
    pub fn new(mirror: &str) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SOCIAL_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        let mirror = Url::parse(mirror)
            .map_err(|e| SourceError::Network(format!("invalid mirror url: {e}")))?;
        Ok(Self { http, mirror })
    }

    /// Up to `count` public posts by `handle`, most recent first
    pub async fn recent_posts(&self, handle: &str, count: usize) -> Result<Vec<Post>, SourceError> {
        let handle = handle.trim_start_matches('@');
        let url = self
            .mirror
            .join(handle)
            .map_err(|e| SourceError::Network(format!("invalid handle {handle:?}: {e}")))?;

        debug!(%url, "scraping public timeline");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(handle.to_string()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16(), String::new()));
        }

        let html = response.text().await?;
        let posts = parse_timeline(&html, handle, count);
        info!(handle, posts = posts.len(), "scraped posts from secondary source");
        Ok(posts)
    }
}

fn parse_timeline(html: &str, handle: &str, count: usize) -> Vec<Post> {
    let mut seen = HashSet::new();
    let mut posts: Vec<Post> = html
        .split(ITEM_MARKER)
        .skip(1)
        .filter_map(|item| parse_item(item, handle))
        .filter(|post| seen.insert(post.id.clone()))
        .take(count)
        .collect();
    sort_most_recent_first(&mut posts);
    posts
}

fn parse_item(item: &str, handle: &str) -> Option<Post> {
    let id = STATUS_RE.captures(item)?.get(1)?.as_str().to_string();
    let text = inner_text(CONTENT_RE.captures(item)?.get(1)?.as_str());

    // An undated item keeps its place at the top rather than being dropped
    let created_at = DATE_RE
        .captures(item)
        .and_then(|c| c.get(1))
        .and_then(|m| NaiveDateTime::parse_from_str(m.as_str(), DATE_FORMAT).ok())
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now);

    Some(Post {
        id,
        author_id: handle.to_string(),
        text,
        created_at,
        source: Source::Secondary,
    })
}
