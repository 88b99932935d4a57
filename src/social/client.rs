// SPDX-License-Identifier: MPL-2.0

use crate::config::{SOCIAL_TIMEOUT_SECS, USER_AGENT};
use crate::social::types::{AuthorInfo, Post, Source, Timeline};
use crate::social::SourceError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// The Twitter API v2 accepts between 5 and 100 results per page
const MIN_RESULTS: usize = 5;
const MAX_RESULTS: usize = 100;

static HANDLE_RE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9_]{1,15}$").unwrap());

/// Authenticated, rate-limited source of posts.
#[async_trait]
pub trait PrimarySource: Send + Sync {
    /// Resolve a public handle to the source's stable author id
    async fn resolve_handle(&self, handle: &str) -> Result<String, SourceError>;

    /// Up to `count` recent posts by `author_id`, with author metadata
    async fn user_posts(&self, author_id: &str, count: usize) -> Result<Timeline, SourceError>;
}

/// Twitter API v2 client using app-only bearer authentication.
pub struct TwitterClient {
    http: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl TwitterClient {
    pub fn new(base_url: &str, bearer_token: Option<String>) -> Result<Self, SourceError> {
        Self::with_timeout(
            base_url,
            bearer_token,
            Duration::from_secs(SOCIAL_TIMEOUT_SECS),
        )
    }

    /// Every request fails with `SourceError::Timeout` once `timeout` elapses
    pub fn with_timeout(
        base_url: &str,
        bearer_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        let base_url = Url::parse(base_url)
            .map_err(|e| SourceError::Network(format!("invalid API base url: {e}")))?;

        Ok(Self {
            http,
            base_url,
            bearer_token,
        })
    }

    fn token(&self) -> Result<&str, SourceError> {
        self.bearer_token
            .as_deref()
            .ok_or_else(|| SourceError::Auth("bearer token not configured".to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<Url, SourceError> {
        self.base_url
            .join(path)
            .map_err(|e| SourceError::Network(format!("invalid endpoint {path}: {e}")))
    }
}

#[async_trait]
impl PrimarySource for TwitterClient {
    async fn resolve_handle(&self, handle: &str) -> Result<String, SourceError> {
        let handle = handle.trim_start_matches('@');
        if !HANDLE_RE.is_match(handle) {
            return Err(SourceError::NotFound(format!("invalid handle {handle:?}")));
        }

        debug!(handle, "resolving handle");
        let response = self
            .http
            .get(self.endpoint(&format!("2/users/by/username/{handle}"))?)
            .bearer_auth(self.token()?)
            .send()
            .await?;
        let response = check_status(response, handle).await?;

        let lookup: UserLookup = response.json().await?;
        lookup
            .data
            .map(|user| user.id)
            .ok_or_else(|| SourceError::NotFound(handle.to_string()))
    }

    async fn user_posts(&self, author_id: &str, count: usize) -> Result<Timeline, SourceError> {
        let max_results = count.clamp(MIN_RESULTS, MAX_RESULTS).to_string();

        debug!(author_id, count, "fetching user posts");
        let response = self
            .http
            .get(self.endpoint(&format!("2/users/{author_id}/tweets"))?)
            .bearer_auth(self.token()?)
            .query(&[
                ("max_results", max_results.as_str()),
                ("tweet.fields", "created_at,author_id"),
                ("expansions", "author_id"),
                ("user.fields", "username,name,profile_image_url"),
            ])
            .send()
            .await?;
        let response = check_status(response, author_id).await?;

        let body: TweetsResponse = response.json().await?;

        let posts = body
            .data
            .into_iter()
            .map(|tweet| tweet.into_post(author_id))
            .collect::<Result<Vec<_>, _>>()?;

        let authors: HashMap<String, AuthorInfo> = body
            .includes
            .map(|inc| inc.users)
            .unwrap_or_default()
            .into_iter()
            .map(|u| (u.id.clone(), u.into()))
            .collect();

        let mut timeline = Timeline::new(posts, authors);
        timeline.posts.truncate(count);
        info!(author_id, posts = timeline.posts.len(), "fetched posts from primary source");
        Ok(timeline)
    }
}

/// Map non-success statuses onto the error kinds callers branch on
async fn check_status(response: Response, subject: &str) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::TOO_MANY_REQUESTS => SourceError::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::Auth(body),
        StatusCode::NOT_FOUND => SourceError::NotFound(subject.to_string()),
        other => SourceError::Status(other.as_u16(), body),
    })
}

// ─── Wire types ───

#[derive(Deserialize)]
struct UserLookup {
    data: Option<ApiUser>,
}

#[derive(Deserialize)]
struct ApiUser {
    id: String,
    name: String,
    username: String,
    profile_image_url: Option<String>,
}

impl From<ApiUser> for AuthorInfo {
    fn from(u: ApiUser) -> Self {
        AuthorInfo {
            id: u.id,
            username: u.username,
            name: u.name,
            profile_image_url: u.profile_image_url,
        }
    }
}

#[derive(Deserialize)]
struct TweetsResponse {
    #[serde(default)]
    data: Vec<ApiTweet>,
    includes: Option<Includes>,
}

#[derive(Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<ApiUser>,
}

#[derive(Deserialize)]
struct ApiTweet {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl ApiTweet {
    fn into_post(self, requested_author: &str) -> Result<Post, SourceError> {
        let created_at = self
            .created_at
            .ok_or_else(|| SourceError::InvalidResponse(format!("post {} has no created_at", self.id)))?;

        Ok(Post {
            id: self.id,
            author_id: self
                .author_id
                .unwrap_or_else(|| requested_author.to_string()),
            text: self.text,
            created_at,
            source: Source::Primary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, VerifyError};
    use mockito::{Matcher, Server};

    /// Accepts connections and never answers
    fn silent_server() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let mut held = Vec::new();
            for stream in listener.incoming().flatten() {
                held.push(stream);
            }
        });
        format!("http://{addr}/")
    }

    fn tweets_body() -> String {
        serde_json::json!({
            "data": [
                {"id": "2", "text": "older", "author_id": "894704520", "created_at": "2025-04-01T12:00:00.000Z"},
                {"id": "3", "text": "newest", "author_id": "894704520", "created_at": "2025-04-02T12:00:00.000Z"},
                {"id": "1", "text": "oldest", "author_id": "894704520", "created_at": "2025-03-30T12:00:00.000Z"}
            ],
            "includes": {
                "users": [{
                    "id": "894704520",
                    "name": "FURIA",
                    "username": "FURIA",
                    "profile_image_url": "https://pbs.twimg.com/profile_images/furia.jpg"
                }]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_resolve_handle() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/2/users/by/username/FURIA")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"id": "894704520", "name": "FURIA", "username": "FURIA"}}"#)
            .create_async()
            .await;

        let client = TwitterClient::new(&server.url(), Some("secret".into())).unwrap();
        let id = client.resolve_handle("@FURIA").await.unwrap();

        assert_eq!(id, "894704520");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_handle_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/2/users/by/username/nobody_here")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errors": [{"title": "Not Found Error"}]}"#)
            .create_async()
            .await;

        let client = TwitterClient::new(&server.url(), Some("secret".into())).unwrap();
        let err = client.resolve_handle("nobody_here").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_is_distinct() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/2/users/by/username/FURIA")
            .with_status(429)
            .with_body(r#"{"title": "Too Many Requests"}"#)
            .create_async()
            .await;

        let client = TwitterClient::new(&server.url(), Some("secret".into())).unwrap();
        let err = client.resolve_handle("FURIA").await.unwrap_err();
        assert!(matches!(err, SourceError::RateLimited));
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/2/users/by/username/FURIA")
            .with_status(401)
            .create_async()
            .await;

        let client = TwitterClient::new(&server.url(), Some("expired".into())).unwrap();
        let err = client.resolve_handle("FURIA").await.unwrap_err();
        assert!(matches!(err, SourceError::Auth(_)));
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_network() {
        let client = TwitterClient::new("http://127.0.0.1:9", None).unwrap();
        let err = client.resolve_handle("FURIA").await.unwrap_err();
        assert!(matches!(err, SourceError::Auth(_)));
    }

    #[tokio::test]
    async fn test_invalid_handle_rejected() {
        let client = TwitterClient::new("http://127.0.0.1:9", Some("secret".into())).unwrap();
        let err = client.resolve_handle("../admin").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_user_posts_sorted_with_authors() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/2/users/894704520/tweets")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("max_results".into(), "5".into()),
                Matcher::UrlEncoded("expansions".into(), "author_id".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(tweets_body())
            .create_async()
            .await;

        let client = TwitterClient::new(&server.url(), Some("secret".into())).unwrap();
        let timeline = client.user_posts("894704520", 3).await.unwrap();

        mock.assert_async().await;
        let ids: Vec<_> = timeline.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["3", "2", "1"]);
        assert!(timeline.posts.iter().all(|p| p.source == Source::Primary));

        let author = timeline.author_of(&timeline.posts[0]).unwrap();
        assert_eq!(author.username, "FURIA");
    }

    #[tokio::test]
    async fn test_user_posts_truncates_to_requested_count() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/2/users/894704520/tweets")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(tweets_body())
            .create_async()
            .await;

        let client = TwitterClient::new(&server.url(), Some("secret".into())).unwrap();
        let timeline = client.user_posts("894704520", 2).await.unwrap();
        assert_eq!(timeline.posts.len(), 2);
        assert_eq!(timeline.posts[0].text, "newest");
    }

    #[tokio::test]
    async fn test_no_posts_is_empty_timeline() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/2/users/894704520/tweets")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"meta": {"result_count": 0}}"#)
            .create_async()
            .await;

        let client = TwitterClient::new(&server.url(), Some("secret".into())).unwrap();
        let timeline = client.user_posts("894704520", 5).await.unwrap();
        assert!(timeline.posts.is_empty());
        assert!(timeline.authors.is_empty());
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let client = TwitterClient::with_timeout(
            &silent_server(),
            Some("token".into()),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = client.resolve_handle("FURIA").await.unwrap_err();
        assert!(matches!(err, SourceError::Timeout));
        assert_eq!(VerifyError::from(err).kind(), ErrorKind::Transport);
    }
}
