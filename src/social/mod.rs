// SPDX-License-Identifier: MPL-2.0

mod client;
mod feed;
mod retriever;
mod scrape;
mod types;

#[cfg(test)]
pub use client::PrimarySource;
pub use client::TwitterClient;
pub use feed::{Feed, FeedOrigin, load_feed};
pub use retriever::SocialRetriever;
pub use scrape::ScrapeSource;
pub use types::{Post, Source, Timeline};

use crate::cache::CacheError;
use thiserror::Error;

/// Failures talking to a social source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status {0}: {1}")]
    Status(u16, String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if e.is_decode() {
            SourceError::InvalidResponse(e.to_string())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum RetrieveError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Source(#[from] SourceError),
}
