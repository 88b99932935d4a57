// SPDX-License-Identifier: MPL-2.0

use crate::social::retriever::{FetchOutcome, SocialRetriever};
use crate::social::scrape::ScrapeSource;
use crate::social::types::Timeline;
use crate::social::RetrieveError;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedOrigin {
    Cache,
    Primary,
    Secondary,
}

/// A timeline plus where it ended up coming from, for display
#[derive(Debug, Clone)]
pub struct Feed {
    pub timeline: Timeline,
    pub origin: FeedOrigin,
}

/// Caller-side policy for showing a timeline: cache or primary source first,
/// and the unauthenticated scrape only when the primary source is rate limited.
pub async fn load_feed(
    retriever: &SocialRetriever,
    scraper: &ScrapeSource,
    handle: &str,
    count: usize,
) -> Result<Feed, RetrieveError> {
    match retriever.resolve(handle, count).await? {
        FetchOutcome::CacheHit(timeline) => Ok(Feed {
            timeline,
            origin: FeedOrigin::Cache,
        }),
        FetchOutcome::PrimaryOk(timeline) => Ok(Feed {
            timeline,
            origin: FeedOrigin::Primary,
        }),
        FetchOutcome::PrimaryRateLimited => {
            warn!(handle, "rate limit reached, falling back to public scrape");
            let posts = scraper.recent_posts(handle, count).await?;
            Ok(Feed {
                timeline: Timeline::new(posts, HashMap::new()),
                origin: FeedOrigin::Secondary,
            })
        }
        FetchOutcome::PrimaryFailed(e) => Err(e.into()),
    }
}
