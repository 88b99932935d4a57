// SPDX-License-Identifier: MPL-2.0

use crate::cache::{CacheDb, CacheError, PostCache};
use crate::social::client::PrimarySource;
use crate::social::types::{Post, Timeline, mentions_organization};
use crate::social::{RetrieveError, SourceError};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Result of one cache-then-primary lookup. Each state has its own caching
/// and propagation behaviour:
/// - `CacheHit`: nothing fetched, nothing written
/// - `PrimaryOk`: every returned post was upserted
/// - `PrimaryRateLimited`: nothing written, caller may use the secondary source
/// - `PrimaryFailed`: nothing written, error goes back to the caller
#[derive(Debug)]
pub enum FetchOutcome {
    CacheHit(Timeline),
    PrimaryOk(Timeline),
    PrimaryRateLimited,
    PrimaryFailed(SourceError),
}

impl FetchOutcome {
    pub fn into_result(self) -> Result<Timeline, SourceError> {
        match self {
            FetchOutcome::CacheHit(timeline) | FetchOutcome::PrimaryOk(timeline) => Ok(timeline),
            FetchOutcome::PrimaryRateLimited => Err(SourceError::RateLimited),
            FetchOutcome::PrimaryFailed(e) => Err(e),
        }
    }
}

/// Cache-first access to the primary social source.
pub struct SocialRetriever {
    cache: CacheDb,
    primary: Box<dyn PrimarySource>,
    ttl_secs: i64,
    organization: String,
}

impl SocialRetriever {
    pub fn new(
        cache: CacheDb,
        primary: Box<dyn PrimarySource>,
        ttl_secs: i64,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            cache,
            primary,
            ttl_secs,
            organization: organization.into(),
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Run the freshness-then-primary policy. Only storage failures are
    /// returned as errors; source failures are states of the outcome.
    pub async fn resolve(&self, handle: &str, count: usize) -> Result<FetchOutcome, CacheError> {
        let posts = PostCache::new(&self.cache);

        let cached = posts.recent_posts(count, self.ttl_secs)?;
        if cached.len() >= count {
            debug!(handle, count, "serving timeline from cache");
            return Ok(FetchOutcome::CacheHit(Timeline::new(cached, HashMap::new())));
        }

        debug!(handle, count, fresh = cached.len(), "cache insufficient, querying primary source");
        match self.fetch_primary(handle, count).await {
            Ok(timeline) => {
                posts.upsert(&timeline.posts)?;
                info!(handle, cached = timeline.posts.len(), "primary source fetch cached");
                Ok(FetchOutcome::PrimaryOk(timeline))
            }
            Err(SourceError::RateLimited) => {
                warn!(handle, "primary source rate limited");
                Ok(FetchOutcome::PrimaryRateLimited)
            }
            Err(e) => {
                warn!(handle, "primary source failed: {e}");
                Ok(FetchOutcome::PrimaryFailed(e))
            }
        }
    }

    async fn fetch_primary(&self, handle: &str, count: usize) -> Result<Timeline, SourceError> {
        let author_id = self.primary.resolve_handle(handle).await?;
        self.primary.user_posts(&author_id, count).await
    }

    /// Recent posts for `handle`, most recent first, with author metadata when
    /// the primary source supplied it.
    pub async fn fetch_timeline(&self, handle: &str, count: usize) -> Result<Timeline, RetrieveError> {
        Ok(self.resolve(handle, count).await?.into_result()?)
    }

    /// Timeline posts that mention the organization
    pub async fn fetch_mentions(
        &self,
        handle: &str,
        max_count: usize,
    ) -> Result<Vec<Post>, RetrieveError> {
        let timeline = self.fetch_timeline(handle, max_count).await?;
        Ok(timeline
            .posts
            .into_iter()
            .filter(|p| mentions_organization(&p.text, &self.organization))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::social::types::{AuthorInfo, Source};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fake primary source that counts every network-equivalent call
    struct CountingSource {
        calls: Arc<AtomicUsize>,
        posts: Vec<Post>,
        failure: Option<fn() -> SourceError>,
    }

    #[async_trait]
    impl PrimarySource for CountingSource {
        async fn resolve_handle(&self, handle: &str) -> Result<String, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(fail) = self.failure {
                return Err(fail());
            }
            Ok(format!("id-{handle}"))
        }

        async fn user_posts(&self, author_id: &str, count: usize) -> Result<Timeline, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let author = AuthorInfo {
                id: author_id.to_string(),
                username: "org".to_string(),
                name: "Org".to_string(),
                profile_image_url: None,
            };
            let posts = self.posts.iter().take(count).cloned().collect();
            Ok(Timeline::new(
                posts,
                HashMap::from([(author_id.to_string(), author)]),
            ))
        }
    }

    fn post(id: usize, text: &str) -> Post {
        Post {
            id: id.to_string(),
            author_id: "id-org".to_string(),
            text: text.to_string(),
            created_at: Utc.timestamp_opt(1_700_000_000 + id as i64 * 60, 0).unwrap(),
            source: Source::Primary,
        }
    }

    fn retriever(
        db: &CacheDb,
        posts: Vec<Post>,
        failure: Option<fn() -> SourceError>,
    ) -> (SocialRetriever, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = CountingSource {
            calls: Arc::clone(&calls),
            posts,
            failure,
        };
        (
            SocialRetriever::new(db.clone(), Box::new(source), 600, "FURIA"),
            calls,
        )
    }

    #[tokio::test]
    async fn test_fresh_cache_makes_no_network_calls() {
        let db = CacheDb::open_in_memory().unwrap();
        let seeded: Vec<_> = (1..=5).map(|i| post(i, "cached")).collect();
        PostCache::new(&db).upsert(&seeded).unwrap();

        let (retriever, calls) = retriever(&db, vec![], None);
        let outcome = retriever.resolve("org", 5).await.unwrap();

        assert!(matches!(outcome, FetchOutcome::CacheHit(ref t) if t.posts.len() == 5));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_cache_then_cached_within_ttl() {
        let db = CacheDb::open_in_memory().unwrap();
        let remote: Vec<_> = (1..=5).map(|i| post(i, "live")).collect();
        let (retriever, calls) = retriever(&db, remote, None);

        let first = retriever.fetch_timeline("org", 5).await.unwrap();
        assert_eq!(first.posts.len(), 5);
        assert_eq!(first.authors["id-org"].username, "org");
        // resolve_handle + user_posts
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(PostCache::new(&db).count().unwrap(), 5);

        let second = retriever.fetch_timeline("org", 5).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(second.authors.is_empty());

        let first_ids: Vec<_> = first.posts.iter().map(|p| &p.id).collect();
        let second_ids: Vec<_> = second.posts.iter().map(|p| &p.id).collect();
        assert_eq!(first_ids, second_ids);
        assert_eq!(second_ids[0], "5");
    }

    #[tokio::test]
    async fn test_partial_cache_goes_to_network() {
        let db = CacheDb::open_in_memory().unwrap();
        PostCache::new(&db).upsert(&[post(1, "cached")]).unwrap();

        let remote: Vec<_> = (1..=3).map(|i| post(i, "live")).collect();
        let (retriever, calls) = retriever(&db, remote, None);

        let outcome = retriever.resolve("org", 3).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::PrimaryOk(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_cache_goes_to_network() {
        let db = CacheDb::open_in_memory().unwrap();
        let seeded: Vec<_> = (1..=5).map(|i| post(i, "old")).collect();
        PostCache::new(&db)
            .upsert_at(&seeded, CacheDb::now() - 601)
            .unwrap();

        let (retriever, calls) = retriever(&db, seeded.clone(), None);
        retriever.fetch_timeline("org", 5).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_is_its_own_state() {
        let db = CacheDb::open_in_memory().unwrap();
        let (retriever, _) = retriever(&db, vec![], Some(|| SourceError::RateLimited));

        let outcome = retriever.resolve("org", 5).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::PrimaryRateLimited));

        let err = retriever.fetch_timeline("org", 5).await.unwrap_err();
        assert!(matches!(err, RetrieveError::Source(SourceError::RateLimited)));
        assert_eq!(PostCache::new(&db).count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_other_failures_propagate_uncached() {
        let db = CacheDb::open_in_memory().unwrap();
        let (retriever, calls) =
            retriever(&db, vec![], Some(|| SourceError::NotFound("org".into())));

        let err = retriever.fetch_timeline("org", 5).await.unwrap_err();
        assert!(matches!(err, RetrieveError::Source(SourceError::NotFound(_))));
        // no internal retry
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(PostCache::new(&db).count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fetch_mentions_filters_on_organization() {
        let db = CacheDb::open_in_memory().unwrap();
        let remote = vec![
            post(1, "Great game last night!"),
            post(2, "Can't wait for FURIA's next match"),
            post(3, "bora @furia"),
        ];
        let (retriever, _) = retriever(&db, remote, None);

        let mentions = retriever.fetch_mentions("fan", 3).await.unwrap();
        let texts: Vec<_> = mentions.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["bora @furia", "Can't wait for FURIA's next match"]);
    }
}
