// SPDX-License-Identifier: MPL-2.0

/// SQL schema for the cache database. The `posts_cache` column set is the
/// on-disk contract and must stay stable across releases.
pub const SCHEMA: &str = r#"
-- Database version for migrations
PRAGMA user_version = 1;

-- posts_cache: posts fetched from the primary source
-- created_at is RFC 3339 UTC with millisecond precision, so text order is time order
CREATE TABLE IF NOT EXISTS posts_cache (
    post_id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at TEXT NOT NULL,
    fetched_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_posts_cache_fetched_at ON posts_cache(fetched_at);
CREATE INDEX IF NOT EXISTS idx_posts_cache_created_at ON posts_cache(created_at DESC);
"#;
