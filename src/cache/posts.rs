// SPDX-License-Identifier: MPL-2.0

use crate::cache::{CacheDb, CacheError};
use crate::social::{Post, Source};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;

const UPSERT_SQL: &str = r#"
    INSERT INTO posts_cache (post_id, author_id, text, created_at, fetched_at)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(post_id) DO UPDATE SET
        author_id = excluded.author_id,
        text = excluded.text,
        created_at = excluded.created_at,
        fetched_at = excluded.fetched_at
"#;

/// Cache operations for posts fetched from the primary source
pub struct PostCache<'a> {
    db: &'a CacheDb,
}

impl<'a> PostCache<'a> {
    pub fn new(db: &'a CacheDb) -> Self {
        Self { db }
    }

    /// Insert or replace posts keyed by id, in one transaction.
    /// `fetched_at` is always "now".
    pub fn upsert(&self, posts: &[Post]) -> Result<(), CacheError> {
        self.upsert_at(posts, CacheDb::now())
    }

    pub(crate) fn upsert_at(&self, posts: &[Post], fetched_at: i64) -> Result<(), CacheError> {
        let mut conn = self.db.conn();
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
            for post in posts {
                stmt.execute(params![
                    post.id,
                    post.author_id,
                    post.text,
                    encode_timestamp(&post.created_at),
                    fetched_at,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Up to `limit` posts fetched within the last `max_age_secs`, most recent
    /// post first. Stale rows are never used to fill the gap.
    pub fn recent_posts(&self, limit: usize, max_age_secs: i64) -> Result<Vec<Post>, CacheError> {
        self.recent_posts_at(limit, max_age_secs, CacheDb::now())
    }

    pub(crate) fn recent_posts_at(
        &self,
        limit: usize,
        max_age_secs: i64,
        now: i64,
    ) -> Result<Vec<Post>, CacheError> {
        let conn = self.db.conn();
        let cutoff = now - max_age_secs;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = conn.prepare_cached(
            r#"
            SELECT post_id, author_id, text, created_at
            FROM posts_cache
            WHERE fetched_at >= ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )?;

        let posts = stmt
            .query_map(params![cutoff, limit], Self::row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    /// Total rows in the cache, fresh or not
    #[cfg(test)]
    pub fn count(&self) -> Result<i64, CacheError> {
        let conn = self.db.conn();
        Ok(conn.query_row("SELECT COUNT(*) FROM posts_cache", [], |row| row.get(0))?)
    }

    /// Convert a database row to a Post
    fn row_to_post(row: &rusqlite::Row) -> Result<Post, rusqlite::Error> {
        let created_at: String = row.get(3)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?
            .with_timezone(&Utc);

        Ok(Post {
            id: row.get(0)?,
            author_id: row.get(1)?,
            text: row.get(2)?,
            created_at,
            source: Source::Primary,
        })
    }
}

/// Fixed-width UTC encoding keeps `ORDER BY created_at` chronological
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
