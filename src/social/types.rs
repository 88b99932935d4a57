// SPDX-License-Identifier: MPL-2.0

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Where a post's data came from, decided once when the post is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Authenticated API, either live or rebuilt from the local cache
    Primary,
    /// Unauthenticated scrape of a public mirror
    Secondary,
}

/// One social post, identical in shape whether it came from cache, API or scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorInfo {
    pub id: String,
    pub username: String,
    pub name: String,
    pub profile_image_url: Option<String>,
}

/// Posts (most recent first) plus metadata for the authors that the source returned.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub posts: Vec<Post>,
    pub authors: HashMap<String, AuthorInfo>,
}

impl Timeline {
    pub fn new(mut posts: Vec<Post>, authors: HashMap<String, AuthorInfo>) -> Self {
        sort_most_recent_first(&mut posts);
        Self { posts, authors }
    }

    pub fn author_of(&self, post: &Post) -> Option<&AuthorInfo> {
        self.authors.get(&post.author_id)
    }
}

pub fn sort_most_recent_first(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Case-insensitive check for `organization` (bare or `@`-prefixed) in `text`.
pub fn mentions_organization(text: &str, organization: &str) -> bool {
    if organization.is_empty() {
        return false;
    }
    // "@FURIA" contains "FURIA", so the bare check covers the handle form too
    text.to_uppercase().contains(&organization.to_uppercase())
}
