// SPDX-License-Identifier: MPL-2.0

pub const APP_ID: &str = "knowyourfan";
pub const USER_AGENT: &str = "KnowYourFan/0.1 (fan verification)";

/// Organization whose fans are being verified
pub const DEFAULT_ORGANIZATION: &str = "FURIA";

pub const DEFAULT_TWITTER_API: &str = "https://api.twitter.com";
/// Public Nitter-style mirror used for unauthenticated scraping
pub const DEFAULT_SCRAPE_MIRROR: &str = "https://nitter.net";
pub const DEFAULT_OPENAI_API: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// How long a cached post counts as fresh (10 minutes)
pub const CACHE_TTL_SECS: i64 = 10 * 60;

pub const SOCIAL_TIMEOUT_SECS: u64 = 10;
pub const PAGE_FETCH_TIMEOUT_SECS: u64 = 5;
pub const CLASSIFIER_TIMEOUT_SECS: u64 = 30;

/// Tesseract language code for Brazilian identity documents
pub const OCR_LANGUAGE: &str = "por";
