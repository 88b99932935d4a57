// SPDX-License-Identifier: MPL-2.0

//! Synchronous entry points for the onboarding flow. Each call blocks on the
//! shared runtime and returns a typed error the caller can show and retry.

use crate::cache::CacheDb;
use crate::document::{DocumentValidator, TesseractExtractor};
use crate::error::VerifyError;
use crate::relevance::{OpenAiClassifier, RelevanceClassifier};
use crate::runtime;
use crate::settings::Settings;
use crate::social::{Feed, Post, ScrapeSource, SocialRetriever, Timeline, TwitterClient, load_feed};

pub struct Pipeline {
    documents: DocumentValidator,
    retriever: SocialRetriever,
    scraper: ScrapeSource,
    classifier: RelevanceClassifier,
}

impl Pipeline {
    pub fn new(
        documents: DocumentValidator,
        retriever: SocialRetriever,
        scraper: ScrapeSource,
        classifier: RelevanceClassifier,
    ) -> Self {
        Self {
            documents,
            retriever,
            scraper,
            classifier,
        }
    }

    /// Wire the production collaborators from settings around an opened cache
    pub fn from_settings(settings: &Settings, cache: CacheDb) -> Result<Self, VerifyError> {
        let extractor = match &settings.tesseract_path {
            Some(path) => TesseractExtractor::with_binary(path),
            None => TesseractExtractor::new(),
        };
        let primary = TwitterClient::new(
            &settings.twitter_api_base,
            settings.twitter_bearer_token.clone(),
        )?;
        let classifier = OpenAiClassifier::new(
            &settings.openai_api_base,
            settings.openai_api_key.clone(),
            settings.openai_model.clone(),
        )?;

        Ok(Self::new(
            DocumentValidator::new(Box::new(extractor)),
            SocialRetriever::new(
                cache,
                Box::new(primary),
                settings.cache_ttl_secs,
                settings.organization.clone(),
            ),
            ScrapeSource::new(&settings.scrape_mirror)?,
            RelevanceClassifier::new(Box::new(classifier))?,
        ))
    }

    pub fn organization(&self) -> &str {
        self.retriever.organization()
    }

    pub fn validate_document(
        &self,
        image_bytes: &[u8],
        expected_name: &str,
        expected_birth_date: &str,
    ) -> Result<bool, VerifyError> {
        Ok(self
            .documents
            .validate(image_bytes, expected_name, expected_birth_date)?)
    }

    pub fn fetch_timeline(&self, handle: &str, count: usize) -> Result<Timeline, VerifyError> {
        Ok(runtime::block_on(self.retriever.fetch_timeline(handle, count))?)
    }

    pub fn fetch_mentions(&self, handle: &str, max_count: usize) -> Result<Vec<Post>, VerifyError> {
        Ok(runtime::block_on(self.retriever.fetch_mentions(handle, max_count))?)
    }

    /// Timeline for display, scraping the public mirror when the API is rate limited
    pub fn load_feed(&self, handle: &str, count: usize) -> Result<Feed, VerifyError> {
        Ok(runtime::block_on(load_feed(
            &self.retriever,
            &self.scraper,
            handle,
            count,
        ))?)
    }

    pub fn is_relevant(&self, url: &str, profile_summary: &str) -> Result<bool, VerifyError> {
        Ok(runtime::block_on(
            self.classifier.is_relevant(url, profile_summary),
        )?)
    }
}
