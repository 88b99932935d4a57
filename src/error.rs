// SPDX-License-Identifier: MPL-2.0

use crate::cache::CacheError;
use crate::document::DocumentError;
use crate::relevance::RelevanceError;
use crate::social::{RetrieveError, SourceError};
use std::fmt;
use thiserror::Error;

/// Coarse failure classes the caller branches on when deciding what to show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unreadable image or page content
    Decode,
    /// Network failure, timeout or unexpected status
    Transport,
    /// Primary social source quota exceeded; the secondary source may help
    RateLimited,
    /// Missing or rejected credentials
    Auth,
    /// Local cache read/write failure
    Storage,
    /// Local OCR engine missing or crashed
    Extraction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Decode => "decode",
            ErrorKind::Transport => "transport",
            ErrorKind::RateLimited => "rate-limited",
            ErrorKind::Auth => "auth",
            ErrorKind::Storage => "storage",
            ErrorKind::Extraction => "extraction",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Social(#[from] SourceError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Relevance(#[from] RelevanceError),
}

impl From<RetrieveError> for VerifyError {
    fn from(e: RetrieveError) -> Self {
        match e {
            RetrieveError::Cache(e) => VerifyError::Cache(e),
            RetrieveError::Source(e) => VerifyError::Social(e),
        }
    }
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::Document(DocumentError::Decode(_) | DocumentError::Io(_)) => {
                ErrorKind::Decode
            }
            VerifyError::Document(DocumentError::Ocr(_)) => ErrorKind::Extraction,
            VerifyError::Social(e) => match e {
                SourceError::RateLimited => ErrorKind::RateLimited,
                SourceError::Auth(_) => ErrorKind::Auth,
                SourceError::InvalidResponse(_) => ErrorKind::Decode,
                SourceError::NotFound(_)
                | SourceError::Timeout
                | SourceError::Network(_)
                | SourceError::Status(..) => ErrorKind::Transport,
            },
            VerifyError::Cache(_) => ErrorKind::Storage,
            VerifyError::Relevance(e) => match e {
                RelevanceError::Auth(_) => ErrorKind::Auth,
                // the classifier's quota is not the social fallback trigger
                RelevanceError::RateLimited
                | RelevanceError::Timeout
                | RelevanceError::Network(_)
                | RelevanceError::Status(_) => ErrorKind::Transport,
            },
        }
    }
}
