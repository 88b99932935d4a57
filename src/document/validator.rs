// SPDX-License-Identifier: MPL-2.0

use crate::config::OCR_LANGUAGE;
use crate::document::{DocumentError, TextExtractor};
use crate::text::normalize;
use regex::Regex;
use tracing::{debug, info};

/// Checks a scanned identity document against the name and birth date the fan typed in.
pub struct DocumentValidator {
    extractor: Box<dyn TextExtractor>,
}

impl DocumentValidator {
    pub fn new(extractor: Box<dyn TextExtractor>) -> Self {
        Self { extractor }
    }

    /// `expected_birth_date` is `DD/MM/YYYY`. Returns true only when both the
    /// name and the date are found in the extracted text.
    pub fn validate(
        &self,
        image_bytes: &[u8],
        expected_name: &str,
        expected_birth_date: &str,
    ) -> Result<bool, DocumentError> {
        let gray = image::load_from_memory(image_bytes)?.to_luma8();
        let raw = self.extractor.extract_text(&gray, OCR_LANGUAGE)?;

        let has_name = name_matches(&raw, expected_name);
        let has_birth_date = birth_date_matches(&raw, expected_birth_date);
        debug!(has_name, has_birth_date, "document field checks");

        let valid = has_name && has_birth_date;
        info!(valid, "document validated");
        Ok(valid)
    }
}

/// Exact substring match on normalized text. No tolerance for OCR noise.
fn name_matches(raw: &str, expected: &str) -> bool {
    if expected.trim().is_empty() {
        return false;
    }
    normalize(raw).contains(&normalize(expected))
}

/// Dates are compared with separators removed (`15/03/1990` -> `15031990`) and
/// must stand as a whole word in the raw, non-normalized text.
fn birth_date_matches(raw: &str, expected: &str) -> bool {
    let token = expected.replace('/', "");
    let token = token.trim();
    if token.is_empty() {
        return false;
    }

    let Ok(pattern) = Regex::new(&format!(r"\b{}\b", regex::escape(token))) else {
        return false;
    };
    pattern.is_match(&raw.replace('/', ""))
}
