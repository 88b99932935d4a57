// SPDX-License-Identifier: MPL-2.0

mod ocr;
mod validator;

pub use ocr::{TesseractExtractor, TextExtractor};
pub use validator::DocumentValidator;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("text extraction failed: {0}")]
    Ocr(String),
}
