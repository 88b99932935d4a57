// SPDX-License-Identifier: MPL-2.0

use crate::document::DocumentError;
use image::{GrayImage, ImageFormat};
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

/// Optical text extraction over a grayscale image.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, image: &GrayImage, language: &str) -> Result<String, DocumentError>;
}

/// Runs the `tesseract` executable, piping the image through stdin/stdout.
pub struct TesseractExtractor {
    binary: PathBuf,
}

impl TesseractExtractor {
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for TesseractExtractor {
    fn extract_text(&self, image: &GrayImage, language: &str) -> Result<String, DocumentError> {
        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| DocumentError::Ocr(format!("failed to encode image for OCR: {e}")))?;

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DocumentError::Ocr(format!("failed to run {}: {e}", self.binary.display()))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(&png) {
                drop(stdin);
                let _ = child.kill();
                let status = child
                    .wait()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|e| e.to_string());
                return Err(DocumentError::Ocr(format!(
                    "failed to send image to {} ({status}): {e}",
                    self.binary.display()
                )));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| DocumentError::Ocr(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocumentError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(chars = text.len(), "extracted document text");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_ocr_error() {
        let extractor = TesseractExtractor::with_binary("/nonexistent/tesseract-binary");
        let image = GrayImage::new(4, 4);

        let err = extractor.extract_text(&image, "por").unwrap_err();
        assert!(matches!(err, DocumentError::Ocr(_)));
    }

    #[test]
    fn test_unencodable_image_is_ocr_error() {
        let extractor = TesseractExtractor::with_binary("/nonexistent/tesseract-binary");

        let err = extractor.extract_text(&GrayImage::new(0, 0), "por").unwrap_err();
        assert!(
            matches!(&err, DocumentError::Ocr(msg) if msg.starts_with("failed to encode")),
            "{err:?}"
        );
    }

    /// Noise compresses badly, so the PNG outgrows the pipe buffer
    fn noisy_image(side: u32) -> GrayImage {
        let mut seed: u32 = 0x2545_f491;
        GrayImage::from_fn(side, side, |_, _| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            image::Luma([(seed >> 24) as u8])
        })
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_that_ignores_stdin_is_reaped() {
        // `true` exits without reading, so the write hits a closed pipe
        let extractor = TesseractExtractor::with_binary("true");

        let err = extractor.extract_text(&noisy_image(1024), "por").unwrap_err();
        let DocumentError::Ocr(msg) = err else {
            panic!("expected an OCR error, got {err:?}");
        };
        assert!(msg.starts_with("failed to send image to true"), "{msg}");
        // the exit status is only known once the child has been waited on
        assert!(msg.contains("exit status") || msg.contains("signal"), "{msg}");
    }
}
