//! Document Extractor: turns an uploaded resume file into plain text.
//!
//! Format selection is a single ordered matcher over the declared MIME type and the
//! filename; each `DocumentFormat` variant owns one extraction strategy.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

pub mod docx;
pub mod pdf;

pub use docx::DocxLibrary;
pub use pdf::PdfLibrary;

/// Extracted text shorter than this (after trimming) is treated as unreadable.
pub const MIN_TEXT_CHARS: usize = 5;

/// A DOCX body may inflate to this many times the upload cap.
pub const DOCX_INFLATE_FACTOR: usize = 20;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("{0} library not fully loaded")]
    LibraryNotLoaded(&'static str),

    #[error("unsupported file type")]
    UnsupportedFormat,

    #[error("file appears empty or unreadable")]
    EmptyOrUnreadable,

    #[error("file is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("{0}")]
    Malformed(String),
}

/// A file as received from the user, before any parsing.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    /// Declared MIME type; empty when the client sent none.
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentFormat {
    /// First matching rule wins. Filename checks are case-insensitive.
    pub fn detect(content_type: &str, filename: &str) -> Result<Self, ExtractError> {
        let name = filename.to_lowercase();

        if content_type == "application/pdf" || name.ends_with(".pdf") {
            Ok(DocumentFormat::Pdf)
        } else if name.ends_with(".docx") || content_type.contains("document") {
            Ok(DocumentFormat::Docx)
        } else if content_type == "text/plain" || name.ends_with(".txt") {
            Ok(DocumentFormat::PlainText)
        } else {
            Err(ExtractError::UnsupportedFormat)
        }
    }
}

/// Runs the extraction strategy for an uploaded file against the loaded libraries.
#[derive(Clone)]
pub struct Extractor {
    pdf: Arc<PdfLibrary>,
    docx: Arc<DocxLibrary>,
    max_bytes: usize,
}

impl Extractor {
    pub fn new(pdf: Arc<PdfLibrary>, docx: Arc<DocxLibrary>, max_bytes: usize) -> Self {
        Self {
            pdf,
            docx,
            max_bytes,
        }
    }

    pub async fn extract(&self, file: &UploadedFile) -> Result<String, ExtractError> {
        if file.bytes.len() > self.max_bytes {
            return Err(ExtractError::TooLarge {
                size: file.bytes.len(),
                limit: self.max_bytes,
            });
        }

        let format = DocumentFormat::detect(&file.content_type, &file.filename)?;
        debug!(
            "Processing '{}' ({}) as {:?}",
            file.filename, file.content_type, format
        );

        let text = match format {
            DocumentFormat::Pdf => {
                let pages = self.pdf.extract_pages(file.bytes.clone()).await?;
                pdf::join_pages(&pages)
            }
            DocumentFormat::Docx => {
                let max_xml_bytes = self.max_bytes.saturating_mul(DOCX_INFLATE_FACTOR);
                self.docx
                    .extract_raw_text(file.bytes.clone(), max_xml_bytes)
                    .await?
            }
            DocumentFormat::PlainText => decode_plain_text(&file.bytes),
        };

        ensure_readable(text).inspect(|text| {
            info!(
                "Extracted {} characters from '{}'",
                text.chars().count(),
                file.filename
            )
        })
    }
}

/// UTF-8 with replacement characters; a leading byte-order mark is dropped.
pub fn decode_plain_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

fn ensure_readable(text: String) -> Result<String, ExtractError> {
    if text.trim().chars().count() < MIN_TEXT_CHARS {
        return Err(ExtractError::EmptyOrUnreadable);
    }
    Ok(text)
}
