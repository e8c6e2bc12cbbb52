//! Document-to-text conversion.
//!
//! [`DocumentParser`] is the contract the normalizer depends on;
//! [`FormatConverter`] implements it for the four supported formats.

mod formats;

use std::path::Path;
use thiserror::Error;

/// The two recoverable failure classes of a conversion.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The parser could not read or decode the file.
    #[error("{0}")]
    Conversion(String),

    /// The file parsed, but its contents are unusable.
    #[error("{0}")]
    InvalidContent(String),
}

/// Source formats eligible for indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Html,
    Xlsx,
}

impl DocumentFormat {
    /// Map a lowercase file extension to its format. Matching is case-sensitive.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "html" => Some(Self::Html),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Turns one source file into plain text.
///
/// `format` is the one detected during discovery; parsers dispatch on it
/// rather than looking at the path again.
pub trait DocumentParser: Send + Sync {
    fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, ConvertError>;
}

/// Converter backed by `lopdf`, `docx-rs`, `scraper` and `calamine`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FormatConverter;

impl DocumentParser for FormatConverter {
    fn convert(&self, path: &Path, format: DocumentFormat) -> Result<String, ConvertError> {
        let text = match format {
            DocumentFormat::Pdf => formats::pdf_to_text(path)?,
            DocumentFormat::Docx => formats::docx_to_text(path)?,
            DocumentFormat::Html => formats::html_to_text(path)?,
            DocumentFormat::Xlsx => formats::xlsx_to_text(path)?,
        };

        if text.trim().is_empty() {
            return Err(ConvertError::InvalidContent(
                "document contains no extractable text".to_string(),
            ));
        }
        Ok(text)
    }
}
