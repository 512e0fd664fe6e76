//! Error types for the itemize-core library.

use thiserror::Error;

/// Main error type for the itemize library.
#[derive(Error, Debug)]
pub enum ItemizeError {
    /// Document reading error.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to reading a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Failed to open/parse the document.
    #[error("failed to parse document: {0}")]
    Parse(String),

    /// The document is encrypted and cannot be processed.
    #[error("document is encrypted")]
    Encrypted,

    /// The document is empty or has no pages.
    #[error("document has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),

    /// Failed to extract text from a page.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// Failed to produce an image of a page.
    #[error("failed to render page: {0}")]
    Render(String),

    /// The reader does not provide this capability.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// OCR is not enabled for this extraction.
    #[error("OCR is disabled")]
    Disabled,

    /// The page could not be turned into an image.
    #[error("page image unavailable: {0}")]
    PageImage(#[from] DocumentError),
}

/// Result type for the itemize library.
pub type Result<T> = std::result::Result<T, ItemizeError>;
