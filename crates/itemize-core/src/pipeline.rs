//! End-to-end processing of one document.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::document::{DocumentReader, MemoryDocument, PdfDocument};
use crate::error::{DocumentError, Result};
use crate::invoice::{MetadataExtractor, ReconciliationAuditor};
use crate::models::config::OcrConfig;
use crate::models::dataset::{AuditRecord, Dataset};
use crate::normalize::{ColumnNormalizer, NumericCoercer};
use crate::ocr::{OcrEscalator, TextRecognizer};
use crate::tables::TableExtractor;

/// Per-call settings threaded from the caller down to page processing.
#[derive(Clone, Copy)]
pub struct ExtractionContext<'a> {
    recognizer: Option<&'a dyn TextRecognizer>,
    render_dpi: u32,
}

impl<'a> ExtractionContext<'a> {
    /// Context without OCR.
    pub fn new() -> Self {
        Self {
            recognizer: None,
            render_dpi: OcrConfig::default().render_dpi,
        }
    }

    /// Context following an OCR configuration; `recognizer` is ignored when OCR is disabled.
    pub fn from_config(config: &OcrConfig, recognizer: Option<&'a dyn TextRecognizer>) -> Self {
        Self {
            recognizer: recognizer.filter(|_| config.enabled),
            render_dpi: config.render_dpi,
        }
    }

    /// Escalate text-less pages to this recognizer.
    pub fn with_ocr(mut self, recognizer: &'a dyn TextRecognizer) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Set the DPI pages are rendered at for OCR.
    pub fn with_render_dpi(mut self, dpi: u32) -> Self {
        self.render_dpi = dpi;
        self
    }

    pub fn ocr_enabled(&self) -> bool {
        self.recognizer.is_some()
    }
}

impl Default for ExtractionContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// The two outputs of processing a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub dataset: Dataset,
    pub audit: AuditRecord,
}

/// Extract the canonical dataset and audit from an open document.
pub fn extract_document(reader: &dyn DocumentReader, ctx: &ExtractionContext<'_>) -> ProcessedDocument {
    let escalator = OcrEscalator::new(ctx.recognizer, ctx.render_dpi);
    let extraction = TableExtractor::new(escalator).extract(reader);
    let tables_found = extraction.tables.len();
    let full_text = extraction.full_text();

    let normalizer = ColumnNormalizer::new();
    let coercer = NumericCoercer::new();
    let mut dataset = Dataset::new();
    for table in extraction.tables {
        let (columns, rows) = normalizer.normalize(table).into_rows(&coercer);
        dataset.append(columns, rows);
    }

    let metadata = MetadataExtractor::new().extract(&full_text);
    let audit = ReconciliationAuditor::new().audit(
        reader.identifier(),
        &dataset,
        tables_found,
        metadata,
        extraction.warnings,
    );

    info!(
        "{}: {} rows from {} tables, {} warnings",
        audit.file,
        dataset.len(),
        tables_found,
        audit.warnings.len()
    );

    ProcessedDocument { dataset, audit }
}

/// Open a document by file extension: `.pdf`, or `.json` for pre-extracted pages.
pub fn open_document(path: &Path) -> Result<Box<dyn DocumentReader>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let reader: Box<dyn DocumentReader> = match extension.as_str() {
        "pdf" => Box::new(PdfDocument::open(path)?),
        "json" => Box::new(MemoryDocument::open(path)?),
        _ => {
            return Err(DocumentError::Unsupported(format!("unsupported file format: '{}'", extension)).into());
        }
    };
    Ok(reader)
}

/// Open and process a document; failing to open it is the only error.
pub fn process_path(path: &Path, ctx: &ExtractionContext<'_>) -> Result<ProcessedDocument> {
    let reader = open_document(path)?;
    Ok(extract_document(reader.as_ref(), ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ItemizeError;

    #[test]
    fn test_context_from_config() {
        struct Noop;
        impl TextRecognizer for Noop {
            fn recognize(&self, _image: &image::DynamicImage) -> std::result::Result<String, crate::error::OcrError> {
                Ok(String::new())
            }
        }

        let mut config = OcrConfig::default();
        assert!(ExtractionContext::from_config(&config, Some(&Noop)).ocr_enabled());

        config.enabled = false;
        assert!(!ExtractionContext::from_config(&config, Some(&Noop)).ocr_enabled());
        assert!(!ExtractionContext::new().ocr_enabled());
    }

    #[test]
    fn test_unknown_extension_is_fatal() {
        let result = process_path(Path::new("invoice.docx"), &ExtractionContext::new());
        assert!(matches!(
            result,
            Err(ItemizeError::Document(DocumentError::Unsupported(_)))
        ));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = process_path(Path::new("/nonexistent/invoice.pdf"), &ExtractionContext::new());
        assert!(matches!(result, Err(ItemizeError::Document(DocumentError::Parse(_)))));
    }
}
