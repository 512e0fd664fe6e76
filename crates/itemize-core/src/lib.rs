//! Core library for business document line-item extraction.
//!
//! This crate provides:
//! - Document reading (PDF text, page images, pre-extracted documents)
//! - Table location with a text-alignment fallback and OCR escalation
//! - Column normalization onto a canonical line-item schema
//! - Metadata extraction and reconciliation of line totals against the stated total

pub mod error;
pub mod models;
pub mod document;
pub mod ocr;
pub mod tables;
pub mod normalize;
pub mod invoice;
pub mod pipeline;

pub use error::{ItemizeError, Result};
pub use models::config::ItemizeConfig;
pub use models::dataset::{AuditRecord, CanonicalColumn, CanonicalRow, Dataset, Metadata};
pub use models::table::{Cell, RawTable, Scalar};
pub use document::{DocumentReader, MemoryDocument, PdfDocument};
pub use ocr::{OcrEscalator, TextRecognizer};
#[cfg(feature = "native")]
pub use ocr::PureOcrEngine;
pub use tables::{TableExtraction, TableExtractor, TextFallbackTableParser};
pub use normalize::{ColumnNormalizer, NumericCoercer};
pub use invoice::{MetadataExtractor, ReconciliationAuditor};
pub use pipeline::{extract_document, open_document, process_path, ExtractionContext, ProcessedDocument};
