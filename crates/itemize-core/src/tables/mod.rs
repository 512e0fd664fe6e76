//! Per-page table location: detected geometry first, text fallback second.

mod fallback;

pub use fallback::{fit_fields, is_header_line, split_fields, TextFallbackTableParser};

use tracing::{debug, info, warn};

use crate::document::DocumentReader;
use crate::models::table::RawTable;
use crate::ocr::OcrEscalator;

/// Tables and text gathered from one document.
#[derive(Debug, Clone, Default)]
pub struct TableExtraction {
    /// Raw tables in page order.
    pub tables: Vec<RawTable>,
    /// Text used for each page: native text, or OCR text for text-less pages.
    pub page_texts: Vec<String>,
    /// Recoverable problems met while reading pages.
    pub warnings: Vec<String>,
}

impl TableExtraction {
    /// All page texts joined into one document text.
    pub fn full_text(&self) -> String {
        self.page_texts.join("\n")
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Orchestrates table location across the pages of a document.
pub struct TableExtractor<'a> {
    escalator: OcrEscalator<'a>,
    fallback: TextFallbackTableParser,
}

impl<'a> TableExtractor<'a> {
    /// Create an extractor escalating text-less pages through `escalator`.
    pub fn new(escalator: OcrEscalator<'a>) -> Self {
        Self {
            escalator,
            fallback: TextFallbackTableParser::new(),
        }
    }

    /// Locate every table in the document, page by page.
    pub fn extract(&self, reader: &dyn DocumentReader) -> TableExtraction {
        let mut extraction = TableExtraction::default();
        let page_count = reader.page_count();

        for page in 1..=page_count {
            let mut text = match reader.page_text(page) {
                Ok(text) => text,
                Err(e) => {
                    extraction.warn(format!("Could not read text of page {}: {}", page, e));
                    String::new()
                }
            };

            let detected = self.detected_tables(reader, page, &mut extraction);
            if !detected.is_empty() {
                debug!("Page {}: {} detected tables", page, detected.len());
                extraction.tables.extend(detected);
                extraction.page_texts.push(text);
                continue;
            }

            if text.trim().is_empty() {
                text = self.escalate(reader, page, &mut extraction);
            }

            if let Some(table) = self.fallback.parse(&text, page) {
                debug!("Page {}: table recovered from text", page);
                extraction.tables.push(table);
            }
            extraction.page_texts.push(text);
        }

        info!(
            "Found {} tables across {} pages of {}",
            extraction.tables.len(),
            page_count,
            reader.identifier()
        );
        extraction
    }

    fn detected_tables(
        &self,
        reader: &dyn DocumentReader,
        page: u32,
        extraction: &mut TableExtraction,
    ) -> Vec<RawTable> {
        match reader.detect_tables(page) {
            Ok(grids) => grids
                .into_iter()
                .filter_map(|grid| RawTable::from_grid(grid, page))
                .collect(),
            Err(e) => {
                extraction.warn(format!("Table detection failed for page {}: {}", page, e));
                Vec::new()
            }
        }
    }

    fn escalate(&self, reader: &dyn DocumentReader, page: u32, extraction: &mut TableExtraction) -> String {
        if !self.escalator.is_enabled() {
            debug!("Page {} has no text and OCR is disabled", page);
            return String::new();
        }

        match self.escalator.try_recover_text(reader, page) {
            Ok(text) => text,
            Err(e) => {
                extraction.warn(format!("OCR failed for page {}: {}", page, e));
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::models::table::Cell;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_detected_tables_take_precedence() {
        let grid = vec![
            vec![Cell::text("Item"), Cell::text("Total")],
            vec![Cell::text("Bolts"), Cell::text("4.00")],
        ];
        let doc = MemoryDocument::new("m")
            .with_page("Description  Qty  Total\nNuts  1  1.00", vec![grid])
            .with_text_page("Description  Qty  Total\nNuts  1  1.00");

        let extraction = TableExtractor::new(OcrEscalator::new(None, 300)).extract(&doc);

        assert_eq!(extraction.tables.len(), 2);
        assert_eq!(extraction.tables[0].labels, vec!["Item", "Total"]);
        assert_eq!(extraction.tables[0].page_number, 1);
        assert_eq!(extraction.tables[1].labels, vec!["description", "qty", "total"]);
        assert_eq!(extraction.tables[1].page_number, 2);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_pages_without_tables_contribute_nothing() {
        let doc = MemoryDocument::new("m")
            .with_text_page("Notes and Terms")
            .with_text_page("");

        let extraction = TableExtractor::new(OcrEscalator::new(None, 300)).extract(&doc);

        assert!(extraction.tables.is_empty());
        assert!(extraction.warnings.is_empty());
        assert_eq!(extraction.full_text(), "Notes and Terms\n");
    }
}
