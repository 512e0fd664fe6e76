//! Invoice number, date and stated total from the document text.

use regex::Regex;
use tracing::debug;

use crate::models::dataset::Metadata;

use super::patterns::{DATE, INVOICE_NUMBER, TOTAL};

/// Finds key-value metadata with first-match searches over the whole text.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract metadata from the concatenated text of all pages.
    pub fn extract(&self, text: &str) -> Metadata {
        let metadata = Metadata {
            invoice_no: first_capture(&INVOICE_NUMBER, text),
            date: first_capture(&DATE, text),
            total: first_capture(&TOTAL, text),
        };
        debug!("Extracted metadata: {:?}", metadata);
        metadata
    }
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_all_fields() {
        let text = "Invoice #: INV-2025-001\nDate: 11/11/2025\nTotal: $3,250.00";
        assert_eq!(
            MetadataExtractor::new().extract(text),
            Metadata {
                invoice_no: Some("INV-2025-001".to_string()),
                date: Some("11/11/2025".to_string()),
                total: Some("3,250.00".to_string()),
            }
        );
    }

    #[test]
    fn test_variants() {
        let text = "BILL 7781-A\nInvoice date - 3-4-25\nSubtotal: 90.00\nTOTAL AMOUNT: 99.50";
        let metadata = MetadataExtractor::new().extract(text);

        assert_eq!(metadata.invoice_no.as_deref(), Some("7781-A"));
        assert_eq!(metadata.date.as_deref(), Some("3-4-25"));
        assert_eq!(metadata.total.as_deref(), Some("99.50"));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let metadata = MetadataExtractor::new().extract("Statement of account\nThank you");
        assert_eq!(metadata, Metadata::default());
    }

    #[test]
    fn test_first_match_wins() {
        let text = "Total: 10.00\nTotal: 20.00";
        assert_eq!(MetadataExtractor::new().extract(text).total.as_deref(), Some("10.00"));
    }
}
