//! Canonical outputs: line-item rows, document metadata and the audit record.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// The canonical value columns a normalized table may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    Description,
    Quantity,
    UnitPrice,
    LineTotal,
}

impl CanonicalColumn {
    /// All columns in output order.
    pub const ALL: [CanonicalColumn; 4] = [
        Self::Description,
        Self::Quantity,
        Self::UnitPrice,
        Self::LineTotal,
    ];

    /// Column name as used in exported tables.
    pub fn name(self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Quantity => "quantity",
            Self::UnitPrice => "unit_price",
            Self::LineTotal => "line_total",
        }
    }
}

/// A line item normalized to the canonical schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRow {
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub line_total: Option<f64>,
    /// Page the row came from (1-indexed).
    pub page_number: u32,
}

impl CanonicalRow {
    /// Numeric value of one of the number columns.
    pub fn value(&self, column: CanonicalColumn) -> Option<f64> {
        match column {
            CanonicalColumn::Description => None,
            CanonicalColumn::Quantity => self.quantity,
            CanonicalColumn::UnitPrice => self.unit_price,
            CanonicalColumn::LineTotal => self.line_total,
        }
    }
}

/// The canonical dataset for one document.
///
/// Rows are in page order, then in row order within the page. `columns`
/// lists every canonical column that at least one source table exposed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub columns: BTreeSet<CanonicalColumn>,
    pub rows: Vec<CanonicalRow>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the rows of one normalized table.
    pub fn append(&mut self, columns: impl IntoIterator<Item = CanonicalColumn>, rows: Vec<CanonicalRow>) {
        self.columns.extend(columns);
        self.rows.extend(rows);
    }

    /// Whether any source table exposed this column.
    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        self.columns.contains(&column)
    }

    /// Number of distinct pages that contributed rows.
    pub fn page_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.page_number)
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Key-value metadata found in the document text (raw, before coercion).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub invoice_no: Option<String>,
    pub date: Option<String>,
    pub total: Option<String>,
}

/// Reconciliation audit for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Document identifier (file name).
    pub file: String,
    /// Distinct page numbers present in the dataset.
    pub pages: usize,
    pub tables_found: usize,
    /// Recoverable problems, in the order they were found.
    pub warnings: Vec<String>,
    #[serde(flatten)]
    pub metadata: Metadata,
    pub invoice_total_matches: Option<bool>,
    pub line_sum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mismatch_amount: Option<f64>,
}

impl AuditRecord {
    /// Create an empty audit for a document.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }

    /// Record a recoverable problem.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(page: u32) -> CanonicalRow {
        CanonicalRow {
            description: None,
            quantity: None,
            unit_price: None,
            line_total: Some(1.0),
            page_number: page,
        }
    }

    #[test]
    fn test_page_count_is_distinct() {
        let mut dataset = Dataset::new();
        dataset.append([CanonicalColumn::LineTotal], vec![row(1), row(1), row(3)]);
        assert_eq!(dataset.page_count(), 2);
        assert!(dataset.has_column(CanonicalColumn::LineTotal));
        assert!(!dataset.has_column(CanonicalColumn::Quantity));
    }

    #[test]
    fn test_audit_serializes_flat() {
        let mut audit = AuditRecord::new("invoice.pdf");
        audit.metadata.invoice_no = Some("INV-1".to_string());
        audit.warn("No tables detected.");

        let json = serde_json::to_value(&audit).unwrap();
        assert_eq!(json["file"], "invoice.pdf");
        assert_eq!(json["invoice_no"], "INV-1");
        assert_eq!(json["total"], serde_json::Value::Null);
        assert_eq!(json["invoice_total_matches"], serde_json::Value::Null);
        assert!(json.get("mismatch_amount").is_none());
        assert_eq!(json["warnings"][0], "No tables detected.");
    }
}
