//! Reconciliation of extracted line totals against the stated document total.
//!
//! Amounts arrive as `f64` from the dataset; sums, differences and the
//! tolerance comparison are carried out in [`Decimal`].

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use crate::models::dataset::{AuditRecord, CanonicalColumn, Dataset, Metadata};
use crate::normalize::numeric::parse_amount;

/// Absolute tolerance for a total to count as matching: one cent.
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

const NO_TABLES: &str = "No tables detected.";
const TOTAL_MISMATCH: &str = "Invoice total does not match sum of line totals.";

/// The decimal an amount was written as: its shortest round-trip form.
fn money(value: f64) -> Option<Decimal> {
    value.to_string().parse().ok()
}

/// Round to cents, halves away from zero.
fn to_cents(value: Decimal) -> Option<f64> {
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
}

fn checked_sum(values: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    let mut values = values.peekable();
    values.peek()?;
    values.try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
}

/// Sum of the dataset's line totals.
///
/// Uses the `line_total` column when it holds any value, otherwise the sum
/// of quantity × unit price over rows that have both. `None` when neither
/// yields a single value.
pub fn line_sum(dataset: &Dataset) -> Option<Decimal> {
    if dataset.has_column(CanonicalColumn::LineTotal) {
        let totals = dataset.rows.iter().filter_map(|r| r.line_total.and_then(money));
        if let Some(total) = checked_sum(totals) {
            return Some(total);
        }
    }

    if dataset.has_column(CanonicalColumn::Quantity) && dataset.has_column(CanonicalColumn::UnitPrice) {
        let products = dataset.rows.iter().filter_map(|r| {
            let quantity = money(r.quantity?)?;
            let unit_price = money(r.unit_price?)?;
            quantity.checked_mul(unit_price)
        });
        return checked_sum(products);
    }

    None
}

/// Produces the audit record for one document.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconciliationAuditor;

impl ReconciliationAuditor {
    pub fn new() -> Self {
        Self
    }

    /// Build the audit record.
    ///
    /// `warnings` are problems already met while reading pages; audit
    /// findings are appended after them.
    pub fn audit(
        &self,
        file: &str,
        dataset: &Dataset,
        tables_found: usize,
        metadata: Metadata,
        warnings: Vec<String>,
    ) -> AuditRecord {
        let mut audit = AuditRecord::new(file);
        audit.warnings = warnings;
        audit.tables_found = tables_found;
        audit.metadata = metadata;

        if tables_found == 0 {
            warn!("{}: no tables detected", file);
            audit.warn(NO_TABLES);
            return audit;
        }

        audit.pages = dataset.page_count();

        let invoice_total = audit
            .metadata
            .total
            .as_deref()
            .and_then(parse_amount)
            .and_then(money);
        let line_sum = line_sum(dataset);
        audit.line_sum = line_sum.and_then(to_cents);

        match (invoice_total, line_sum) {
            (Some(invoice_total), Some(line_sum)) => {
                let delta = invoice_total - line_sum;
                let matches = delta.abs() < TOLERANCE;
                audit.invoice_total_matches = Some(matches);

                if matches {
                    info!("{}: invoice total {} reconciles", file, invoice_total);
                } else {
                    audit.mismatch_amount = to_cents(delta);
                    warn!(
                        "{}: invoice total {} differs from line sum {}",
                        file, invoice_total, line_sum
                    );
                    audit.warn(TOTAL_MISMATCH);
                }
            }
            (None, _) => {
                let message = match &audit.metadata.total {
                    Some(raw) => format!("Invoice total '{}' is not a number; reconciliation skipped.", raw),
                    None => "Invoice total not found; reconciliation skipped.".to_string(),
                };
                warn!("{}: {}", file, message);
                audit.warn(message);
            }
            (Some(_), None) => {
                warn!("{}: no line totals to reconcile", file);
                audit.warn("No line totals found; reconciliation skipped.");
            }
        }

        audit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::dataset::CanonicalRow;
    use pretty_assertions::assert_eq;

    fn dataset(line_totals: &[Option<f64>]) -> Dataset {
        let rows = line_totals
            .iter()
            .map(|&line_total| CanonicalRow {
                description: Some("item".to_string()),
                quantity: None,
                unit_price: None,
                line_total,
                page_number: 1,
            })
            .collect();
        let mut dataset = Dataset::new();
        dataset.append([CanonicalColumn::Description, CanonicalColumn::LineTotal], rows);
        dataset
    }

    fn metadata(total: &str) -> Metadata {
        Metadata {
            total: Some(total.to_string()),
            ..Metadata::default()
        }
    }

    fn audit(data: &Dataset, total: &str) -> AuditRecord {
        ReconciliationAuditor::new().audit("inv.pdf", data, 1, metadata(total), Vec::new())
    }

    #[test]
    fn test_matching_total() {
        let record = audit(&dataset(&[Some(2000.0), Some(1250.0)]), "3,250.00");

        assert_eq!(record.invoice_total_matches, Some(true));
        assert_eq!(record.line_sum, Some(3250.0));
        assert_eq!(record.mismatch_amount, None);
        assert!(record.warnings.is_empty());
        assert_eq!(record.pages, 1);
    }

    #[test]
    fn test_mismatching_total() {
        let record = audit(&dataset(&[Some(2000.0), Some(1240.0)]), "3,250.00");

        assert_eq!(record.invoice_total_matches, Some(false));
        assert_eq!(record.mismatch_amount, Some(10.0));
        assert_eq!(record.warnings, vec![TOTAL_MISMATCH.to_string()]);
    }

    #[test]
    fn test_tolerance_boundary_is_exclusive() {
        let within = audit(&dataset(&[Some(99.995)]), "100.00");
        assert_eq!(within.invoice_total_matches, Some(true));

        let one_cent = audit(&dataset(&[Some(99.99)]), "100.00");
        assert_eq!(one_cent.invoice_total_matches, Some(false));
        assert_eq!(one_cent.mismatch_amount, Some(0.01));

        // 10.02 - 10.01 is just below 0.01 in binary floating point.
        let noisy = audit(&dataset(&[Some(10.01)]), "10.02");
        assert_eq!(noisy.invoice_total_matches, Some(false));
    }

    #[test]
    fn test_sums_without_float_drift() {
        let record = audit(&dataset(&[Some(0.1), Some(0.2)]), "0.30");
        assert_eq!(record.line_sum, Some(0.3));
        assert_eq!(record.invoice_total_matches, Some(true));

        let halves = audit(&dataset(&[Some(1.005)]), "2.00");
        assert_eq!(halves.line_sum, Some(1.01));
        assert_eq!(halves.mismatch_amount, Some(1.0));
    }

    #[test]
    fn test_null_line_totals_ignored() {
        let record = audit(&dataset(&[Some(5.0), None, Some(5.0)]), "10");
        assert_eq!(record.line_sum, Some(10.0));
        assert_eq!(record.invoice_total_matches, Some(true));
    }

    #[test]
    fn test_missing_total_skips_reconciliation() {
        let record = ReconciliationAuditor::new().audit(
            "inv.pdf",
            &dataset(&[Some(5.0)]),
            1,
            Metadata::default(),
            vec!["OCR failed for page 2: OCR is disabled".to_string()],
        );

        assert_eq!(record.invoice_total_matches, None);
        assert_eq!(record.mismatch_amount, None);
        assert_eq!(record.line_sum, Some(5.0));
        assert_eq!(
            record.warnings,
            vec![
                "OCR failed for page 2: OCR is disabled".to_string(),
                "Invoice total not found; reconciliation skipped.".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_tables() {
        let record = ReconciliationAuditor::new().audit(
            "empty.pdf",
            &Dataset::new(),
            0,
            metadata("10.00"),
            Vec::new(),
        );

        assert_eq!(record.warnings, vec![NO_TABLES.to_string()]);
        assert_eq!(record.tables_found, 0);
        assert_eq!(record.pages, 0);
        assert_eq!(record.invoice_total_matches, None);
        assert_eq!(record.line_sum, None);
    }

    #[test]
    fn test_line_sum_falls_back_to_products() {
        let mut data = Dataset::new();
        data.append(
            [CanonicalColumn::Quantity, CanonicalColumn::UnitPrice, CanonicalColumn::LineTotal],
            vec![
                CanonicalRow {
                    description: None,
                    quantity: Some(2.0),
                    unit_price: Some(3.0),
                    line_total: None,
                    page_number: 1,
                },
                CanonicalRow {
                    description: None,
                    quantity: Some(1.0),
                    unit_price: None,
                    line_total: None,
                    page_number: 2,
                },
            ],
        );
        assert_eq!(line_sum(&data), Some(Decimal::from(6)));
        assert_eq!(line_sum(&Dataset::new()), None);
    }
}
