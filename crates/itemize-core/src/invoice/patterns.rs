//! Regex patterns for document metadata.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "Invoice #: INV-2025-001", "Bill: 7781"
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"(?i)(?:invoice|bill)\s*#?:?\s*([A-Za-z0-9-]+)"
    ).unwrap();

    // "Date: 11/11/2025", "date - 1-2-25"
    pub static ref DATE: Regex = Regex::new(
        r"(?i)date\s*[:\-]?\s*([0-9]{1,2}[/\-][0-9]{1,2}[/\-][0-9]{2,4})"
    ).unwrap();

    // "Total: $3,250.00", "Total Amount - 99.5"; "Subtotal" is not a total
    pub static ref TOTAL: Regex = Regex::new(
        r"(?i)\btotal\s*(?:amount)?\s*[:\-]?\s*\$?([0-9,]+\.?[0-9]*)"
    ).unwrap();
}
