//! Normalization of raw tables onto the canonical line-item schema.

pub mod columns;
pub mod numeric;

pub use columns::{normalize_label, CanonicalTable, ColumnNormalizer, COLUMN_RULES};
pub use numeric::{parse_amount, NumericCoercer};
