//! Document-level metadata extraction and total reconciliation.

mod metadata;
pub mod patterns;
mod reconcile;

pub use metadata::MetadataExtractor;
pub use reconcile::{line_sum, ReconciliationAuditor, TOLERANCE};
