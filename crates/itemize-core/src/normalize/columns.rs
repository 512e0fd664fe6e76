//! Column label normalization, split-header merging and canonical mapping.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::models::dataset::{CanonicalColumn, CanonicalRow};
use crate::models::table::{Cell, RawTable};

use super::numeric::NumericCoercer;

/// Normalize a column label: trim, lowercase, spaces to underscores.
///
/// Applying it twice gives the same label as applying it once.
pub fn normalize_label(label: &str) -> String {
    label.trim().to_lowercase().replace(' ', "_")
}

/// Adjacent label pairs that together name one logical column, matched by
/// fragment so suffixed labels such as `Price (USD)` still pair up.
const SPLIT_HEADERS: [(&str, &str, &str); 2] = [
    ("line", "total", "line_total"),
    ("unit", "price", "unit_price"),
];

/// How a rule matches a normalized label.
#[derive(Debug, Clone, Copy)]
pub enum LabelPattern {
    /// Label contains every fragment.
    ContainsAll(&'static [&'static str]),
    /// Label equals one of the given names.
    OneOf(&'static [&'static str]),
}

impl LabelPattern {
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Self::ContainsAll(fragments) => fragments.iter().all(|f| label.contains(f)),
            Self::OneOf(names) => names.contains(&label),
        }
    }
}

/// Maps matching labels onto a canonical column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub pattern: LabelPattern,
    pub column: CanonicalColumn,
}

/// Label-to-column rules, first match wins.
pub const COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule {
        pattern: LabelPattern::ContainsAll(&["line", "total"]),
        column: CanonicalColumn::LineTotal,
    },
    ColumnRule {
        pattern: LabelPattern::ContainsAll(&["unit", "price"]),
        column: CanonicalColumn::UnitPrice,
    },
    ColumnRule {
        pattern: LabelPattern::OneOf(&["qty", "quantity"]),
        column: CanonicalColumn::Quantity,
    },
    ColumnRule {
        pattern: LabelPattern::OneOf(&["price"]),
        column: CanonicalColumn::UnitPrice,
    },
    ColumnRule {
        pattern: LabelPattern::OneOf(&["total"]),
        column: CanonicalColumn::LineTotal,
    },
    ColumnRule {
        pattern: LabelPattern::ContainsAll(&["description"]),
        column: CanonicalColumn::Description,
    },
];

/// Canonical column for a normalized label, if any rule matches.
pub fn canonical_column(label: &str) -> Option<CanonicalColumn> {
    COLUMN_RULES
        .iter()
        .find(|rule| rule.pattern.matches(label))
        .map(|rule| rule.column)
}

/// A table restricted to canonical columns, cells not yet coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    pub columns: Vec<CanonicalColumn>,
    /// Rows with one cell per entry in `columns`.
    pub rows: Vec<Vec<Cell>>,
    pub page_number: u32,
}

impl CanonicalTable {
    pub fn has_column(&self, column: CanonicalColumn) -> bool {
        self.columns.contains(&column)
    }

    /// Coerce cells into canonical rows.
    ///
    /// When the table has quantity and unit price but no line total, the
    /// line total is derived as their product. Returns the columns the rows
    /// carry values for, including a derived line total.
    pub fn into_rows(self, coercer: &NumericCoercer) -> (BTreeSet<CanonicalColumn>, Vec<CanonicalRow>) {
        let derive_total = !self.has_column(CanonicalColumn::LineTotal)
            && self.has_column(CanonicalColumn::Quantity)
            && self.has_column(CanonicalColumn::UnitPrice);

        let mut columns: BTreeSet<CanonicalColumn> = self.columns.iter().copied().collect();
        if derive_total {
            columns.insert(CanonicalColumn::LineTotal);
        }

        let index_of = |column: CanonicalColumn| self.columns.iter().position(|&c| c == column);
        let description_idx = index_of(CanonicalColumn::Description);
        let quantity_idx = index_of(CanonicalColumn::Quantity);
        let unit_price_idx = index_of(CanonicalColumn::UnitPrice);
        let line_total_idx = index_of(CanonicalColumn::LineTotal);

        let rows = self
            .rows
            .iter()
            .map(|cells| {
                let number = |idx: Option<usize>| idx.and_then(|i| coercer.coerce(&cells[i]));

                let quantity = number(quantity_idx);
                let unit_price = number(unit_price_idx);
                let line_total = if derive_total {
                    NumericCoercer::product(quantity, unit_price)
                } else {
                    number(line_total_idx)
                };

                CanonicalRow {
                    description: description_idx
                        .and_then(|i| cells[i].as_text())
                        .filter(|s| !s.is_empty()),
                    quantity,
                    unit_price,
                    line_total,
                    page_number: self.page_number,
                }
            })
            .collect();

        (columns, rows)
    }
}

/// Maps inconsistently labeled raw columns onto the canonical schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnNormalizer;

impl ColumnNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a raw table.
    pub fn normalize(&self, table: RawTable) -> CanonicalTable {
        let RawTable {
            labels,
            mut rows,
            page_number,
        } = table;

        let mut labels: Vec<String> = labels.iter().map(|l| normalize_label(l)).collect();
        for row in rows.iter_mut() {
            row.resize(labels.len(), Cell::Null);
        }
        merge_split_headers(&mut labels, &mut rows);

        let mut mapping: Vec<(CanonicalColumn, usize)> = Vec::new();
        for (idx, label) in labels.iter().enumerate() {
            match canonical_column(label) {
                Some(column) if mapping.iter().any(|&(c, _)| c == column) => {
                    debug!("Dropping duplicate {} column '{}'", column.name(), label);
                }
                Some(column) => mapping.push((column, idx)),
                None => trace!("Dropping unmapped column '{}'", label),
            }
        }

        let rows: Vec<Vec<Cell>> = rows
            .into_iter()
            .map(|row| mapping.iter().map(|&(_, idx)| row[idx].clone()).collect::<Vec<Cell>>())
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();

        CanonicalTable {
            columns: mapping.into_iter().map(|(c, _)| c).collect(),
            rows,
            page_number,
        }
    }
}

/// Merge adjacent split-header columns, preferring the left cell.
fn merge_split_headers(labels: &mut Vec<String>, rows: &mut [Vec<Cell>]) {
    let mut i = 0;
    while i + 1 < labels.len() {
        let merged = SPLIT_HEADERS
            .iter()
            .find(|(left, right, _)| labels[i].contains(left) && labels[i + 1].contains(right))
            .map(|&(_, _, name)| name);

        let Some(name) = merged else {
            i += 1;
            continue;
        };

        debug!("Merging split header '{} {}' into {}", labels[i], labels[i + 1], name);
        for row in rows.iter_mut() {
            let right = row.remove(i + 1);
            if row[i].is_empty() {
                row[i] = if right.is_empty() { Cell::Null } else { right };
            }
        }
        labels.remove(i + 1);
        labels[i] = name.to_string();
    }
}
