//! Text-alignment table recovery for pages without detected table geometry.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::models::table::{Cell, RawTable};
use crate::normalize::columns::normalize_label;

lazy_static! {
    /// Column separator: a run of two or more whitespace characters, or a tab.
    static ref FIELD_SEPARATOR: Regex = Regex::new(r"\s{2,}|\t").unwrap();

    /// Summary line that ends the item table; a bare "Total" label counts.
    static ref TOTAL_LINE: Regex = Regex::new(r"(?i)^total(?:[:\s]|$)").unwrap();
}

/// Whether a line looks like a line-item table header.
///
/// Accepted when its lowercased tokens contain "description" and "qty",
/// or "qty" together with "unit" or "line".
pub fn is_header_line(line: &str) -> bool {
    let lowered = line.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    let has = |keyword: &str| tokens.iter().any(|t| t.contains(keyword));

    (has("description") && has("qty")) || (has("qty") && (has("unit") || has("line")))
}

/// Split a line into fields on wide gaps, or on any whitespace when the
/// line has no wide gaps.
pub fn split_fields(line: &str) -> Vec<&str> {
    let fields: Vec<&str> = FIELD_SEPARATOR
        .split(line)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() > 1 {
        fields
    } else {
        line.split_whitespace().collect()
    }
}

/// Fit a row's fields to `width` columns.
///
/// Surplus leading fields are joined into the first column (a multi-word
/// description); missing trailing fields become `None`.
pub fn fit_fields(fields: Vec<&str>, width: usize) -> Vec<Option<String>> {
    if width == 0 {
        return Vec::new();
    }

    let mut fitted: Vec<Option<String>> = if fields.len() > width {
        let split_at = fields.len() - (width - 1);
        let (leading, rest) = fields.split_at(split_at);
        std::iter::once(Some(leading.join(" ")))
            .chain(rest.iter().map(|f| Some(f.to_string())))
            .collect()
    } else {
        fields.into_iter().map(|f| Some(f.to_string())).collect()
    };

    fitted.resize(width, None);
    fitted
}

/// Heuristic parser that recovers a single table from flat page text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFallbackTableParser;

impl TextFallbackTableParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse the item table from a page's text, if one can be found.
    pub fn parse(&self, text: &str, page_number: u32) -> Option<RawTable> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let Some(header_idx) = lines.iter().position(|l| is_header_line(l)) else {
            trace!("No table header on page {}", page_number);
            return None;
        };

        let labels: Vec<String> = split_fields(lines[header_idx])
            .into_iter()
            .map(normalize_label)
            .collect();
        let width = labels.len();

        let rows: Vec<Vec<Cell>> = lines[header_idx + 1..]
            .iter()
            .take_while(|l| !TOTAL_LINE.is_match(l))
            .map(|l| {
                fit_fields(split_fields(l), width)
                    .into_iter()
                    .map(|f| f.map(Cell::text).unwrap_or_default())
                    .collect::<Vec<Cell>>()
            })
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();

        if rows.is_empty() {
            debug!("Header found on page {} but no data rows", page_number);
            return None;
        }

        debug!(
            "Fallback parser found {} columns, {} rows on page {}",
            width,
            rows.len(),
            page_number
        );
        Some(RawTable::new(labels, rows, page_number))
    }
}
