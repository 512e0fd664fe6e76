//! Raw table model: cells as recovered from a page, before normalization.

use serde::{Deserialize, Serialize};

/// Lowercased string forms that count as "no value".
const NULL_MARKERS: [&str; 3] = ["", "nan", "none"];

/// Check whether a string is one of the recognized null markers.
pub fn is_null_marker(s: &str) -> bool {
    let lowered = s.trim().to_lowercase();
    NULL_MARKERS.contains(&lowered.as_str())
}

/// A single scalar value inside a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Already-numeric value.
    Number(f64),
    /// Text as extracted from the page.
    Text(String),
}

impl Scalar {
    /// String form of the scalar.
    pub fn to_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Whether the scalar stands for a missing value (`""`, `nan`, `none`, NaN).
    pub fn is_null_marker(&self) -> bool {
        match self {
            Self::Number(n) => n.is_nan(),
            Self::Text(s) => is_null_marker(s),
        }
    }
}

/// A table cell: missing, a single scalar, or a sequence of scalars.
///
/// Geometric detectors occasionally hand back several fragments for one
/// cell; those arrive as `Sequence`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Scalar(Scalar),
    Sequence(Vec<Option<Scalar>>),
}

impl Cell {
    /// Create a text cell.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(s.into()))
    }

    /// Create a numeric cell.
    pub fn number(n: f64) -> Self {
        Self::Scalar(Scalar::Number(n))
    }

    /// The value this cell carries, if any.
    ///
    /// For sequences this is the first element that is not a null marker.
    pub fn present(&self) -> Option<&Scalar> {
        match self {
            Self::Null => None,
            Self::Scalar(s) => (!s.is_null_marker()).then_some(s),
            Self::Sequence(items) => items
                .iter()
                .flatten()
                .find(|s| !s.is_null_marker()),
        }
    }

    /// Whether the cell carries no value.
    pub fn is_empty(&self) -> bool {
        self.present().is_none()
    }

    /// Trimmed text of the carried value.
    pub fn as_text(&self) -> Option<String> {
        self.present().map(|s| s.to_text().trim().to_string())
    }
}

impl From<Option<&str>> for Cell {
    fn from(value: Option<&str>) -> Self {
        match value {
            Some(s) => Self::text(s),
            None => Self::Null,
        }
    }
}

/// A table exactly as located on a page: labels plus positional rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column labels in source order (may be duplicated or empty).
    pub labels: Vec<String>,
    /// Data rows; every row has `labels.len()` cells.
    pub rows: Vec<Vec<Cell>>,
    /// Page the table was found on (1-indexed).
    pub page_number: u32,
}

impl RawTable {
    /// Create a table, padding or truncating rows to the label count.
    pub fn new(labels: Vec<String>, rows: Vec<Vec<Cell>>, page_number: u32) -> Self {
        let width = labels.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Null);
                row
            })
            .collect();

        Self {
            labels,
            rows,
            page_number,
        }
    }

    /// Build a table from a detected grid, using its first row as labels.
    ///
    /// Returns `None` for an empty grid.
    pub fn from_grid(grid: Vec<Vec<Cell>>, page_number: u32) -> Option<Self> {
        let mut grid = grid.into_iter();
        let header = grid.next()?;
        let labels = header
            .iter()
            .map(|cell| cell.as_text().unwrap_or_default())
            .collect();

        Some(Self::new(labels, grid.collect(), page_number))
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.labels.len()
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| &row[idx])
    }
}
