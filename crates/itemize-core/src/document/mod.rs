//! Document readers: per-page text, detected tables and page images.

mod memory;
mod pdf;

pub use memory::{MemoryDocument, MemoryPage};
pub use pdf::PdfDocument;

use image::DynamicImage;

use crate::error::DocumentError;
use crate::models::table::Cell;

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// A geometrically detected table: rows of cells, header row first.
pub type Grid = Vec<Vec<Cell>>;

/// Trait for document reading implementations.
///
/// Opening a document is the implementor's constructor; once a reader
/// exists every page method is a per-page, recoverable operation.
pub trait DocumentReader {
    /// Identifier recorded in the audit (usually the file name).
    fn identifier(&self) -> &str;

    /// Get the number of pages.
    fn page_count(&self) -> u32;

    /// Native text of a page (1-indexed), possibly empty.
    fn page_text(&self, page: u32) -> Result<String>;

    /// Tables found from page geometry (ruling lines, cell boxes).
    ///
    /// Readers without geometry report no tables.
    fn detect_tables(&self, _page: u32) -> Result<Vec<Grid>> {
        Ok(Vec::new())
    }

    /// Render a page as an image at the specified DPI.
    fn render_page(&self, page: u32, _dpi: u32) -> Result<DynamicImage> {
        Err(DocumentError::Unsupported(format!(
            "{} cannot render page {}",
            self.identifier(),
            page
        )))
    }
}

pub(crate) fn check_page(page: u32, page_count: u32) -> Result<usize> {
    if page == 0 || page > page_count {
        return Err(DocumentError::InvalidPage(page));
    }
    Ok((page - 1) as usize)
}
