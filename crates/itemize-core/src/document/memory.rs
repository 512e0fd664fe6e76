//! Pre-extracted documents held in memory.
//!
//! Used for documents whose pages were already processed by an external
//! layout tool, serialized as JSON:
//!
//! ```json
//! { "name": "invoice-7", "pages": [ { "text": "...", "tables": [[["Qty", "Total"], ["1", "9.99"]]] } ] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{check_page, DocumentReader, Grid, Result};
use crate::error::DocumentError;

/// One pre-extracted page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryPage {
    /// Native page text.
    #[serde(default)]
    pub text: String,
    /// Detected tables, header row first.
    #[serde(default)]
    pub tables: Vec<Grid>,
}

/// A document whose pages are already extracted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    pub name: String,
    pub pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    /// Create an empty document.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pages: Vec::new(),
        }
    }

    /// Append a page with text only.
    pub fn with_text_page(self, text: impl Into<String>) -> Self {
        self.with_page(text, Vec::new())
    }

    /// Append a page with text and detected tables.
    pub fn with_page(mut self, text: impl Into<String>, tables: Vec<Grid>) -> Self {
        self.pages.push(MemoryPage {
            text: text.into(),
            tables,
        });
        self
    }

    /// Parse a document from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self =
            serde_json::from_str(json).map_err(|e| DocumentError::Parse(e.to_string()))?;
        if document.pages.is_empty() {
            return Err(DocumentError::NoPages);
        }
        Ok(document)
    }

    /// Load a JSON document from disk; the file name is used when `name` is absent.
    pub fn open(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| DocumentError::Parse(format!("{}: {}", path.display(), e)))?;
        let mut document = Self::from_json(&json)?;
        if document.name.is_empty() {
            document.name = file_name(path);
        }
        Ok(document)
    }

    fn page(&self, page: u32) -> Result<&MemoryPage> {
        let idx = check_page(page, self.page_count())?;
        Ok(&self.pages[idx])
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl DocumentReader for MemoryDocument {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        Ok(self.page(page)?.text.clone())
    }

    fn detect_tables(&self, page: u32) -> Result<Vec<Grid>> {
        Ok(self.page(page)?.tables.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::table::Cell;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_json() {
        let doc = MemoryDocument::from_json(
            r#"{"name": "inv", "pages": [{"text": "hello"}, {"tables": [[["Qty"], ["2"]]]}]}"#,
        )
        .unwrap();

        assert_eq!(doc.identifier(), "inv");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_text(1).unwrap(), "hello");
        assert_eq!(doc.page_text(2).unwrap(), "");
        assert_eq!(
            doc.detect_tables(2).unwrap(),
            vec![vec![vec![Cell::text("Qty")], vec![Cell::text("2")]]]
        );
    }

    #[test]
    fn test_open_errors() {
        assert!(matches!(
            MemoryDocument::from_json(r#"{"pages": []}"#),
            Err(DocumentError::NoPages)
        ));
        assert!(matches!(
            MemoryDocument::from_json("not json"),
            Err(DocumentError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_page() {
        let doc = MemoryDocument::new("x").with_text_page("a");
        assert!(matches!(doc.page_text(0), Err(DocumentError::InvalidPage(0))));
        assert!(matches!(doc.page_text(2), Err(DocumentError::InvalidPage(2))));
        assert!(matches!(doc.render_page(1, 300), Err(DocumentError::Unsupported(_))));
    }

    #[test]
    fn test_open_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan-01.json");
        std::fs::write(&path, r#"{"pages": [{"text": "x"}]}"#).unwrap();

        let doc = MemoryDocument::open(&path).unwrap();
        assert_eq!(doc.identifier(), "scan-01.json");
    }
}
