//! OCR escalation for pages without native text.

#[cfg(feature = "native")]
mod pure_engine;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;

use image::DynamicImage;
use tracing::debug;

use crate::document::DocumentReader;
use crate::error::OcrError;

/// Gap placed between boxes on the same line, wide enough for column splitting.
const COLUMN_GAP: &str = "   ";

/// Trait for optical text recognition capabilities.
pub trait TextRecognizer {
    /// Recognize the text in an image.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// A recognized text fragment with its axis-aligned box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Bounding box (x1, y1, x2, y2).
    pub rect: [f32; 4],
    /// Recognized text content.
    pub text: String,
}

impl TextBox {
    fn center_y(&self) -> f32 {
        (self.rect[1] + self.rect[3]) / 2.0
    }

    fn height(&self) -> f32 {
        (self.rect[3] - self.rect[1]).abs()
    }
}

/// Lay recognized boxes out as text lines.
///
/// Boxes whose vertical centre falls within half a box height of the
/// current line join that line; lines are ordered top to bottom and boxes
/// left to right, separated by [`COLUMN_GAP`].
pub fn lines_from_boxes(mut boxes: Vec<TextBox>) -> String {
    boxes.retain(|b| !b.text.trim().is_empty());
    boxes.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));

    let mut lines: Vec<Vec<TextBox>> = Vec::new();
    for text_box in boxes {
        match lines.last_mut() {
            Some(line) if same_line(line, &text_box) => line.push(text_box),
            _ => lines.push(vec![text_box]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.rect[0].total_cmp(&b.rect[0]));
            line.iter()
                .map(|b| b.text.trim())
                .collect::<Vec<_>>()
                .join(COLUMN_GAP)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn same_line(line: &[TextBox], candidate: &TextBox) -> bool {
    let n = line.len() as f32;
    let center = line.iter().map(TextBox::center_y).sum::<f32>() / n;
    let height = line.iter().map(TextBox::height).sum::<f32>() / n;
    (candidate.center_y() - center).abs() <= height.max(candidate.height()) / 2.0
}

/// Recovers page text through rendering and recognition.
pub struct OcrEscalator<'a> {
    recognizer: Option<&'a dyn TextRecognizer>,
    render_dpi: u32,
}

impl<'a> OcrEscalator<'a> {
    /// Create an escalator; `None` disables recognition.
    pub fn new(recognizer: Option<&'a dyn TextRecognizer>, render_dpi: u32) -> Self {
        Self {
            recognizer,
            render_dpi,
        }
    }

    /// Whether a recognizer is available.
    pub fn is_enabled(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Render a page and recognize its text.
    pub fn try_recover_text(&self, reader: &dyn DocumentReader, page: u32) -> Result<String, OcrError> {
        let recognizer = self.recognizer.ok_or(OcrError::Disabled)?;

        let image = reader.render_page(page, self.render_dpi)?;
        debug!(
            "Rendered page {} at {} DPI: {}x{}",
            page,
            self.render_dpi,
            image.width(),
            image.height()
        );

        let text = recognizer.recognize(&image)?;
        debug!("OCR recovered {} characters from page {}", text.len(), page);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{MemoryDocument, Result as DocResult};
    use crate::error::DocumentError;
    use pretty_assertions::assert_eq;

    fn text_box(x: f32, y: f32, text: &str) -> TextBox {
        TextBox {
            rect: [x, y, x + 40.0, y + 10.0],
            text: text.to_string(),
        }
    }

    struct FixedRecognizer(&'static str);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    struct ScannedPage;

    impl DocumentReader for ScannedPage {
        fn identifier(&self) -> &str {
            "scan.pdf"
        }

        fn page_count(&self) -> u32 {
            1
        }

        fn page_text(&self, _page: u32) -> DocResult<String> {
            Ok(String::new())
        }

        fn render_page(&self, page: u32, _dpi: u32) -> DocResult<DynamicImage> {
            if page != 1 {
                return Err(DocumentError::InvalidPage(page));
            }
            Ok(DynamicImage::new_luma8(4, 4))
        }
    }

    #[test]
    fn test_lines_from_boxes_groups_rows() {
        let boxes = vec![
            text_box(200.0, 52.0, "2,000.00"),
            text_box(10.0, 10.0, "Description"),
            text_box(100.0, 11.0, "Qty"),
            text_box(10.0, 50.0, "Widget A"),
            text_box(100.0, 51.0, "2"),
            text_box(300.0, 90.0, "  "),
        ];

        assert_eq!(
            lines_from_boxes(boxes),
            "Description   Qty\nWidget A   2   2,000.00"
        );
    }

    #[test]
    fn test_recover_text_uses_recognizer() {
        let recognizer = FixedRecognizer("Qty  Unit Price");
        let escalator = OcrEscalator::new(Some(&recognizer), 300);

        assert_eq!(escalator.try_recover_text(&ScannedPage, 1).unwrap(), "Qty  Unit Price");
    }

    #[test]
    fn test_recover_text_failures() {
        let recognizer = FixedRecognizer("never");
        let escalator = OcrEscalator::new(Some(&recognizer), 300);
        assert!(matches!(
            escalator.try_recover_text(&ScannedPage, 5),
            Err(OcrError::PageImage(DocumentError::InvalidPage(5)))
        ));

        let memory = MemoryDocument::new("m").with_text_page("");
        assert!(matches!(
            escalator.try_recover_text(&memory, 1),
            Err(OcrError::PageImage(DocumentError::Unsupported(_)))
        ));

        let disabled = OcrEscalator::new(None, 300);
        assert!(!disabled.is_enabled());
        assert!(matches!(
            disabled.try_recover_text(&ScannedPage, 1),
            Err(OcrError::Disabled)
        ));
    }
}
