//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ItemizeConfig, ModelConfig};

use super::{lines_from_boxes, TextBox, TextRecognizer};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `models`.
    pub fn from_models(models: &ModelConfig, keep_unk: bool) -> Result<Self, OcrError> {
        let det_path = models.model_path(&models.detection_model);
        let rec_path = models.model_path(&models.recognition_model);
        let dict_path = models.model_path(&models.dictionary);

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", models.model_dir.display());

        Ok(Self { engine, keep_unk })
    }

    /// Create an engine from a full configuration.
    pub fn from_config(config: &ItemizeConfig) -> Result<Self, OcrError> {
        Self::from_models(&config.models, config.ocr.keep_unk)
    }

    /// Recognize text boxes in an image.
    pub fn detect_boxes(&self, image: &DynamicImage) -> Result<Vec<TextBox>, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let boxes: Vec<TextBox> = results
            .iter()
            .map(|r| TextBox {
                rect: polygon_to_rect(&r.bounding_box),
                text: if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                },
            })
            .collect();

        debug!(
            "OCR found {} text regions in {}x{} image in {}ms",
            boxes.len(),
            width,
            height,
            start.elapsed().as_millis()
        );
        Ok(boxes)
    }
}

impl TextRecognizer for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        Ok(lines_from_boxes(self.detect_boxes(image)?))
    }
}

/// Convert a `Polygon<f64>` to an axis-aligned `[x1, y1, x2, y2]` rectangle.
fn polygon_to_rect(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 4] {
    let mut rect = [f32::INFINITY, f32::INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY];
    for coord in polygon.exterior().coords() {
        let (x, y) = (coord.x as f32, coord.y as f32);
        rect[0] = rect[0].min(x);
        rect[1] = rect[1].min(y);
        rect[2] = rect[2].max(x);
        rect[3] = rect[3].max(y);
    }
    if rect[0] > rect[2] {
        return [0.0; 4];
    }
    rect
}
