//! PDF reading using lopdf and pdf-extract.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, trace, warn};

use super::memory::file_name;
use super::{check_page, DocumentReader, Result};
use crate::error::DocumentError;

/// Page tree nesting deeper than this is treated as corrupt.
const MAX_TREE_DEPTH: usize = 32;

/// PDF points per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// A loaded PDF document.
pub struct PdfDocument {
    name: String,
    document: Document,
    /// Page object ids, index = page number - 1.
    page_ids: Vec<ObjectId>,
    /// Per-page text from pdf-extract, when it could read the file.
    page_texts: Option<Vec<String>>,
}

impl PdfDocument {
    /// Open a PDF from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| DocumentError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(file_name(path), &data)
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| DocumentError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(DocumentError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| DocumentError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        if page_ids.is_empty() {
            return Err(DocumentError::NoPages);
        }

        let page_texts = match pdf_extract::extract_text_from_mem_by_pages(&raw_data) {
            Ok(texts) if texts.len() == page_ids.len() => Some(texts),
            Ok(texts) => {
                warn!(
                    "pdf-extract returned {} pages for a {}-page document, using lopdf text",
                    texts.len(),
                    page_ids.len()
                );
                None
            }
            Err(e) => {
                warn!("pdf-extract failed ({}), using lopdf text", e);
                None
            }
        };

        let name = name.into();
        debug!("Loaded PDF {} with {} pages", name, page_ids.len());

        Ok(Self {
            name,
            document,
            page_ids,
            page_texts,
        })
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        let idx = check_page(page, self.page_count())?;
        Ok(self.page_ids[idx])
    }

    /// Look up a page attribute, following `Parent` links for inherited values.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.document.get_object(page_id).ok()?.as_dict().ok()?;

        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return self.document.dereference(value).ok().map(|(_, obj)| obj);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.document.get_object(parent).ok()?.as_dict().ok()?;
        }
        None
    }

    /// Image XObjects referenced from a page's resources.
    fn page_images(&self, page_id: ObjectId) -> Vec<DynamicImage> {
        let Some(Object::Dictionary(resources)) = self.inherited_attribute(page_id, b"Resources") else {
            return Vec::new();
        };
        let Some(xobjects) = self.resolve_dict(resources, b"XObject") else {
            return Vec::new();
        };

        xobjects
            .iter()
            .filter_map(|(_, obj)| match self.document.dereference(obj) {
                Ok((_, Object::Stream(stream))) => self.decode_image(stream),
                _ => None,
            })
            .collect()
    }

    fn resolve_dict<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
        let value = dict.get(key).ok()?;
        match self.document.dereference(value) {
            Ok((_, Object::Dictionary(d))) => Some(d),
            _ => None,
        }
    }

    fn decode_image(&self, stream: &Stream) -> Option<DynamicImage> {
        let dict = &stream.dict;
        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);
        if width == 0 || height == 0 {
            return None;
        }

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping image with unsupported filter");
                return None;
            }
            _ => {}
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let pixels = (width as usize).checked_mul(height as usize)?;
        let rgb_len = pixels.checked_mul(3)?;

        match color_space {
            b"DeviceRGB" | b"RGB" if data.len() >= rgb_len => {
                RgbImage::from_raw(width, height, data[..rgb_len].to_vec()).map(DynamicImage::ImageRgb8)
            }
            b"DeviceGray" | b"G" if data.len() >= pixels => {
                GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
            }
            _ => {
                trace!(
                    "Could not decode image: colorspace={}, data_len={}",
                    String::from_utf8_lossy(color_space),
                    data.len()
                );
                None
            }
        }
    }

    /// Page width in points, from the (possibly inherited) MediaBox.
    fn page_width(&self, page_id: ObjectId) -> Option<f32> {
        let Object::Array(media_box) = self.inherited_attribute(page_id, b"MediaBox")? else {
            return None;
        };
        let coords: Vec<f32> = media_box.iter().filter_map(number).collect();
        match coords.as_slice() {
            [x0, _, x1, _] => Some((x1 - x0).abs()),
            _ => None,
        }
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

impl DocumentReader for PdfDocument {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String> {
        let idx = check_page(page, self.page_count())?;
        if let Some(texts) = &self.page_texts {
            return Ok(texts[idx].clone());
        }
        self.document
            .extract_text(&[page])
            .map_err(|e| DocumentError::TextExtraction(e.to_string()))
    }

    /// Scanned pages carry the page as an image XObject; the largest one is
    /// taken as the page and scaled to `dpi` using the page width.
    fn render_page(&self, page: u32, dpi: u32) -> Result<DynamicImage> {
        let page_id = self.page_id(page)?;

        let image = self
            .page_images(page_id)
            .into_iter()
            .max_by_key(|img| u64::from(img.width()) * u64::from(img.height()))
            .ok_or_else(|| DocumentError::Render(format!("no decodable images on page {}", page)))?;

        let target_width = self
            .page_width(page_id)
            .map(|points| (points / POINTS_PER_INCH * dpi as f32).round() as u32)
            .filter(|&w| w > 0);

        match target_width {
            Some(w) if w != image.width() => {
                debug!("Scaling page {} image from {}px to {}px wide", page, image.width(), w);
                Ok(image.resize(w, u32::MAX, FilterType::Triangle))
            }
            _ => Ok(image),
        }
    }
}
