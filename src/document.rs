use anyhow::{bail, Result};

use crate::error::MarkingError;

/// An RGB raster of one rendered page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRaster {
    pub page: u32,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGB, row-major.
    pub rgb: Vec<u8>,
}

impl PageRaster {
    pub fn new(page: u32, width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 {
            bail!("page {} rendered to an empty raster", page);
        }
        if rgb.len() < expected {
            bail!(
                "page {} raster holds {} bytes, expected {}",
                page,
                rgb.len(),
                expected
            );
        }
        Ok(Self {
            page,
            width,
            height,
            rgb,
        })
    }

    /// Plain white page, used when a page fails to rasterise so marking can go on.
    pub fn blank(page: u32, width: u32, height: u32) -> Self {
        Self {
            page,
            width,
            height,
            rgb: vec![255; width as usize * height as usize * 3],
        }
    }

    /// Expand to RGBA for Skia, which has no packed 24-bit colour type.
    pub fn to_rgba(&self) -> Vec<u8> {
        let pixel_count = self.width as usize * self.height as usize;
        let mut rgba = Vec::with_capacity(pixel_count * 4);
        for px in self.rgb.chunks_exact(3).take(pixel_count) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        rgba
    }
}

/// Something that can rasterise the pages of an answer sheet.
/// Pages are 1-indexed.
pub trait PageSource {
    fn page_count(&self) -> u32;
    fn render_page(&self, page: u32) -> Result<PageRaster>;
}

/// Scanned answer sheet decoded by MuPDF.
pub struct PdfSheet {
    doc: mupdf::Document,
    page_count: u32,
    target_size: u32,
}

impl PdfSheet {
    /// Open a PDF held in memory. `target_size` is the longest raster edge in pixels.
    pub fn from_bytes(bytes: &[u8], target_size: u32) -> Result<Self, MarkingError> {
        let doc = mupdf::Document::from_bytes(bytes, "application/pdf")
            .map_err(|e| MarkingError::DocumentLoadFailure(e.to_string()))?;
        let page_count = doc
            .page_count()
            .map_err(|e| MarkingError::DocumentLoadFailure(e.to_string()))?;
        if page_count < 1 {
            return Err(MarkingError::DocumentLoadFailure(
                "document has no pages".into(),
            ));
        }
        log::info!("Answer sheet has {} page(s)", page_count);
        Ok(Self {
            doc,
            page_count: page_count as u32,
            target_size,
        })
    }
}

impl PageSource for PdfSheet {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&self, page: u32) -> Result<PageRaster> {
        if page < 1 || page > self.page_count {
            bail!("page {} outside 1..={}", page, self.page_count);
        }
        let (rgb, width, height, _, _) =
            crate::render_page_pixmap(&self.doc, page as i32 - 1, self.target_size)?;
        log::info!("Rendered page {} at {}x{}", page, width, height);
        PageRaster::new(page, width, height, rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_buffer_is_rejected() {
        assert!(PageRaster::new(1, 2, 2, vec![0; 11]).is_err());
        assert!(PageRaster::new(1, 0, 2, vec![]).is_err());
        assert!(PageRaster::new(1, 2, 2, vec![0; 12]).is_ok());
    }

    #[test]
    fn test_rgba_expansion() {
        let raster = PageRaster::new(1, 2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(raster.to_rgba(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_invalid_pdf_bytes_fail_to_load() {
        let result = PdfSheet::from_bytes(b"definitely not a pdf", 800);
        assert!(matches!(result, Err(MarkingError::DocumentLoadFailure(_))));
    }
}
