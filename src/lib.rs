pub mod annotation;
pub mod config;
pub mod coords;
pub mod document;
pub mod egui_integration;
pub mod error;
pub mod ledger;
pub mod loader;
pub mod navigator;
pub mod overlay;
pub mod questions;
pub mod session;
pub mod tools;
pub mod ui;

use anyhow::{bail, Result};
use mupdf::{Colorspace, Matrix};

/// Render a page to an RGB pixmap, scaled so the longest edge fits `target_size`.
/// `page_number` is 0-based as MuPDF expects.
/// Returns (rgb_bytes, pixel_width, pixel_height, page_pts_width, page_pts_height).
pub fn render_page_pixmap(
    doc: &mupdf::Document,
    page_number: i32,
    target_size: u32,
) -> Result<(Vec<u8>, u32, u32, f64, f64)> {
    let page = doc.load_page(page_number)?;
    let bounds = page.bounds()?;
    let width_pts = (bounds.x1 - bounds.x0) as f64;
    let height_pts = (bounds.y1 - bounds.y0) as f64;

    let longest = width_pts.max(height_pts);
    if longest <= 0.0 {
        bail!("page {} has empty bounds", page_number + 1);
    }
    let scale = (target_size as f64 / longest) as f32;

    let pixmap = page.to_pixmap(
        &Matrix::new_scale(scale, scale),
        &Colorspace::device_rgb(),
        false,
        true,
    )?;

    let pixel_width = pixmap.width();
    let pixel_height = pixmap.height();
    let samples = pixmap.samples().to_vec();

    Ok((samples, pixel_width, pixel_height, width_pts, height_pts))
}
