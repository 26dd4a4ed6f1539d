use anyhow::{anyhow, Result};
use skia_safe::canvas::PointMode;
use skia_safe::paint::{Cap, Join, Style};
use skia_safe::{
    AlphaType, Canvas, Color, ColorType, Data, Font, FontMgr, FontStyle, Image, ImageInfo, Paint,
};

use crate::annotation::{Annotation, Mark};
use crate::config::Config;
use crate::coords::Point;
use crate::document::PageRaster;

/// Replays annotations onto a canvas in raster space.
///
/// Holds only paints and fonts: every call redraws the full list, so two
/// replays of the same list produce the same pixels.
pub struct OverlayRenderer {
    ink: Paint,
    ink_fill: Paint,
    score: Paint,
    text_font: Font,
    score_font: Font,
    glyph_size: f32,
}

impl OverlayRenderer {
    pub fn new(config: &Config) -> Self {
        let [r, g, b] = config.stroke_colour;
        let mut ink = Paint::default();
        ink.set_anti_alias(true);
        ink.set_color(Color::from_rgb(r, g, b));
        ink.set_style(Style::Stroke);
        ink.set_stroke_width(config.stroke_width);
        ink.set_stroke_cap(Cap::Round);
        ink.set_stroke_join(Join::Round);

        let mut ink_fill = ink.clone();
        ink_fill.set_style(Style::Fill);

        let [r, g, b] = config.number_colour;
        let mut score = Paint::default();
        score.set_anti_alias(true);
        score.set_color(Color::from_rgb(r, g, b));
        score.set_style(Style::Fill);

        Self {
            ink,
            ink_fill,
            score,
            text_font: load_font(false, config.text_size),
            score_font: load_font(true, config.text_size * 1.25),
            glyph_size: config.glyph_size,
        }
    }

    /// Clear the canvas to transparent, then replay every annotation in order.
    pub fn render(&self, canvas: &Canvas, annotations: &[Annotation]) {
        canvas.clear(Color::TRANSPARENT);
        self.replay(canvas, annotations);
    }

    /// Draw annotations over whatever the canvas already holds.
    pub fn replay(&self, canvas: &Canvas, annotations: &[Annotation]) {
        for annotation in annotations {
            self.draw_mark(canvas, &annotation.mark);
        }
    }

    /// Draw the base page first and its annotations second, so marks never land
    /// on a stale or blank page.
    pub fn compose(&self, canvas: &Canvas, page: &Image, annotations: &[Annotation]) {
        canvas.draw_image(page, (0.0, 0.0), None);
        self.replay(canvas, annotations);
    }

    /// Preview of a stroke that has not been committed yet.
    pub fn draw_live_stroke(&self, canvas: &Canvas, points: &[Point]) {
        self.draw_polyline(canvas, points);
    }

    fn draw_mark(&self, canvas: &Canvas, mark: &Mark) {
        match mark {
            Mark::Stroke { points } => self.draw_polyline(canvas, points),
            Mark::Check { at } => {
                let s = self.glyph_size;
                let (x, y) = (at.x as f32, at.y as f32);
                let pts = [
                    skia_safe::Point::new(x - s * 0.5, y),
                    skia_safe::Point::new(x - s * 0.15, y + s * 0.4),
                    skia_safe::Point::new(x + s * 0.5, y - s * 0.5),
                ];
                canvas.draw_points(PointMode::Polygon, &pts, &self.ink);
            }
            Mark::Cross { at } => {
                let h = self.glyph_size * 0.5;
                let (x, y) = (at.x as f32, at.y as f32);
                canvas.draw_line((x - h, y - h), (x + h, y + h), &self.ink);
                canvas.draw_line((x - h, y + h), (x + h, y - h), &self.ink);
            }
            Mark::Text { at, text } => {
                canvas.draw_str(
                    text,
                    (at.x as f32, at.y as f32),
                    &self.text_font,
                    &self.ink_fill,
                );
            }
            Mark::Number { at, text } => {
                canvas.draw_str(
                    text,
                    (at.x as f32, at.y as f32),
                    &self.score_font,
                    &self.score,
                );
            }
        }
    }

    fn draw_polyline(&self, canvas: &Canvas, points: &[Point]) {
        let pts: Vec<skia_safe::Point> = points
            .iter()
            .map(|p| skia_safe::Point::new(p.x as f32, p.y as f32))
            .collect();
        let mode = match pts.len() {
            0 => return,
            // A single sample is a dot; round caps give it the pen width.
            1 => PointMode::Points,
            _ => PointMode::Polygon,
        };
        canvas.draw_points(mode, &pts, &self.ink);
    }
}

/// Upload a rendered page as a Skia image.
pub fn page_image(raster: &PageRaster) -> Result<Image> {
    let info = ImageInfo::new(
        (raster.width as i32, raster.height as i32),
        ColorType::RGBA8888,
        AlphaType::Unpremul,
        None,
    );
    let rgba = raster.to_rgba();
    skia_safe::images::raster_from_data(
        &info,
        Data::new_copy(&rgba),
        raster.width as usize * 4,
    )
    .ok_or_else(|| anyhow!("Could not create image for page {}", raster.page))
}

fn load_font(bold: bool, size: f32) -> Font {
    let style = if bold {
        FontStyle::bold()
    } else {
        FontStyle::normal()
    };
    let font_mgr = FontMgr::default();
    let typeface = font_mgr
        .match_family_style("DejaVu Sans", style)
        .or_else(|| font_mgr.match_family_style("sans-serif", style));
    match typeface {
        Some(typeface) => Font::from_typeface(typeface, size),
        None => {
            log::warn!("No sans-serif font found, annotation text uses the default typeface");
            let mut font = Font::default();
            font.set_size(size);
            font.set_embolden(bold);
            font
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationStore;

    const W: i32 = 200;
    const H: i32 = 160;

    fn store() -> AnnotationStore {
        let mut store = AnnotationStore::new();
        store.push(Mark::Stroke {
            points: vec![
                Point::new(10.0, 10.0),
                Point::new(60.0, 40.0),
                Point::new(90.0, 20.0),
            ],
        });
        store.push(Mark::Check {
            at: Point::new(120.0, 60.0),
        });
        store.push(Mark::Cross {
            at: Point::new(50.0, 110.0),
        });
        store.push(Mark::Text {
            at: Point::new(100.0, 130.0),
            text: "see p2".into(),
        });
        store.push(Mark::Number {
            at: Point::new(150.0, 100.0),
            text: "3".into(),
        });
        store
    }

    fn pixels(surface: &mut skia_safe::Surface) -> Vec<u8> {
        let info = ImageInfo::new((W, H), ColorType::RGBA8888, AlphaType::Premul, None);
        let mut buf = vec![0u8; (W * H * 4) as usize];
        assert!(surface.read_pixels(&info, &mut buf, (W * 4) as usize, (0, 0)));
        buf
    }

    fn pixel_at(buf: &[u8], x: i32, y: i32) -> [u8; 4] {
        let i = ((y * W + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn test_replay_is_deterministic() {
        let renderer = OverlayRenderer::new(&Config::default());
        let store = store();

        let mut first = skia_safe::surfaces::raster_n32_premul((W, H)).unwrap();
        renderer.render(first.canvas(), store.as_slice());
        let a = pixels(&mut first);

        renderer.render(first.canvas(), store.as_slice());
        let again = pixels(&mut first);

        let mut second = skia_safe::surfaces::raster_n32_premul((W, H)).unwrap();
        renderer.render(second.canvas(), store.as_slice());
        let b = pixels(&mut second);

        assert_eq!(a, again);
        assert_eq!(a, b);
        assert!(a.iter().any(|&v| v != 0));
    }

    #[test]
    fn test_render_clears_removed_annotations() {
        let renderer = OverlayRenderer::new(&Config::default());
        let mut store = store();
        let mut surface = skia_safe::surfaces::raster_n32_premul((W, H)).unwrap();
        renderer.render(surface.canvas(), store.as_slice());
        store.clear();
        renderer.render(surface.canvas(), store.as_slice());
        assert!(pixels(&mut surface).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_cross_centre_is_inked() {
        let renderer = OverlayRenderer::new(&Config::default());
        let mut store = AnnotationStore::new();
        store.push(Mark::Cross {
            at: Point::new(100.0, 80.0),
        });
        let mut surface = skia_safe::surfaces::raster_n32_premul((W, H)).unwrap();
        renderer.render(surface.canvas(), store.as_slice());
        let buf = pixels(&mut surface);
        assert_eq!(pixel_at(&buf, 100, 80)[3], 255);
        assert_eq!(pixel_at(&buf, 5, 5)[3], 0);
    }

    #[test]
    fn test_compose_draws_page_under_marks() {
        let renderer = OverlayRenderer::new(&Config::default());
        let raster = PageRaster::new(1, W as u32, H as u32, vec![200; (W * H * 3) as usize])
            .unwrap();
        let image = page_image(&raster).unwrap();
        let mut store = AnnotationStore::new();
        store.push(Mark::Cross {
            at: Point::new(100.0, 80.0),
        });

        let mut surface = skia_safe::surfaces::raster_n32_premul((W, H)).unwrap();
        renderer.compose(surface.canvas(), &image, store.as_slice());
        let buf = pixels(&mut surface);
        assert_eq!(pixel_at(&buf, 5, 5), [200, 200, 200, 255]);
        assert_ne!(pixel_at(&buf, 100, 80), [200, 200, 200, 255]);
    }
}
