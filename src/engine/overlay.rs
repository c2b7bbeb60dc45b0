//! Overlay plans and their rasterization.
//!
//! The annotator first describes what to draw as an `OverlayPlan` (pure data),
//! then `rasterize` paints it with imageproc. Text needs a font; without one,
//! text operations are measured but not painted.

use std::path::Path;

use ab_glyph::FontVec;
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::detect::BBox;

/// Widest box outline drawn, in pixels.
pub const MAX_STROKE_WIDTH: u32 = 64;

/// Average glyph advance as a fraction of the pixel scale, used when no font is loaded.
const FALLBACK_ADVANCE: f32 = 0.55;

const SYSTEM_FONT_PATHS: [&str; 5] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Hollow rectangle covering `bbox` inclusive, thickened outward by `stroke - 1` pixels.
    Rect {
        bbox: BBox,
        color: Rgb<u8>,
        stroke: u32,
    },
    /// Text whose top-left corner is at `(x, y)`.
    Text {
        text: String,
        x: i32,
        y: i32,
        scale: f32,
        color: Rgb<u8>,
        /// Measured `(width, height)` at plan time.
        size: (u32, u32),
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayPlan {
    ops: Vec<DrawOp>,
}

impl OverlayPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn rects(&self) -> impl Iterator<Item = &DrawOp> {
        self.ops.iter().filter(|op| matches!(op, DrawOp::Rect { .. }))
    }

    /// Text strings in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                DrawOp::Rect { .. } => None,
            })
            .collect()
    }

    /// Find a text operation by its exact string.
    pub fn text_op(&self, needle: &str) -> Option<&DrawOp> {
        self.ops
            .iter()
            .find(|op| matches!(op, DrawOp::Text { text, .. } if text == needle))
    }
}

/// Measures and paints text with an optional font.
pub struct TextRenderer {
    font: Option<FontVec>,
}

impl TextRenderer {
    pub fn new(font: Option<FontVec>) -> Self {
        Self { font }
    }

    /// Renderer that measures text but never paints it.
    pub fn without_font() -> Self {
        Self { font: None }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| anyhow!("failed to parse font file {}", path.display()))?;
        Ok(Self::new(Some(font)))
    }

    /// Try common system font locations; fall back to no font.
    pub fn system() -> Self {
        for path in SYSTEM_FONT_PATHS {
            if let Ok(renderer) = Self::from_path(Path::new(path)) {
                log::info!("loaded system font: {}", path);
                return renderer;
            }
        }
        log::debug!("no system font found");
        Self::without_font()
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Rendered `(width, height)` of `text` at `scale` pixels.
    pub fn measure(&self, text: &str, scale: f32) -> (u32, u32) {
        match &self.font {
            Some(font) => text_size(scale, font, text),
            None => {
                let chars = text.chars().count() as f32;
                (
                    (chars * scale * FALLBACK_ADVANCE).ceil() as u32,
                    scale.ceil() as u32,
                )
            }
        }
    }
}

/// Paint `plan` onto `image`. Shapes falling partly outside the image are clipped.
pub fn rasterize(image: &mut RgbImage, plan: &OverlayPlan, text: &TextRenderer) {
    for op in plan.ops() {
        match op {
            DrawOp::Rect {
                bbox,
                color,
                stroke,
            } => draw_box(image, bbox, *color, *stroke),
            DrawOp::Text {
                text: s,
                x,
                y,
                scale,
                color,
                ..
            } => {
                if let Some(font) = &text.font {
                    draw_text_mut(image, *color, *x, *y, *scale, font, s);
                }
            }
        }
    }
}

fn draw_box(image: &mut RgbImage, bbox: &BBox, color: Rgb<u8>, stroke: u32) {
    let width = bbox.width().max(0) as u32 + 1;
    let height = bbox.height().max(0) as u32 + 1;
    for t in 0..stroke.clamp(1, MAX_STROKE_WIDTH) {
        let ti = t as i32;
        let rect = Rect::at(bbox.x1 - ti, bbox.y1 - ti).of_size(width + 2 * t, height + 2 * t);
        draw_hollow_rect_mut(image, rect, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    #[test]
    fn box_edges_are_painted_interior_untouched() {
        let mut image = RgbImage::from_pixel(50, 50, BLACK);
        let mut plan = OverlayPlan::new();
        plan.push(DrawOp::Rect {
            bbox: BBox::new(10, 10, 20, 20),
            color: RED,
            stroke: 2,
        });
        rasterize(&mut image, &plan, &TextRenderer::without_font());

        assert_eq!(*image.get_pixel(10, 10), RED);
        assert_eq!(*image.get_pixel(20, 20), RED);
        assert_eq!(*image.get_pixel(9, 9), RED);
        assert_eq!(*image.get_pixel(21, 15), RED);
        assert_eq!(*image.get_pixel(15, 15), BLACK);
        assert_eq!(*image.get_pixel(8, 8), BLACK);
    }

    #[test]
    fn boxes_touching_the_border_are_clipped() {
        let mut image = RgbImage::from_pixel(20, 20, BLACK);
        let mut plan = OverlayPlan::new();
        plan.push(DrawOp::Rect {
            bbox: BBox::new(0, 0, 19, 19),
            color: RED,
            stroke: 3,
        });
        rasterize(&mut image, &plan, &TextRenderer::without_font());
        assert_eq!(*image.get_pixel(0, 0), RED);
        assert_eq!(*image.get_pixel(19, 19), RED);
    }

    #[test]
    fn oversized_stroke_is_clamped() {
        let mut image = RgbImage::from_pixel(20, 20, BLACK);
        let mut plan = OverlayPlan::new();
        plan.push(DrawOp::Rect {
            bbox: BBox::new(5, 5, 10, 10),
            color: RED,
            stroke: u32::MAX,
        });
        rasterize(&mut image, &plan, &TextRenderer::without_font());
        assert_eq!(*image.get_pixel(5, 5), RED);
        assert_eq!(*image.get_pixel(0, 0), RED);
        assert_eq!(*image.get_pixel(8, 8), BLACK);
    }

    #[test]
    fn text_without_font_is_measured_but_not_painted() {
        let renderer = TextRenderer::without_font();
        let (w, h) = renderer.measure("People: 0", 20.0);
        assert!((95..=105).contains(&w), "width {}", w);
        assert_eq!(h, 20);
        assert!(renderer.measure("People: 10", 20.0).0 > w);

        let mut image = RgbImage::from_pixel(50, 50, BLACK);
        let before = image.clone();
        let mut plan = OverlayPlan::new();
        plan.push(DrawOp::Text {
            text: "People: 0".into(),
            x: 0,
            y: 0,
            scale: 20.0,
            color: RED,
            size: (w, h),
        });
        rasterize(&mut image, &plan, &renderer);
        assert_eq!(image, before);
        assert_eq!(plan.texts(), vec!["People: 0"]);
    }

    #[test]
    fn missing_font_file_is_an_error() {
        assert!(TextRenderer::from_path(Path::new("/nonexistent/font.ttf")).is_err());
    }
}
