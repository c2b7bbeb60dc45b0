use image::Rgb;

use crate::detect::{BBox, Detection};
use crate::engine::class::{ClassStyle, ObjectClass};
use crate::engine::occupancy::{table_statuses, OccupancyReport};
use crate::engine::overlay::{rasterize, DrawOp, OverlayPlan, TextRenderer};
use crate::frame::Frame;

/// Geometry and sizing for overlays.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderStyle {
    /// Box outline width in pixels.
    pub stroke_width: u32,
    /// Pixel scale of detection labels.
    pub label_scale: f32,
    /// Pixel scale of table occupancy captions.
    pub caption_scale: f32,
    /// Pixel scale of the person count.
    pub count_scale: f32,
    /// Gap between a box's top edge and its label.
    pub label_offset: i32,
    /// Distance of the person count from the right edge.
    pub margin_x: i32,
    /// Distance of the person count baseline from the bottom edge.
    pub margin_y: i32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            stroke_width: 2,
            label_scale: 20.0,
            caption_scale: 20.0,
            count_scale: 28.0,
            label_offset: 10,
            margin_x: 10,
            margin_y: 20,
        }
    }
}

/// Occupancy & annotation engine.
///
/// Holds only static configuration; every call works from the detections it is
/// given, so annotating the same input twice gives the same report.
pub struct Annotator {
    style: ClassStyle,
    render: RenderStyle,
    seat_classes: Vec<ObjectClass>,
    text: TextRenderer,
}

impl Annotator {
    pub fn new(
        style: ClassStyle,
        render: RenderStyle,
        seat_classes: Vec<ObjectClass>,
        text: TextRenderer,
    ) -> Self {
        if !text.has_font() {
            log::warn!("no font available; labels and captions will not be drawn");
        }
        Self {
            style,
            render,
            seat_classes,
            text,
        }
    }

    /// Draw overlays for `detections` onto `frame` and report table occupancy.
    pub fn annotate(&self, frame: &mut Frame, detections: &[Detection]) -> OccupancyReport {
        let (plan, report) = self.plan(frame.width(), frame.height(), detections);
        rasterize(frame.image_mut(), &plan, &self.text);
        report
    }

    /// Build the overlay plan and report without touching pixels.
    pub fn plan(
        &self,
        width: u32,
        height: u32,
        detections: &[Detection],
    ) -> (OverlayPlan, OccupancyReport) {
        let mut plan = OverlayPlan::new();
        let mut person_count = 0;
        let mut tables: Vec<BBox> = Vec::new();
        let mut seats: Vec<BBox> = Vec::new();

        for det in detections {
            let Some(class) = ObjectClass::from_label(det.label()) else {
                continue;
            };
            let bbox = det.bbox();
            let color = self.style.color(class);

            plan.push(DrawOp::Rect {
                bbox,
                color,
                stroke: self.render.stroke_width,
            });
            let label_y = bbox.y1 - self.render.label_offset;
            self.push_text(
                &mut plan,
                det.label(),
                bbox.x1,
                label_y,
                self.render.label_scale,
                color,
            );

            if class == ObjectClass::Person {
                person_count += 1;
            }
            if class == ObjectClass::Table {
                tables.push(bbox);
            }
            if self.seat_classes.contains(&class) {
                seats.push(bbox);
            }
        }

        let statuses = table_statuses(&tables, &seats);
        let (_, label_h) = self.text.measure("table", self.render.label_scale);
        for (status, table) in statuses.iter().zip(&tables) {
            let caption = format!(
                "Table {}: {}",
                status.table_index,
                if status.occupied { "Occupied" } else { "Empty" }
            );
            let caption_y = table.y1 - self.render.label_offset - label_h as i32 - 4;
            self.push_text(
                &mut plan,
                &caption,
                table.x1,
                caption_y,
                self.render.caption_scale,
                self.style.occupancy_color(status.occupied),
            );
        }

        self.push_person_count(&mut plan, width, height, person_count);

        let report = OccupancyReport {
            tables: statuses,
            person_count,
        };
        (plan, report)
    }

    /// Text anchored by its baseline at `(x, baseline)`, clamped to stay on-frame vertically.
    fn push_text(
        &self,
        plan: &mut OverlayPlan,
        text: &str,
        x: i32,
        baseline: i32,
        scale: f32,
        color: Rgb<u8>,
    ) {
        let size = self.text.measure(text, scale);
        let y = (baseline - size.1 as i32).max(0);
        plan.push(DrawOp::Text {
            text: text.to_string(),
            x: x.max(0),
            y,
            scale,
            color,
            size,
        });
    }

    fn push_person_count(&self, plan: &mut OverlayPlan, width: u32, height: u32, count: usize) {
        let text = format!("People: {}", count);
        let scale = self.render.count_scale;
        let (text_w, text_h) = self.text.measure(&text, scale);
        let max_x = (width as i32 - text_w as i32).max(0);
        let max_y = (height as i32 - text_h as i32).max(0);
        let x = (width as i32 - text_w as i32 - self.render.margin_x).clamp(0, max_x);
        let y = (height as i32 - self.render.margin_y - text_h as i32).clamp(0, max_y);
        plan.push(DrawOp::Text {
            text,
            x,
            y,
            scale,
            color: self.style.person_count,
            size: (text_w, text_h),
        });
    }
}
