//! Occupancy & annotation engine.
//!
//! Given one frame's detections, the engine:
//! - keeps recognized labels (`person`, `book`, `table`, `chair`) and colors them
//! - counts people
//! - marks a table occupied when a seat box lies strictly inside it
//! - draws boxes, labels, table captions and the person count onto the frame
//!
//! No state survives between frames.

mod annotator;
mod class;
mod occupancy;
mod overlay;

pub use annotator::{Annotator, RenderStyle};
pub use class::{ClassStyle, ObjectClass};
pub use occupancy::{table_occupancy, table_statuses, OccupancyReport, TableStatus};
pub use overlay::{rasterize, DrawOp, OverlayPlan, TextRenderer, MAX_STROKE_WIDTH};
