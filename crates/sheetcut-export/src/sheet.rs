//! Format-neutral drawing interface shared by the DXF and SVG writers.

use std::io;

use nalgebra::Point2;
use sheetcut_geometry::{Primitive, Segment};

use crate::config::Layer;

/// Axis-aligned rectangle in file coordinates, `(x, y)` being the minimum corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn spanning(a: Point2<f64>, b: Point2<f64>) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (a.x - b.x).abs(),
            height: (a.y - b.y).abs(),
        }
    }

    /// Corners counter-clockwise in a Y-up frame, starting at the minimum corner.
    #[must_use]
    pub fn corners(&self) -> [Point2<f64>; 4] {
        [
            Point2::new(self.x, self.y),
            Point2::new(self.x + self.width, self.y),
            Point2::new(self.x + self.width, self.y + self.height),
            Point2::new(self.x, self.y + self.height),
        ]
    }
}

/// Receives one sheet's geometry, already in file coordinates, in a single pass:
/// `begin`, then for each visible layer `begin_layer` / shapes / `end_layer`, then `finish`.
pub trait SheetWriter {
    /// `width`/`height` are the sheet extents; `layers` are the visible layers in order.
    fn begin(&mut self, width: f64, height: f64, layers: &[Layer]) -> io::Result<()>;
    fn begin_layer(&mut self, layer: Layer) -> io::Result<()>;
    fn rect(&mut self, layer: Layer, rect: Rect, label: &str) -> io::Result<()>;
    fn line(&mut self, layer: Layer, segment: Segment, label: &str) -> io::Result<()>;
    fn outline(&mut self, layer: Layer, primitives: &[Primitive], label: &str) -> io::Result<()>;
    fn end_layer(&mut self, layer: Layer) -> io::Result<()>;
    /// Writes the footer and flushes.
    fn finish(&mut self) -> io::Result<()>;
}

/// Widest angle covered by one chord when arcs are not emitted natively.
pub const CHORD_STEP: f64 = std::f64::consts::PI / 18.0;
