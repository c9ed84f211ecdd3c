//! Boundary loops for common part outlines, built in the XY plane.
//!
//! Arcs are tessellated the way a modeler stores them: several edges that all point at
//! the same curve.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use nalgebra::Point3;

use crate::{ArcCurve, BoundaryLoop, GeometryError, LoopBuilder};

fn at(x: f64, y: f64) -> Point3<f64> {
    Point3::new(x, y, 0.0)
}

/// Axis-aligned rectangle with its first corner at `origin`, counter-clockwise.
pub fn rectangle(origin: (f64, f64), size: (f64, f64)) -> Result<BoundaryLoop, GeometryError> {
    let (x, y) = origin;
    let (w, h) = size;
    polygon(&[(x, y), (x + w, y), (x + w, y + h), (x, y + h)])
}

pub fn polygon(vertices: &[(f64, f64)]) -> Result<BoundaryLoop, GeometryError> {
    let Some(&(x0, y0)) = vertices.first() else {
        return Ok(BoundaryLoop::empty());
    };
    vertices
        .iter()
        .skip(1)
        .fold(LoopBuilder::new(at(x0, y0)), |b, &(x, y)| b.line_to(at(x, y)))
        .close()
}

pub fn circle(
    center: (f64, f64),
    radius: f64,
    segments: usize,
) -> Result<BoundaryLoop, GeometryError> {
    let curve = ArcCurve::planar(center, radius, 0.0, TAU);
    LoopBuilder::new(curve.start_point())
        .arc(curve, segments)
        .close()
}

/// Rectangle with quarter-circle corners. A zero radius degrades to [`rectangle`].
pub fn rounded_rectangle(
    origin: (f64, f64),
    size: (f64, f64),
    corner_radius: f64,
    segments_per_corner: usize,
) -> Result<BoundaryLoop, GeometryError> {
    let (x, y) = origin;
    let (w, h) = size;
    let r = corner_radius.min(w / 2.0).min(h / 2.0).max(0.0);
    if r == 0.0 {
        return rectangle(origin, size);
    }

    let corner = |cx: f64, cy: f64, from: f64| ArcCurve::planar((cx, cy), r, from, from + FRAC_PI_2);

    LoopBuilder::new(at(x + r, y))
        .line_to(at(x + w - r, y))
        .arc(corner(x + w - r, y + r, -FRAC_PI_2), segments_per_corner)
        .line_to(at(x + w, y + h - r))
        .arc(corner(x + w - r, y + h - r, 0.0), segments_per_corner)
        .line_to(at(x + r, y + h))
        .arc(corner(x + r, y + h - r, FRAC_PI_2), segments_per_corner)
        .line_to(at(x, y + r))
        .arc(corner(x + r, y + r, PI), segments_per_corner)
        .close()
}
