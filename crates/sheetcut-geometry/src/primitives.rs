use std::f64::consts::TAU;

use nalgebra::{Affine2, Point2, Vector2};

use crate::CurveId;

const FULL_CIRCLE_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Point2<f64>,
    pub end: Point2<f64>,
}

impl Segment {
    #[must_use]
    pub fn new(start: Point2<f64>, end: Point2<f64>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    #[must_use]
    pub fn transformed(&self, t: &Affine2<f64>) -> Self {
        Self {
            start: t.transform_point(&self.start),
            end: t.transform_point(&self.end),
        }
    }
}

/// A circular arc swept from `start_angle` to `end_angle` in the direction of increasing
/// angle. `start_angle` is kept in `[0, 2pi)` and the sweep in `(0, 2pi]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcPrimitive {
    pub center: Point2<f64>,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl ArcPrimitive {
    #[must_use]
    pub fn new(center: Point2<f64>, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        let mut sweep = end_angle - start_angle;
        if sweep <= 0.0 {
            sweep += TAU * ((-sweep / TAU).floor() + 1.0);
        }
        let start = start_angle.rem_euclid(TAU);
        Self {
            center,
            radius,
            start_angle: start,
            end_angle: start + sweep.min(TAU),
        }
    }

    /// Arc whose local frame is given by the images of the unit X and Y axes scaled by
    /// the radius. A frame with negative orientation reverses the sweep, so the result is
    /// still expressed in the increasing-angle direction.
    #[must_use]
    pub fn from_frame(
        center: Point2<f64>,
        ux: Vector2<f64>,
        uy: Vector2<f64>,
        start_angle: f64,
        end_angle: f64,
    ) -> Self {
        let radius = ux.norm();
        let base = ux.y.atan2(ux.x);
        if ux.perp(&uy) >= 0.0 {
            Self::new(center, radius, base + start_angle, base + end_angle)
        } else {
            Self::new(center, radius, base - end_angle, base - start_angle)
        }
    }

    #[must_use]
    pub fn sweep(&self) -> f64 {
        self.end_angle - self.start_angle
    }

    #[must_use]
    pub fn is_full_circle(&self) -> bool {
        self.sweep() >= TAU - FULL_CIRCLE_EPS
    }

    #[must_use]
    pub fn point_at(&self, angle: f64) -> Point2<f64> {
        let (s, c) = angle.sin_cos();
        Point2::new(self.center.x + self.radius * c, self.center.y + self.radius * s)
    }

    #[must_use]
    pub fn start_point(&self) -> Point2<f64> {
        self.point_at(self.start_angle)
    }

    #[must_use]
    pub fn end_point(&self) -> Point2<f64> {
        self.point_at(self.end_angle)
    }

    #[must_use]
    pub fn transformed(&self, t: &Affine2<f64>) -> Self {
        let ux = t.transform_vector(&Vector2::new(self.radius, 0.0));
        let uy = t.transform_vector(&Vector2::new(0.0, self.radius));
        Self::from_frame(
            t.transform_point(&self.center),
            ux,
            uy,
            self.start_angle,
            self.end_angle,
        )
    }

    /// Chord points from start to end (both included), no chord spanning more than `max_step`.
    #[must_use]
    pub fn approximate(&self, max_step: f64) -> Vec<Point2<f64>> {
        // Tolerate sweeps a few ulps over an exact multiple of the step.
        let count = (self.sweep() / max_step.max(1e-6) - 1e-9).ceil().max(1.0) as usize;
        let step = self.sweep() / count as f64;
        (0..=count)
            .map(|i| self.point_at(self.start_angle + step * i as f64))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Line(Segment),
    Arc { arc: ArcPrimitive, curve: CurveId },
}

impl Primitive {
    #[must_use]
    pub fn curve(&self) -> Option<CurveId> {
        match self {
            Self::Line(_) => None,
            Self::Arc { curve, .. } => Some(*curve),
        }
    }

    #[must_use]
    pub fn transformed(&self, t: &Affine2<f64>) -> Self {
        match self {
            Self::Line(seg) => Self::Line(seg.transformed(t)),
            Self::Arc { arc, curve } => Self::Arc {
                arc: arc.transformed(t),
                curve: *curve,
            },
        }
    }
}
