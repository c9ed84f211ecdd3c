use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Point3, Vector3};

const EPS: f64 = 1e-9;

#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("edge {edge} references unknown arc curve {curve}")]
    UnknownCurve { edge: usize, curve: usize },
    #[error("arc curve {curve} must have a positive finite radius (got {radius})")]
    InvalidRadius { curve: usize, radius: f64 },
    #[error("arc curve {curve} has a degenerate axis frame")]
    DegenerateAxes { curve: usize },
    #[error("transform is not affine: last row must be [0, 0, 0, 1]")]
    NotAffine,
    #[error("non-finite value in {what}")]
    NonFinite { what: &'static str },
}

/// Identity of a boundary loop. Two loops built from identical data are still distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(u64);

static NEXT_LOOP_ID: AtomicU64 = AtomicU64::new(1);

impl LoopId {
    fn next() -> Self {
        Self(NEXT_LOOP_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Index of an arc curve within its owning loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurveId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    /// Set when the edge is one tessellated piece of an arc curve.
    pub curve: Option<CurveId>,
}

impl Edge {
    #[must_use]
    pub fn line(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self {
            start,
            end,
            curve: None,
        }
    }
}

/// A circular arc in 3-D. Angles are radians measured from `xaxis` towards
/// `normal x xaxis`; the arc runs from `start_angle` to `end_angle`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcCurve {
    pub center: Point3<f64>,
    pub xaxis: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl ArcCurve {
    /// Arc lying in the XY plane, counter-clockwise seen from +Z.
    #[must_use]
    pub fn planar(center: (f64, f64), radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center: Point3::new(center.0, center.1, 0.0),
            xaxis: Vector3::x(),
            normal: Vector3::z(),
            radius,
            start_angle,
            end_angle,
        }
    }

    #[must_use]
    pub fn yaxis(&self) -> Vector3<f64> {
        self.normal.cross(&self.xaxis)
    }

    #[must_use]
    pub fn point_at(&self, angle: f64) -> Point3<f64> {
        let (s, c) = angle.sin_cos();
        self.center + (self.xaxis * c + self.yaxis() * s) * self.radius
    }

    #[must_use]
    pub fn start_point(&self) -> Point3<f64> {
        self.point_at(self.start_angle)
    }

    #[must_use]
    pub fn end_point(&self) -> Point3<f64> {
        self.point_at(self.end_angle)
    }

    fn validated(mut self, curve: usize) -> Result<Self, GeometryError> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(GeometryError::InvalidRadius {
                curve,
                radius: self.radius,
            });
        }
        if !(self.start_angle.is_finite() && self.end_angle.is_finite()) {
            return Err(GeometryError::NonFinite { what: "arc angle" });
        }
        let normal = self
            .normal
            .try_normalize(EPS)
            .ok_or(GeometryError::DegenerateAxes { curve })?;
        // Project the x axis into the arc plane so the frame is orthonormal.
        let xaxis = (self.xaxis - normal * self.xaxis.dot(&normal))
            .try_normalize(EPS)
            .ok_or(GeometryError::DegenerateAxes { curve })?;
        self.normal = normal;
        self.xaxis = xaxis;
        Ok(self)
    }
}

/// An ordered, cyclic sequence of edges bounding one planar face.
#[derive(Debug)]
pub struct BoundaryLoop {
    id: LoopId,
    edges: Vec<Edge>,
    curves: Vec<ArcCurve>,
}

impl BoundaryLoop {
    pub fn new(edges: Vec<Edge>, curves: Vec<ArcCurve>) -> Result<Self, GeometryError> {
        let curves = curves
            .into_iter()
            .enumerate()
            .map(|(idx, c)| c.validated(idx))
            .collect::<Result<Vec<_>, _>>()?;

        for (idx, edge) in edges.iter().enumerate() {
            if !(is_finite(edge.start) && is_finite(edge.end)) {
                return Err(GeometryError::NonFinite { what: "edge vertex" });
            }
            if let Some(CurveId(curve)) = edge.curve {
                if curve >= curves.len() {
                    return Err(GeometryError::UnknownCurve { edge: idx, curve });
                }
            }
        }

        Ok(Self {
            id: LoopId::next(),
            edges,
            curves,
        })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: LoopId::next(),
            edges: Vec::new(),
            curves: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> LoopId {
        self.id
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn curves(&self) -> &[ArcCurve] {
        &self.curves
    }

    #[must_use]
    pub fn curve(&self, id: CurveId) -> Option<&ArcCurve> {
        self.curves.get(id.0)
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.edges.len()
    }

    /// Loop vertices in loop order (the start of each edge).
    pub fn vertices(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.edges.iter().map(|e| e.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

fn is_finite(p: Point3<f64>) -> bool {
    p.coords.iter().all(|v| v.is_finite())
}

/// Incrementally builds a closed loop, tessellating arcs into edges that share one curve.
#[derive(Debug)]
pub struct LoopBuilder {
    first: Point3<f64>,
    cursor: Point3<f64>,
    edges: Vec<Edge>,
    curves: Vec<ArcCurve>,
}

impl LoopBuilder {
    #[must_use]
    pub fn new(start: Point3<f64>) -> Self {
        Self {
            first: start,
            cursor: start,
            edges: Vec::new(),
            curves: Vec::new(),
        }
    }

    #[must_use]
    pub fn line_to(mut self, to: Point3<f64>) -> Self {
        if (to - self.cursor).norm() > EPS {
            self.edges.push(Edge::line(self.cursor, to));
        }
        self.cursor = to;
        self
    }

    /// Append `curve` split into `segments` edges. A connecting line is inserted when the
    /// cursor is not already at the arc start.
    #[must_use]
    pub fn arc(mut self, curve: ArcCurve, segments: usize) -> Self {
        let segments = segments.max(1);
        self = self.line_to(curve.start_point());

        let id = CurveId(self.curves.len());
        let step = (curve.end_angle - curve.start_angle) / segments as f64;
        for i in 1..=segments {
            let to = curve.point_at(curve.start_angle + step * i as f64);
            self.edges.push(Edge {
                start: self.cursor,
                end: to,
                curve: Some(id),
            });
            self.cursor = to;
        }
        self.curves.push(curve);
        self
    }

    pub fn close(self) -> Result<BoundaryLoop, GeometryError> {
        let first = self.first;
        let closed = self.line_to(first);
        BoundaryLoop::new(closed.edges, closed.curves)
    }
}
