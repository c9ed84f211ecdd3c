//! 2-D contour of a boundary loop seen through a placement transform.
//!
//! Derived collections are computed on first access and kept for the lifetime of the
//! manipulator. A manipulator never changes its loop or transform: build a new one
//! instead of resetting.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use nalgebra::{Affine3, Point2};

use crate::transform::{is_flipped, project, project_vector};
use crate::{ArcCurve, ArcPrimitive, BoundaryLoop, CurveId, Edge, LoopId, Primitive, Segment};

#[derive(Debug)]
pub struct ContourManipulator {
    boundary: Arc<BoundaryLoop>,
    transform: Affine3<f64>,
    points: OnceLock<Vec<Point2<f64>>>,
    segments: OnceLock<Vec<Segment>>,
    primitives: OnceLock<Vec<Primitive>>,
}

impl ContourManipulator {
    #[must_use]
    pub fn new(boundary: Arc<BoundaryLoop>, transform: Affine3<f64>) -> Self {
        Self {
            boundary,
            transform,
            points: OnceLock::new(),
            segments: OnceLock::new(),
            primitives: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn boundary(&self) -> &Arc<BoundaryLoop> {
        &self.boundary
    }

    #[must_use]
    pub fn transform(&self) -> &Affine3<f64> {
        &self.transform
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        is_flipped(&self.transform)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boundary.is_empty()
    }

    /// Transformed loop vertices. Reversed under a mirroring transform so the winding
    /// seen by consumers does not depend on how the part was flipped.
    pub fn points(&self) -> &[Point2<f64>] {
        self.points.get_or_init(|| {
            let mut points: Vec<Point2<f64>> = self
                .boundary
                .vertices()
                .map(|v| project(self.transform.transform_point(&v)))
                .collect();
            if self.is_flipped() {
                points.reverse();
            }
            points
        })
    }

    /// One transformed segment per edge, in loop order.
    pub fn segments(&self) -> &[Segment] {
        self.segments.get_or_init(|| {
            self.boundary
                .edges()
                .iter()
                .map(|e| self.edge_segment(e))
                .collect()
        })
    }

    /// Minimal line/arc description of the loop. Every edge that belongs to an arc curve
    /// is folded into a single arc primitive emitted at the curve's first occurrence.
    pub fn primitives(&self) -> &[Primitive] {
        self.primitives.get_or_init(|| {
            let mut emitted: HashSet<CurveId> = HashSet::new();
            let mut out: Vec<Primitive> = Vec::new();

            for edge in self.boundary.edges() {
                let curve = edge
                    .curve
                    .and_then(|id| self.boundary.curve(id).map(|c| (id, c)));
                match curve {
                    Some((id, curve)) => {
                        if emitted.insert(id) {
                            out.push(Primitive::Arc {
                                arc: self.arc_primitive(curve),
                                curve: id,
                            });
                        }
                    }
                    None => out.push(Primitive::Line(self.edge_segment(edge))),
                }
            }

            out
        })
    }

    fn edge_segment(&self, edge: &Edge) -> Segment {
        Segment::new(
            project(self.transform.transform_point(&edge.start)),
            project(self.transform.transform_point(&edge.end)),
        )
    }

    fn arc_primitive(&self, curve: &ArcCurve) -> ArcPrimitive {
        let center = project(self.transform.transform_point(&curve.center));
        let ux = project_vector(self.transform.transform_vector(&(curve.xaxis * curve.radius)));
        let uy = project_vector(
            self.transform
                .transform_vector(&(curve.yaxis() * curve.radius)),
        );
        // A curve may run clockwise in its own frame; the swept region is the same either way.
        let (from, to) = if curve.end_angle < curve.start_angle {
            (curve.end_angle, curve.start_angle)
        } else {
            (curve.start_angle, curve.end_angle)
        };
        ArcPrimitive::from_frame(center, ux, uy, from, to)
    }
}

impl PartialEq for ContourManipulator {
    fn eq(&self, other: &Self) -> bool {
        self.boundary.id() == other.boundary.id() && self.transform == other.transform
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TransformKey([u64; 16]);

impl TransformKey {
    fn of(t: &Affine3<f64>) -> Self {
        let mut bits = [0u64; 16];
        for (slot, v) in bits.iter_mut().zip(t.matrix().iter()) {
            // -0.0 and 0.0 describe the same transform.
            *slot = if *v == 0.0 { 0 } else { v.to_bits() };
        }
        Self(bits)
    }
}

/// Memoizes manipulators by (loop identity, transform).
#[derive(Debug, Default)]
pub struct ContourCache {
    entries: HashMap<(LoopId, TransformKey), Arc<ContourManipulator>>,
}

impl ContourCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(
        &mut self,
        boundary: &Arc<BoundaryLoop>,
        transform: Affine3<f64>,
    ) -> Arc<ContourManipulator> {
        let key = (boundary.id(), TransformKey::of(&transform));
        self.entries
            .entry(key)
            .or_insert_with(|| Arc::new(ContourManipulator::new(Arc::clone(boundary), transform)))
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{rectangle, rounded_rectangle};
    use crate::transform::affine_from_rows;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;

    fn mirror_x() -> Affine3<f64> {
        affine_from_rows([
            -1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ])
        .unwrap()
    }

    #[test]
    fn empty_loop_yields_empty_collections() {
        let c = ContourManipulator::new(Arc::new(BoundaryLoop::empty()), Affine3::identity());
        assert!(c.points().is_empty());
        assert!(c.segments().is_empty());
        assert!(c.primitives().is_empty());
    }

    #[test]
    fn points_follow_loop_order_without_mirror() {
        let lp = Arc::new(rectangle((0.0, 0.0), (4.0, 2.0)).unwrap());
        let c = ContourManipulator::new(lp, Affine3::identity());
        assert_eq!(
            c.points(),
            &[
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 2.0),
                Point2::new(0.0, 2.0),
            ]
        );
    }

    #[test]
    fn mirrored_points_are_reversed() {
        let lp = Arc::new(rectangle((0.0, 0.0), (4.0, 2.0)).unwrap());
        let c = ContourManipulator::new(lp, mirror_x());
        assert!(c.is_flipped());
        assert_eq!(
            c.points(),
            &[
                Point2::new(0.0, 2.0),
                Point2::new(-4.0, 2.0),
                Point2::new(-4.0, 0.0),
                Point2::new(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn tessellated_corners_merge_into_one_arc_each() {
        let lp = Arc::new(rounded_rectangle((0.0, 0.0), (10.0, 6.0), 1.0, 8).unwrap());
        let c = ContourManipulator::new(Arc::clone(&lp), Affine3::identity());

        assert_eq!(lp.vertex_count(), 4 + 4 * 8);
        assert_eq!(c.segments().len(), lp.vertex_count());
        assert_eq!(c.primitives().len(), 8);

        let arcs: Vec<_> = c
            .primitives()
            .iter()
            .filter_map(|p| match p {
                Primitive::Arc { arc, .. } => Some(*arc),
                Primitive::Line(_) => None,
            })
            .collect();
        assert_eq!(arcs.len(), 4);
        for arc in arcs {
            assert_abs_diff_eq!(arc.radius, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(arc.sweep(), std::f64::consts::FRAC_PI_2, epsilon = 1e-12);
        }
    }

    #[test]
    fn equality_is_loop_identity_and_transform() {
        let lp = Arc::new(rectangle((0.0, 0.0), (1.0, 1.0)).unwrap());
        let twin = Arc::new(rectangle((0.0, 0.0), (1.0, 1.0)).unwrap());
        let a = ContourManipulator::new(Arc::clone(&lp), Affine3::identity());
        let b = ContourManipulator::new(Arc::clone(&lp), Affine3::identity());
        let c = ContourManipulator::new(twin, Affine3::identity());
        let d = ContourManipulator::new(lp, mirror_x());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn clockwise_curve_keeps_the_tessellated_side() {
        // Upper half circle walked from angle pi down to 0.
        let curve = ArcCurve::planar((1.0, 0.0), 1.0, std::f64::consts::PI, 0.0);
        let lp = Arc::new(
            crate::LoopBuilder::new(Point3::origin())
                .arc(curve, 4)
                .close()
                .unwrap(),
        );
        // End of the second of four pieces.
        let tessellated_mid = project(lp.edges()[1].end);
        assert_abs_diff_eq!(tessellated_mid.y, 1.0, epsilon = 1e-12);

        for transform in [Affine3::identity(), mirror_x()] {
            let c = ContourManipulator::new(Arc::clone(&lp), transform);
            let Primitive::Arc { arc, .. } = c.primitives()[0] else {
                panic!("expected an arc first, got {:?}", c.primitives());
            };
            let expected = project(transform.transform_point(&lp.edges()[1].end));
            let mid = arc.point_at(arc.start_angle + arc.sweep() / 2.0);
            assert_abs_diff_eq!(arc.sweep(), std::f64::consts::PI, epsilon = 1e-12);
            assert_abs_diff_eq!(mid.x, expected.x, epsilon = 1e-9);
            assert_abs_diff_eq!(mid.y, expected.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn cache_shares_manipulators_per_loop_and_transform() {
        let lp = Arc::new(rectangle((0.0, 0.0), (1.0, 1.0)).unwrap());
        let mut cache = ContourCache::new();
        let a = cache.get_or_insert(&lp, Affine3::identity());
        let b = cache.get_or_insert(&lp, Affine3::identity());
        let c = cache.get_or_insert(&lp, mirror_x());
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cache.len(), 2);
    }
}
