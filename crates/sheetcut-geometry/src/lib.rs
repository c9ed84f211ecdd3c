//! Planar boundary extraction: boundary loops, arc curves and their cached 2-D contours.

pub mod boundary;
pub mod contour;
pub mod primitives;
pub mod shapes;
pub mod transform;

pub use boundary::{ArcCurve, BoundaryLoop, CurveId, Edge, GeometryError, LoopBuilder, LoopId};
pub use contour::{ContourCache, ContourManipulator};
pub use nalgebra::{Affine2, Affine3, Point2, Point3, Vector2, Vector3};
pub use primitives::{ArcPrimitive, Primitive, Segment};
