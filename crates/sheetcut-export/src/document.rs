//! Serialized cutting diagram: sheet layout plus named boundary loops and per-part
//! projections, as produced by a nesting run.
//!
//! ```yaml
//! group: { material_display_name: Plywood, std_dimension: 2440 x 1220 }
//! loops:
//!   tabletop: { shape: rounded_rectangle, size: [700, 350], radius: 35 }
//! projections:
//!   top: { loop: tabletop }
//! sheets:
//!   - { length: 2440mm, width: 1220mm, px_length: 672.4, px_width: 336.2, parts: [...] }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use nalgebra::{Affine3, Point3, Vector3};
use serde::{Deserialize, Serialize};
use sheetcut_geometry::shapes::{circle, polygon, rectangle, rounded_rectangle};
use sheetcut_geometry::transform::affine_from_rows;
use sheetcut_geometry::{ArcCurve, BoundaryLoop, ContourCache, CurveId, Edge, GeometryError};
use tracing::debug;

use crate::diagram::{CuttingDiagram, MaterialGroup, SheetGroup};
use crate::error::DocumentError;

fn default_segments() -> usize {
    8
}

fn x_axis() -> [f64; 3] {
    [1.0, 0.0, 0.0]
}

fn z_axis() -> [f64; 3] {
    [0.0, 0.0, 1.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub start: [f64; 3],
    pub end: [f64; 3],
    /// Index into the loop's `curves`.
    #[serde(default)]
    pub curve: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSpec {
    pub center: [f64; 3],
    #[serde(default = "x_axis")]
    pub xaxis: [f64; 3],
    #[serde(default = "z_axis")]
    pub normal: [f64; 3],
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

/// A boundary loop, either spelled out edge by edge or generated from a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum LoopSpec {
    Edges {
        edges: Vec<EdgeSpec>,
        #[serde(default)]
        curves: Vec<CurveSpec>,
    },
    Rectangle {
        #[serde(default)]
        origin: [f64; 2],
        size: [f64; 2],
    },
    RoundedRectangle {
        #[serde(default)]
        origin: [f64; 2],
        size: [f64; 2],
        radius: f64,
        #[serde(default = "default_segments")]
        segments: usize,
    },
    Circle {
        center: [f64; 2],
        radius: f64,
        #[serde(default = "default_segments")]
        segments: usize,
    },
    Polygon {
        points: Vec<[f64; 2]>,
    },
}

impl LoopSpec {
    pub fn build(&self) -> Result<BoundaryLoop, GeometryError> {
        let point = |v: &[f64; 3]| Point3::new(v[0], v[1], v[2]);
        let vector = |v: &[f64; 3]| Vector3::new(v[0], v[1], v[2]);
        match self {
            Self::Edges { edges, curves } => {
                let curves = curves
                    .iter()
                    .map(|c| ArcCurve {
                        center: point(&c.center),
                        xaxis: vector(&c.xaxis),
                        normal: vector(&c.normal),
                        radius: c.radius,
                        start_angle: c.start_angle,
                        end_angle: c.end_angle,
                    })
                    .collect();
                let edges = edges
                    .iter()
                    .map(|e| Edge {
                        start: point(&e.start),
                        end: point(&e.end),
                        curve: e.curve.map(CurveId),
                    })
                    .collect();
                BoundaryLoop::new(edges, curves)
            }
            Self::Rectangle { origin, size } => {
                rectangle((origin[0], origin[1]), (size[0], size[1]))
            }
            Self::RoundedRectangle {
                origin,
                size,
                radius,
                segments,
            } => rounded_rectangle(
                (origin[0], origin[1]),
                (size[0], size[1]),
                *radius,
                *segments,
            ),
            Self::Circle {
                center,
                radius,
                segments,
            } => circle((center[0], center[1]), *radius, *segments),
            Self::Polygon { points } => {
                let vertices: Vec<(f64, f64)> = points.iter().map(|p| (p[0], p[1])).collect();
                polygon(&vertices)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSpec {
    #[serde(rename = "loop")]
    pub boundary: String,
    /// Row-major 4x4 affine transform; identity when absent.
    #[serde(default)]
    pub transform: Option<[f64; 16]>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default)]
    pub group: Option<MaterialGroup>,
    #[serde(default)]
    pub sheets: Vec<SheetGroup>,
    #[serde(default)]
    pub loops: IndexMap<String, LoopSpec>,
    /// Keyed by part id.
    #[serde(default)]
    pub projections: IndexMap<String, ProjectionSpec>,
}

impl DiagramDocument {
    pub fn from_yaml_str(input: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let text = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    /// Build the loops and resolve every projection. Parts sharing a loop and a
    /// transform share one contour.
    pub fn into_diagram(self) -> Result<CuttingDiagram, DocumentError> {
        let mut loops: HashMap<String, Arc<BoundaryLoop>> = HashMap::with_capacity(self.loops.len());
        for (name, spec) in &self.loops {
            let boundary = spec.build().map_err(|source| DocumentError::Geometry {
                name: name.clone(),
                source,
            })?;
            loops.insert(name.clone(), Arc::new(boundary));
        }

        let mut cache = ContourCache::new();
        let mut projections = HashMap::with_capacity(self.projections.len());
        for (part, projection) in self.projections {
            let boundary = loops
                .get(&projection.boundary)
                .ok_or_else(|| DocumentError::UnknownLoop {
                    part: part.clone(),
                    name: projection.boundary.clone(),
                })?;
            let transform = match projection.transform {
                Some(rows) => affine_from_rows(rows).map_err(|source| DocumentError::Geometry {
                    name: projection.boundary.clone(),
                    source,
                })?,
                None => Affine3::identity(),
            };
            projections.insert(part, cache.get_or_insert(boundary, transform));
        }
        debug!(
            loops = loops.len(),
            contours = cache.len(),
            projections = projections.len(),
            "diagram built"
        );

        Ok(CuttingDiagram {
            obsolete: self.obsolete,
            group: self.group,
            sheets: self.sheets,
            projections,
        })
    }
}
