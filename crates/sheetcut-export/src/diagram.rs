//! Read-only result of the nesting stage, in pixel space (origin top-left, Y down).

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use sheetcut_geometry::ContourManipulator;

use crate::config::LabelSource;
use crate::sanitize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialGroup {
    pub material_display_name: String,
    pub std_dimension: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedPart {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
    pub px_x: f64,
    pub px_y: f64,
    pub px_length: f64,
    pub px_width: f64,
    #[serde(default)]
    pub rotated: bool,
    /// Where the contour's local origin sits inside the bounding box.
    #[serde(default)]
    pub px_pivot: [f64; 2],
}

impl PlacedPart {
    #[must_use]
    pub fn origin(&self) -> Point2<f64> {
        Point2::new(self.px_x, self.px_y)
    }

    #[must_use]
    pub fn size(&self) -> Vector2<f64> {
        Vector2::new(self.px_length, self.px_width)
    }

    #[must_use]
    pub fn pivot(&self) -> Point2<f64> {
        Point2::new(self.px_x + self.px_pivot[0], self.px_y + self.px_pivot[1])
    }

    #[must_use]
    pub fn label(&self, source: LabelSource) -> &str {
        match source {
            LabelSource::Name => &self.name,
            LabelSource::Number => &self.number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leftover {
    pub px_x: f64,
    pub px_y: f64,
    pub px_length: f64,
    pub px_width: f64,
    pub length: String,
    pub width: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    pub px_x: f64,
    pub px_y: f64,
    pub px_length: f64,
    #[serde(default)]
    pub is_horizontal: bool,
}

impl Cut {
    #[must_use]
    pub fn start(&self) -> Point2<f64> {
        Point2::new(self.px_x, self.px_y)
    }

    #[must_use]
    pub fn end(&self) -> Point2<f64> {
        if self.is_horizontal {
            Point2::new(self.px_x + self.px_length, self.px_y)
        } else {
            Point2::new(self.px_x, self.px_y + self.px_length)
        }
    }
}

/// Identical sheets collapsed into one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetGroup {
    /// Physical display strings, used for labels.
    pub length: String,
    pub width: String,
    pub px_length: f64,
    pub px_width: f64,
    #[serde(default = "one")]
    pub count: usize,
    #[serde(default)]
    pub parts: Vec<PlacedPart>,
    #[serde(default)]
    pub leftovers: Vec<Leftover>,
    #[serde(default)]
    pub cuts: Vec<Cut>,
}

fn one() -> usize {
    1
}

#[derive(Debug, Default)]
pub struct CuttingDiagram {
    /// Set when the layout no longer matches the model.
    pub obsolete: bool,
    pub group: Option<MaterialGroup>,
    pub sheets: Vec<SheetGroup>,
    /// Precomputed contours keyed by part id. Parts without one export as rectangles.
    pub projections: HashMap<String, Arc<ContourManipulator>>,
}

impl CuttingDiagram {
    #[must_use]
    pub fn projection(&self, part_id: &str) -> Option<&ContourManipulator> {
        self.projections.get(part_id).map(Arc::as_ref)
    }

    /// Export folder name derived from the material group.
    #[must_use]
    pub fn folder_name(&self) -> Option<String> {
        self.group.as_ref().map(|g| {
            sanitize::filename(&format!("{} - {}", g.material_display_name, g.std_dimension))
        })
    }
}
