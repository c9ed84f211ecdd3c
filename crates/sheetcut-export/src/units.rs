//! Physical units and the per-sheet transform from pixel space to file coordinates.

use std::fmt;
use std::str::FromStr;

use nalgebra::{Affine2, Point2, Vector2};
use serde::{Deserialize, Serialize};
use sheetcut_geometry::transform::scale_with_flip;

use crate::error::ConfigError;
use crate::sheet::Rect;

/// Pixels per physical inch in the layout coordinate space.
pub const PX_PER_INCH: f64 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[serde(rename = "in")]
    Inches,
    #[serde(rename = "ft")]
    Feet,
    #[default]
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "m")]
    Meters,
}

impl LengthUnit {
    #[must_use]
    pub fn per_inch(self) -> f64 {
        match self {
            Self::Inches => 1.0,
            Self::Feet => 1.0 / 12.0,
            Self::Millimeters => 25.4,
            Self::Centimeters => 2.54,
            Self::Meters => 0.0254,
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Inches => "in",
            Self::Feet => "ft",
            Self::Millimeters => "mm",
            Self::Centimeters => "cm",
            Self::Meters => "m",
        }
    }

    /// `$INSUNITS` header value.
    #[must_use]
    pub fn dxf_insunits(self) -> u8 {
        match self {
            Self::Inches => 1,
            Self::Feet => 2,
            Self::Millimeters => 4,
            Self::Centimeters => 5,
            Self::Meters => 6,
        }
    }

    /// SVG lengths only use `in`, `cm` and `mm`.
    #[must_use]
    pub fn svg_unit(self) -> Self {
        match self {
            Self::Inches | Self::Centimeters | Self::Millimeters => self,
            Self::Feet | Self::Meters => Self::Millimeters,
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for LengthUnit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in" | "inch" | "inches" => Ok(Self::Inches),
            "ft" | "foot" | "feet" => Ok(Self::Feet),
            "mm" | "millimeter" | "millimeters" => Ok(Self::Millimeters),
            "cm" | "centimeter" | "centimeters" => Ok(Self::Centimeters),
            "m" | "meter" | "meters" => Ok(Self::Meters),
            _ => Err(ConfigError::UnknownName {
                what: "length unit",
                value: s.to_string(),
            }),
        }
    }
}

/// Source of the model's active length unit.
pub trait UnitProvider {
    fn length_unit(&self) -> LengthUnit;
}

impl UnitProvider for LengthUnit {
    fn length_unit(&self) -> LengthUnit {
        *self
    }
}

/// Pixel space to file space for one sheet: a uniform scale, optionally preceded by a
/// vertical flip about the sheet height for formats whose Y axis points up.
#[derive(Debug, Clone, Copy)]
pub struct UnitTransform {
    affine: Affine2<f64>,
    scale: f64,
    unit: LengthUnit,
}

impl UnitTransform {
    /// Bottom-left origin, Y up: `y' = (sheet_height - y) * scale`.
    #[must_use]
    pub fn y_up(unit: LengthUnit, sheet_px_height: f64) -> Self {
        let scale = unit.per_inch() / PX_PER_INCH;
        Self {
            affine: scale_with_flip(scale, Some(sheet_px_height)),
            scale,
            unit,
        }
    }

    /// Top-left origin, Y down: scale only.
    #[must_use]
    pub fn y_down(unit: LengthUnit) -> Self {
        let scale = unit.per_inch() / PX_PER_INCH;
        Self {
            affine: scale_with_flip(scale, None),
            scale,
            unit,
        }
    }

    #[must_use]
    pub fn affine(&self) -> Affine2<f64> {
        self.affine
    }

    #[must_use]
    pub fn unit(&self) -> LengthUnit {
        self.unit
    }

    #[must_use]
    pub fn point(&self, p: Point2<f64>) -> Point2<f64> {
        self.affine.transform_point(&p)
    }

    #[must_use]
    pub fn length(&self, px: f64) -> f64 {
        px * self.scale
    }

    /// Image of a pixel-space rectangle, normalized to a positive size.
    #[must_use]
    pub fn rect(&self, origin: Point2<f64>, size: Vector2<f64>) -> Rect {
        Rect::spanning(self.point(origin), self.point(origin + size))
    }
}

/// Round to the 6 decimals written to files.
#[must_use]
pub fn round6(v: f64) -> f64 {
    let r = (v * 1e6).round() / 1e6;
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

/// Shortest decimal text for a rounded coordinate, without a trailing `.0`.
#[must_use]
pub fn fmt_num(v: f64) -> String {
    let v = round6(v);
    let mut buf = ryu::Buffer::new();
    let s = buf.format(v);
    s.strip_suffix(".0").unwrap_or(s).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn y_up_flips_about_sheet_height() {
        let t = UnitTransform::y_up(LengthUnit::Inches, 500.0);
        let p = t.point(Point2::new(70.0, 0.0));
        assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 500.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn y_down_only_scales() {
        let t = UnitTransform::y_down(LengthUnit::Millimeters);
        let p = t.point(Point2::new(7.0, 14.0));
        assert_abs_diff_eq!(p.x, 25.4, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 50.8, epsilon = 1e-12);
    }

    #[test]
    fn flipped_rect_is_normalized() {
        let t = UnitTransform::y_up(LengthUnit::Inches, 500.0);
        let r = t.rect(Point2::new(10.0, 10.0), Vector2::new(100.0, 50.0));
        assert_abs_diff_eq!(r.x, 10.0 / 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.y, 440.0 / 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.width, 100.0 / 7.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.height, 50.0 / 7.0, epsilon = 1e-12);
    }

    #[test]
    fn svg_units_fall_back_to_millimeters() {
        assert_eq!(LengthUnit::Feet.svg_unit(), LengthUnit::Millimeters);
        assert_eq!(LengthUnit::Meters.svg_unit(), LengthUnit::Millimeters);
        assert_eq!(LengthUnit::Centimeters.svg_unit(), LengthUnit::Centimeters);
        assert_eq!(LengthUnit::Inches.svg_unit(), LengthUnit::Inches);
    }

    #[test]
    fn numbers_are_rounded_to_six_decimals() {
        assert_eq!(fmt_num(440.0 / 7.0), "62.857143");
        assert_eq!(fmt_num(12.0), "12");
        assert_eq!(fmt_num(-0.0000001), "0");
        assert_eq!(fmt_num(0.5), "0.5");
    }

    #[test]
    fn unit_names_parse() {
        assert_eq!("in".parse::<LengthUnit>().unwrap(), LengthUnit::Inches);
        assert_eq!("Meters".parse::<LengthUnit>().unwrap(), LengthUnit::Meters);
        assert!("yd".parse::<LengthUnit>().is_err());
    }
}
