//! Format-independent rendering of one sheet group.

use std::io::{self, Write};

use nalgebra::{Affine2, Point2, Vector2};
use sheetcut_geometry::transform::{quarter_turn_about, translation};
use sheetcut_geometry::{Primitive, Segment};
use tracing::debug;

use crate::config::{FileFormat, Layer, RenderConfig};
use crate::diagram::{Cut, CuttingDiagram, PlacedPart, SheetGroup};
use crate::dxf::DxfSheetWriter;
use crate::sheet::{Rect, SheetWriter};
use crate::svg::SvgSheetWriter;
use crate::units::{fmt_num, LengthUnit, UnitTransform};

/// Render `sheet` in `config.file_format` to `out`.
///
/// `unit` is the model unit; SVG output narrows it to a unit SVG understands.
pub fn render_sheet<W: Write>(
    out: W,
    diagram: &CuttingDiagram,
    sheet: &SheetGroup,
    config: &RenderConfig,
    unit: LengthUnit,
) -> io::Result<()> {
    match config.file_format {
        FileFormat::Dxf => {
            let unit_transform = UnitTransform::y_up(unit, sheet.px_width);
            let mut writer = DxfSheetWriter::new(out, config, unit);
            draw_sheet(&mut writer, diagram, sheet, config, &unit_transform)
        }
        FileFormat::Svg => {
            let unit = unit.svg_unit();
            let unit_transform = UnitTransform::y_down(unit);
            let mut writer = SvgSheetWriter::new(out, config, unit);
            draw_sheet(&mut writer, diagram, sheet, config, &unit_transform)
        }
        other => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("cannot render sheets as {other}"),
        )),
    }
}

/// Drive `writer` through one sheet: sheet outline, parts, leftovers, then cuts.
pub fn draw_sheet(
    writer: &mut dyn SheetWriter,
    diagram: &CuttingDiagram,
    sheet: &SheetGroup,
    config: &RenderConfig,
    unit_transform: &UnitTransform,
) -> io::Result<()> {
    let layers = config.visible_layers();
    writer.begin(
        unit_transform.length(sheet.px_length),
        unit_transform.length(sheet.px_width),
        &layers,
    )?;

    for &layer in &layers {
        writer.begin_layer(layer)?;
        match layer {
            Layer::Sheet => {
                let rect = unit_transform.rect(
                    Point2::origin(),
                    Vector2::new(sheet.px_length, sheet.px_width),
                );
                writer.rect(layer, rect, &format!("{} x {}", sheet.length, sheet.width))?;
            }
            Layer::Parts => {
                for part in &sheet.parts {
                    draw_part(writer, diagram, part, config, unit_transform)?;
                }
            }
            Layer::Leftovers => {
                for leftover in &sheet.leftovers {
                    let rect = unit_transform.rect(
                        Point2::new(leftover.px_x, leftover.px_y),
                        Vector2::new(leftover.px_length, leftover.px_width),
                    );
                    let label = format!("{} x {}", leftover.length, leftover.width);
                    writer.rect(layer, rect, &label)?;
                }
            }
            Layer::Cuts => {
                for cut in &sheet.cuts {
                    draw_cut(writer, cut, unit_transform)?;
                }
            }
        }
        writer.end_layer(layer)?;
    }

    writer.finish()
}

fn draw_part(
    writer: &mut dyn SheetWriter,
    diagram: &CuttingDiagram,
    part: &PlacedPart,
    config: &RenderConfig,
    unit_transform: &UnitTransform,
) -> io::Result<()> {
    let label = part.label(config.label_source);
    let contour = diagram
        .projection(&part.id)
        .filter(|contour| !contour.primitives().is_empty());

    match contour {
        Some(contour) => {
            let t = part_transform(part, unit_transform);
            let primitives: Vec<Primitive> =
                contour.primitives().iter().map(|p| p.transformed(&t)).collect();
            writer.outline(Layer::Parts, &primitives, label)
        }
        None => writer.rect(Layer::Parts, part_rect(part, unit_transform), label),
    }
}

fn draw_cut(
    writer: &mut dyn SheetWriter,
    cut: &Cut,
    unit_transform: &UnitTransform,
) -> io::Result<()> {
    if cut.px_length <= 0.0 {
        debug!(x = cut.px_x, y = cut.px_y, "skipping zero-length cut");
        return Ok(());
    }
    let segment = Segment::new(unit_transform.point(cut.start()), unit_transform.point(cut.end()));
    let label = if cut.is_horizontal {
        format!("y = {}", fmt_num(segment.start.y))
    } else {
        format!("x = {}", fmt_num(segment.start.x))
    };
    writer.line(Layer::Cuts, segment, &label)
}

/// Bounding box of a placed part in file coordinates.
#[must_use]
pub fn part_rect(part: &PlacedPart, unit_transform: &UnitTransform) -> Rect {
    unit_transform.rect(part.origin(), part.size())
}

/// Contour-local coordinates to file coordinates for `part`: translate the local origin
/// to the pivot, quarter turn about the pivot when rotated, then the sheet's unit transform.
#[must_use]
pub fn part_transform(part: &PlacedPart, unit_transform: &UnitTransform) -> Affine2<f64> {
    let pivot = part.pivot();
    let placed = translation(pivot.coords);
    let placed = if part.rotated {
        quarter_turn_about(pivot) * placed
    } else {
        placed
    };
    unit_transform.affine() * placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn part(rotated: bool) -> PlacedPart {
        PlacedPart {
            id: "p".into(),
            name: String::new(),
            number: "1".into(),
            px_x: 14.0,
            px_y: 21.0,
            px_length: 70.0,
            px_width: 35.0,
            rotated,
            px_pivot: if rotated { [70.0, 0.0] } else { [0.0, 0.0] },
        }
    }

    #[test]
    fn unrotated_contour_origin_lands_on_part_corner() {
        let ut = UnitTransform::y_down(LengthUnit::Inches);
        let t = part_transform(&part(false), &ut);
        let p = t.transform_point(&Point2::origin());
        assert_abs_diff_eq!(p.x, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn rotated_contour_fills_the_placed_box() {
        let ut = UnitTransform::y_down(LengthUnit::Inches);
        let p = part(true);
        let t = part_transform(&p, &ut);
        // Local extent before the quarter turn is width x length.
        let a = t.transform_point(&Point2::origin());
        let b = t.transform_point(&Point2::new(35.0, 70.0));
        let r = Rect::spanning(a, b);
        let expected = part_rect(&p, &ut);
        assert_abs_diff_eq!(r.x, expected.x, epsilon = 1e-12);
        assert_abs_diff_eq!(r.y, expected.y, epsilon = 1e-12);
        assert_abs_diff_eq!(r.width, expected.width, epsilon = 1e-12);
        assert_abs_diff_eq!(r.height, expected.height, epsilon = 1e-12);
    }
}
