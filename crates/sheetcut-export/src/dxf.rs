//! ASCII DXF output for sheets, and a small reader for the entities we write.

use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use nalgebra::Point2;
use sheetcut_geometry::{ArcPrimitive, Primitive, Segment};
use tracing::debug;

use crate::config::{Layer, RenderConfig};
use crate::sanitize;
use crate::sheet::{Rect, SheetWriter, CHORD_STEP};
use crate::units::{fmt_num, LengthUnit};

/// Writes one sheet as an AutoCAD 2000 DXF with one layer per visible drawing layer.
pub struct DxfSheetWriter<'a, W: Write> {
    out: W,
    config: &'a RenderConfig,
    unit: LengthUnit,
}

impl<'a, W: Write> DxfSheetWriter<'a, W> {
    pub fn new(out: W, config: &'a RenderConfig, unit: LengthUnit) -> Self {
        Self { out, config, unit }
    }

    fn pair(&mut self, code: i32, value: impl Display) -> io::Result<()> {
        writeln!(self.out, "{code}")?;
        writeln!(self.out, "{value}")
    }

    fn pair_f64(&mut self, code: i32, value: f64) -> io::Result<()> {
        self.pair(code, fmt_num(value))
    }

    fn point(&mut self, code: i32, p: Point2<f64>) -> io::Result<()> {
        self.pair_f64(code, p.x)?;
        self.pair_f64(code + 10, p.y)
    }

    fn comment(&mut self, label: &str) -> io::Result<()> {
        self.pair(999, sanitize::dxf_comment(label))
    }

    fn entity(&mut self, kind: &str, layer: Layer) -> io::Result<()> {
        self.pair(0, kind)?;
        self.pair(8, layer.name())
    }

    fn line_entity(&mut self, layer: Layer, a: Point2<f64>, b: Point2<f64>) -> io::Result<()> {
        self.entity("LINE", layer)?;
        self.point(10, a)?;
        self.point(11, b)
    }

    fn arc_entity(&mut self, layer: Layer, arc: &ArcPrimitive) -> io::Result<()> {
        if arc.is_full_circle() {
            self.entity("CIRCLE", layer)?;
            self.point(10, arc.center)?;
            return self.pair_f64(40, arc.radius);
        }
        self.entity("ARC", layer)?;
        self.point(10, arc.center)?;
        self.pair_f64(40, arc.radius)?;
        self.pair_f64(50, arc.start_angle.to_degrees().rem_euclid(360.0))?;
        self.pair_f64(51, arc.end_angle.to_degrees().rem_euclid(360.0))
    }

    fn header(&mut self, width: f64, height: f64) -> io::Result<()> {
        self.pair(0, "SECTION")?;
        self.pair(2, "HEADER")?;
        self.pair(9, "$ACADVER")?;
        self.pair(1, "AC1015")?;
        self.pair(9, "$INSUNITS")?;
        self.pair(70, self.unit.dxf_insunits())?;
        self.pair(9, "$EXTMIN")?;
        self.point(10, Point2::origin())?;
        self.pair(9, "$EXTMAX")?;
        self.point(10, Point2::new(width, height))?;
        self.pair(0, "ENDSEC")
    }

    fn tables(&mut self, layers: &[Layer]) -> io::Result<()> {
        self.pair(0, "SECTION")?;
        self.pair(2, "TABLES")?;

        self.pair(0, "TABLE")?;
        self.pair(2, "LTYPE")?;
        self.pair(70, 1)?;
        self.pair(0, "LTYPE")?;
        self.pair(2, "CONTINUOUS")?;
        self.pair(70, 0)?;
        self.pair(3, "Solid line")?;
        self.pair(72, 65)?;
        self.pair(73, 0)?;
        self.pair(40, 0)?;
        self.pair(0, "ENDTAB")?;

        self.pair(0, "TABLE")?;
        self.pair(2, "LAYER")?;
        self.pair(70, layers.len())?;
        for &layer in layers {
            let style = self.config.style(layer);
            let true_color = style.stroke_color.or(style.fill_color);
            self.pair(0, "LAYER")?;
            self.pair(2, layer.name())?;
            self.pair(70, 0)?;
            self.pair(62, layer.aci_color())?;
            self.pair(6, "CONTINUOUS")?;
            if let Some(color) = true_color {
                self.pair(420, color.true_color())?;
            }
        }
        self.pair(0, "ENDTAB")?;

        self.pair(0, "ENDSEC")
    }
}

impl<W: Write> SheetWriter for DxfSheetWriter<'_, W> {
    fn begin(&mut self, width: f64, height: f64, layers: &[Layer]) -> io::Result<()> {
        self.header(width, height)?;
        self.tables(layers)?;
        self.pair(0, "SECTION")?;
        self.pair(2, "ENTITIES")
    }

    fn begin_layer(&mut self, _layer: Layer) -> io::Result<()> {
        Ok(())
    }

    fn rect(&mut self, layer: Layer, rect: Rect, label: &str) -> io::Result<()> {
        self.comment(label)?;
        self.entity("LWPOLYLINE", layer)?;
        self.pair(90, 4)?;
        self.pair(70, 1)?;
        for corner in rect.corners() {
            self.point(10, corner)?;
        }
        Ok(())
    }

    fn line(&mut self, layer: Layer, segment: Segment, label: &str) -> io::Result<()> {
        self.comment(label)?;
        self.line_entity(layer, segment.start, segment.end)
    }

    fn outline(&mut self, layer: Layer, primitives: &[Primitive], label: &str) -> io::Result<()> {
        self.comment(label)?;
        for primitive in primitives {
            match primitive {
                Primitive::Line(seg) => self.line_entity(layer, seg.start, seg.end)?,
                Primitive::Arc { arc, .. } if self.config.smoothing => {
                    self.arc_entity(layer, arc)?;
                }
                Primitive::Arc { arc, .. } => {
                    let points = arc.approximate(CHORD_STEP);
                    debug!(chords = points.len() - 1, "approximating arc");
                    for pair in points.windows(2) {
                        self.line_entity(layer, pair[0], pair[1])?;
                    }
                }
            }
        }
        Ok(())
    }

    fn end_layer(&mut self, _layer: Layer) -> io::Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.pair(0, "ENDSEC")?;
        self.pair(0, "EOF")?;
        self.out.flush()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DxfError {
    #[error("DXF I/O error for {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("DXF parse error: expected an even number of lines (code/value pairs)")]
    OddNumberOfLines,
    #[error("DXF parse error: invalid group code {raw:?} at line {line}")]
    InvalidGroupCode { raw: String, line: usize },
    #[error("DXF parse error: missing ENTITIES section")]
    MissingEntitiesSection,
    #[error("DXF parse error: missing required group code {code} for entity {entity}")]
    MissingRequiredGroup { entity: &'static str, code: i32 },
    #[error("DXF parse error: invalid float {raw:?} for group code {code} in entity {entity}")]
    InvalidFloat {
        entity: &'static str,
        code: i32,
        raw: String,
    },
}

/// Parsed DXF content: the layer table, entities, and `999` comments in file order.
#[derive(Debug, Clone, Default)]
pub struct Dxf {
    pub layers: Vec<String>,
    pub entities: Vec<Entity>,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub layer: String,
    pub shape: Shape,
}

#[derive(Debug, Clone)]
pub enum Shape {
    Line { start: Point2<f64>, end: Point2<f64> },
    Circle { center: Point2<f64>, radius: f64 },
    Arc {
        center: Point2<f64>,
        radius: f64,
        start_angle_deg: f64,
        end_angle_deg: f64,
    },
    LwPolyline { vertices: Vec<Point2<f64>>, closed: bool },
    Unsupported { kind: String },
}

#[derive(Debug, Clone, Copy)]
struct Group<'a> {
    code: i32,
    value: &'a str,
}

impl Dxf {
    pub fn parse_str(input: &str) -> Result<Self, DxfError> {
        let groups = parse_groups(input)?;
        let comments = groups
            .iter()
            .filter(|g| g.code == 999)
            .map(|g| g.value.to_string())
            .collect();
        let groups: Vec<Group<'_>> = groups.into_iter().filter(|g| g.code != 999).collect();
        Ok(Self {
            layers: parse_layer_names(&groups),
            entities: parse_entities(&groups)?,
            comments,
        })
    }

    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, DxfError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DxfError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&text)
    }

    /// Entities drawn on the named layer.
    pub fn on_layer<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a Shape> + 'a {
        self.entities
            .iter()
            .filter(move |e| e.layer == layer)
            .map(|e| &e.shape)
    }
}

fn parse_groups(input: &str) -> Result<Vec<Group<'_>>, DxfError> {
    let lines: Vec<&str> = input.lines().collect();
    if lines.len() % 2 != 0 {
        return Err(DxfError::OddNumberOfLines);
    }

    let mut groups: Vec<Group<'_>> = Vec::with_capacity(lines.len() / 2);
    for (i, pair) in lines.chunks_exact(2).enumerate() {
        let code_raw = pair[0].trim();
        let code: i32 = code_raw.parse().map_err(|_| DxfError::InvalidGroupCode {
            raw: code_raw.to_string(),
            line: i * 2 + 1,
        })?;
        groups.push(Group {
            code,
            value: pair[1].trim_end(),
        });
    }
    Ok(groups)
}

fn parse_layer_names(groups: &[Group<'_>]) -> Vec<String> {
    let mut names = Vec::new();
    let mut in_layer = false;
    for g in groups {
        match (g.code, g.value) {
            (0, "LAYER") => in_layer = true,
            (0, _) => in_layer = false,
            (2, name) if in_layer => {
                names.push(name.to_string());
                in_layer = false;
            }
            _ => {}
        }
    }
    names
}

fn parse_entities(groups: &[Group<'_>]) -> Result<Vec<Entity>, DxfError> {
    let mut i = 0usize;
    let mut in_entities = false;
    let mut saw_entities_section = false;
    let mut entities: Vec<Entity> = Vec::new();

    while i < groups.len() {
        let g = groups[i];
        if g.code == 0 && g.value == "SECTION" {
            i += 1;
            if groups
                .get(i)
                .is_some_and(|name| name.code == 2 && name.value == "ENTITIES")
            {
                in_entities = true;
                saw_entities_section = true;
            }
            i += 1;
            continue;
        }

        if in_entities && g.code == 0 {
            if g.value == "ENDSEC" {
                in_entities = false;
                i += 1;
                continue;
            }
            let kind = g.value;
            i += 1;
            let start = i;
            while i < groups.len() && groups[i].code != 0 {
                i += 1;
            }
            entities.push(parse_entity(kind, &groups[start..i])?);
            continue;
        }

        i += 1;
    }

    if saw_entities_section {
        Ok(entities)
    } else {
        Err(DxfError::MissingEntitiesSection)
    }
}

fn parse_entity(kind: &str, groups: &[Group<'_>]) -> Result<Entity, DxfError> {
    let layer = groups
        .iter()
        .find(|g| g.code == 8)
        .map(|g| g.value.to_string())
        .unwrap_or_default();
    let shape = match kind {
        "LINE" => Shape::Line {
            start: get_point("LINE", groups, 10)?,
            end: get_point("LINE", groups, 11)?,
        },
        "CIRCLE" => Shape::Circle {
            center: get_point("CIRCLE", groups, 10)?,
            radius: get_f64("CIRCLE", groups, 40)?,
        },
        "ARC" => Shape::Arc {
            center: get_point("ARC", groups, 10)?,
            radius: get_f64("ARC", groups, 40)?,
            start_angle_deg: get_f64("ARC", groups, 50)?,
            end_angle_deg: get_f64("ARC", groups, 51)?,
        },
        "LWPOLYLINE" => parse_lwpolyline(groups)?,
        other => Shape::Unsupported {
            kind: other.to_string(),
        },
    };
    Ok(Entity { layer, shape })
}

fn parse_lwpolyline(groups: &[Group<'_>]) -> Result<Shape, DxfError> {
    let closed = groups
        .iter()
        .find(|g| g.code == 70)
        .and_then(|g| g.value.trim().parse::<i32>().ok())
        .is_some_and(|flags| flags & 1 != 0);

    let mut vertices = Vec::new();
    let mut last_x: Option<f64> = None;
    for g in groups {
        match g.code {
            10 => last_x = Some(parse_f64("LWPOLYLINE", 10, g.value)?),
            20 => {
                if let Some(x) = last_x.take() {
                    vertices.push(Point2::new(x, parse_f64("LWPOLYLINE", 20, g.value)?));
                }
            }
            _ => {}
        }
    }
    Ok(Shape::LwPolyline { vertices, closed })
}

fn get_point(entity: &'static str, groups: &[Group<'_>], code: i32) -> Result<Point2<f64>, DxfError> {
    Ok(Point2::new(
        get_f64(entity, groups, code)?,
        get_f64(entity, groups, code + 10)?,
    ))
}

fn get_f64(entity: &'static str, groups: &[Group<'_>], code: i32) -> Result<f64, DxfError> {
    let g = groups
        .iter()
        .find(|g| g.code == code)
        .ok_or(DxfError::MissingRequiredGroup { entity, code })?;
    parse_f64(entity, code, g.value)
}

fn parse_f64(entity: &'static str, code: i32, raw: &str) -> Result<f64, DxfError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| DxfError::InvalidFloat {
            entity,
            code,
            raw: raw.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Color;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn write_with(config: &RenderConfig, draw: impl FnOnce(&mut DxfSheetWriter<'_, &mut Vec<u8>>)) -> Dxf {
        let mut buf = Vec::new();
        {
            let mut w = DxfSheetWriter::new(&mut buf, config, LengthUnit::Inches);
            w.begin(10.0, 5.0, &config.visible_layers()).unwrap();
            draw(&mut w);
            w.finish().unwrap();
        }
        Dxf::parse_str(std::str::from_utf8(&buf).unwrap()).unwrap()
    }

    #[test]
    fn layer_table_lists_visible_layers_only() {
        let mut config = RenderConfig::default();
        config.parts.stroke_color = Some(Color::rgb(255, 0, 0));
        let mut buf = Vec::new();
        {
            let mut w = DxfSheetWriter::new(&mut buf, &config, LengthUnit::Millimeters);
            w.begin(10.0, 5.0, &config.visible_layers()).unwrap();
            w.finish().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("$INSUNITS\n70\n4\n"));
        assert!(text.contains("OCL_PARTS\n70\n0\n62\n7\n6\nCONTINUOUS\n420\n16711680\n"));
        let dxf = Dxf::parse_str(&text).unwrap();
        assert_eq!(dxf.layers, vec!["OCL_SHEET", "OCL_PARTS"]);
        assert!(dxf.entities.is_empty());
    }

    #[test]
    fn rect_is_a_closed_polyline_with_comment() {
        let config = RenderConfig::default();
        let dxf = write_with(&config, |w| {
            w.rect(
                Layer::Parts,
                Rect {
                    x: 1.0,
                    y: 2.0,
                    width: 3.0,
                    height: 4.0,
                },
                "Leg A/B",
            )
            .unwrap();
        });
        assert_eq!(dxf.comments, vec!["Leg A/B"]);
        match &dxf.entities[0].shape {
            Shape::LwPolyline { vertices, closed } => {
                assert!(*closed);
                assert_eq!(vertices.len(), 4);
                assert_eq!(vertices[2], Point2::new(4.0, 6.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(dxf.entities[0].layer, "OCL_PARTS");
    }

    #[test]
    fn smoothing_writes_native_arcs_and_circles() {
        let config = RenderConfig {
            smoothing: true,
            ..RenderConfig::default()
        };
        let quarter = ArcPrimitive::new(Point2::new(1.0, 1.0), 1.0, 0.0, FRAC_PI_2);
        let full = ArcPrimitive::new(Point2::new(5.0, 1.0), 0.5, 0.0, 2.0 * PI);
        let dxf = write_with(&config, |w| {
            let prims = [
                Primitive::Arc {
                    arc: quarter,
                    curve: sheetcut_geometry::CurveId(0),
                },
                Primitive::Arc {
                    arc: full,
                    curve: sheetcut_geometry::CurveId(1),
                },
            ];
            w.outline(Layer::Parts, &prims, "1").unwrap();
        });
        assert_eq!(dxf.entities.len(), 2);
        match dxf.entities[0].shape {
            Shape::Arc {
                start_angle_deg,
                end_angle_deg,
                radius,
                ..
            } => {
                assert_abs_diff_eq!(start_angle_deg, 0.0);
                assert_abs_diff_eq!(end_angle_deg, 90.0);
                assert_abs_diff_eq!(radius, 1.0);
            }
            ref other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(dxf.entities[1].shape, Shape::Circle { radius, .. } if radius == 0.5));
    }

    #[test]
    fn without_smoothing_arcs_become_chords() {
        let config = RenderConfig::default();
        let one_radian = ArcPrimitive::new(Point2::new(1.0, 1.0), 1.0, 0.0, 1.0);
        let dxf = write_with(&config, |w| {
            let prims = [Primitive::Arc {
                arc: one_radian,
                curve: sheetcut_geometry::CurveId(0),
            }];
            w.outline(Layer::Parts, &prims, "1").unwrap();
        });
        // 10 degree chords: ceil(57.3 / 10)
        assert_eq!(dxf.entities.len(), 6);
        assert!(dxf
            .entities
            .iter()
            .all(|e| matches!(e.shape, Shape::Line { .. })));
    }

    #[test]
    fn odd_line_count_is_rejected() {
        assert!(matches!(
            Dxf::parse_str("0\nSECTION\n2\n"),
            Err(DxfError::OddNumberOfLines)
        ));
        assert!(matches!(
            Dxf::parse_str("0\nEOF\n"),
            Err(DxfError::MissingEntitiesSection)
        ));
    }
}
