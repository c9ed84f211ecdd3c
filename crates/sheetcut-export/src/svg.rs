//! SVG output for sheets. Coordinates stay Y-down; only the unit scale applies.

use std::f64::consts::PI;
use std::io::{self, Write};

use nalgebra::Point2;
use sheetcut_geometry::{ArcPrimitive, Primitive, Segment};

use crate::config::{Layer, LayerStyle, RenderConfig};
use crate::sanitize::{svg_id, xml_escape};
use crate::sheet::{Rect, SheetWriter, CHORD_STEP};
use crate::units::{fmt_num, LengthUnit};

const EPS: f64 = 1e-6;

pub struct SvgSheetWriter<'a, W: Write> {
    out: W,
    config: &'a RenderConfig,
    unit: LengthUnit,
}

impl<'a, W: Write> SvgSheetWriter<'a, W> {
    pub fn new(out: W, config: &'a RenderConfig, unit: LengthUnit) -> Self {
        Self { out, config, unit }
    }

    /// `id` and the verbatim `serif:id` label.
    fn identify(label: &str) -> String {
        format!(
            "id=\"{}\" serif:id=\"{}\"",
            xml_escape(&svg_id(label)),
            xml_escape(label)
        )
    }
}

/// Configured fill or `none`; configured stroke, else `none` when only a fill is set,
/// else black.
fn paint(style: &LayerStyle) -> (String, String) {
    let fill = style
        .fill_color
        .map_or_else(|| "none".to_string(), |c| c.to_string());
    let stroke = match (style.stroke_color, style.fill_color) {
        (Some(c), _) => c.to_string(),
        (None, Some(_)) => "none".to_string(),
        (None, None) => "#000000".to_string(),
    };
    (stroke, fill)
}

impl<W: Write> SheetWriter for SvgSheetWriter<'_, W> {
    fn begin(&mut self, width: f64, height: f64, _layers: &[Layer]) -> io::Result<()> {
        let (w, h, u) = (fmt_num(width), fmt_num(height), self.unit.symbol());
        writeln!(
            self.out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>"
        )?;
        writeln!(
            self.out,
            "<svg width=\"{w}{u}\" height=\"{h}{u}\" viewBox=\"0 0 {w} {h}\" version=\"1.1\" xmlns=\"http://www.w3.org/2000/svg\" xmlns:serif=\"http://www.serif.com/\">"
        )
    }

    fn begin_layer(&mut self, layer: Layer) -> io::Result<()> {
        writeln!(self.out, "  <g id=\"{}\">", layer.name())
    }

    fn rect(&mut self, layer: Layer, rect: Rect, label: &str) -> io::Result<()> {
        let (stroke, fill) = paint(self.config.style(layer));
        writeln!(
            self.out,
            "    <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" stroke=\"{stroke}\" fill=\"{fill}\" {}/>",
            fmt_num(rect.x),
            fmt_num(rect.y),
            fmt_num(rect.width),
            fmt_num(rect.height),
            Self::identify(label),
        )
    }

    fn line(&mut self, layer: Layer, segment: Segment, label: &str) -> io::Result<()> {
        let style = self.config.style(layer);
        let stroke = style
            .stroke_color
            .map_or_else(|| "#000000".to_string(), |c| c.to_string());
        writeln!(
            self.out,
            "    <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"{stroke}\" {}/>",
            fmt_num(segment.start.x),
            fmt_num(segment.start.y),
            fmt_num(segment.end.x),
            fmt_num(segment.end.y),
            Self::identify(label),
        )
    }

    fn outline(&mut self, layer: Layer, primitives: &[Primitive], label: &str) -> io::Result<()> {
        let (stroke, fill) = paint(self.config.style(layer));
        let d = outline_path(primitives, self.config.smoothing);
        writeln!(
            self.out,
            "    <path d=\"{d}\" stroke=\"{stroke}\" fill=\"{fill}\" {}/>",
            Self::identify(label),
        )
    }

    fn end_layer(&mut self, _layer: Layer) -> io::Result<()> {
        writeln!(self.out, "  </g>")
    }

    fn finish(&mut self) -> io::Result<()> {
        writeln!(self.out, "</svg>")?;
        self.out.flush()
    }
}

fn close(a: Point2<f64>, b: Point2<f64>) -> bool {
    (a.x - b.x).abs() <= EPS && (a.y - b.y).abs() <= EPS
}

fn endpoints(primitive: &Primitive) -> (Point2<f64>, Point2<f64>) {
    match primitive {
        Primitive::Line(seg) => (seg.start, seg.end),
        Primitive::Arc { arc, .. } => (arc.start_point(), arc.end_point()),
    }
}

#[derive(Default)]
struct PathData {
    d: String,
    current: Option<Point2<f64>>,
    sub_start: Option<Point2<f64>>,
}

impl PathData {
    /// Direction to traverse `a -> b` so it continues from the pen, or when starting a
    /// subpath, so it leads into `next`.
    fn orient(
        &self,
        a: Point2<f64>,
        b: Point2<f64>,
        next: Option<&Primitive>,
    ) -> (Point2<f64>, Point2<f64>) {
        match (self.current, next) {
            (Some(pen), _) if !close(pen, a) && close(pen, b) => (b, a),
            (None, Some(next)) => {
                let (na, nb) = endpoints(next);
                let touches = |p| close(p, na) || close(p, nb);
                if !touches(b) && touches(a) {
                    (b, a)
                } else {
                    (a, b)
                }
            }
            _ => (a, b),
        }
    }

    fn move_to(&mut self, p: Point2<f64>) {
        if self.current.is_some_and(|c| close(c, p)) {
            return;
        }
        if !self.d.is_empty() {
            self.d.push(' ');
        }
        self.d.push_str(&format!("M {} {}", fmt_num(p.x), fmt_num(p.y)));
        self.current = Some(p);
        self.sub_start = Some(p);
    }

    fn advance(&mut self, to: Point2<f64>) {
        self.current = Some(to);
        if self.sub_start.is_some_and(|s| close(to, s)) {
            self.d.push_str(" Z");
            self.current = None;
            self.sub_start = None;
        }
    }

    fn line_to(&mut self, p: Point2<f64>) {
        self.d.push_str(&format!(" L {} {}", fmt_num(p.x), fmt_num(p.y)));
        self.advance(p);
    }

    fn arc_to(&mut self, arc: &ArcPrimitive, forward: bool, to: Point2<f64>) {
        let r = fmt_num(arc.radius);
        self.d.push_str(&format!(
            " A {r} {r} 0 {} {} {} {}",
            u8::from(arc.sweep() > PI),
            u8::from(forward),
            fmt_num(to.x),
            fmt_num(to.y)
        ));
        self.advance(to);
    }

    fn chords_to(&mut self, arc: &ArcPrimitive, forward: bool) {
        let mut points = arc.approximate(CHORD_STEP);
        if !forward {
            points.reverse();
        }
        for p in points.into_iter().skip(1) {
            self.line_to(p);
        }
    }

    fn circle(&mut self, arc: &ArcPrimitive, smoothing: bool) {
        let start = arc.point_at(0.0);
        self.current = None;
        self.move_to(start);
        if smoothing {
            let opposite = arc.point_at(PI);
            let r = fmt_num(arc.radius);
            for p in [opposite, start] {
                self.d
                    .push_str(&format!(" A {r} {r} 0 0 1 {} {}", fmt_num(p.x), fmt_num(p.y)));
            }
            self.advance(start);
        } else {
            let full = ArcPrimitive::new(arc.center, arc.radius, 0.0, 2.0 * PI);
            self.chords_to(&full, true);
        }
    }
}

/// One path for a closed outline. Arcs are followed in whichever direction keeps the pen
/// continuous; the sweep flag is 1 when drawn start to end.
pub(crate) fn outline_path(primitives: &[Primitive], smoothing: bool) -> String {
    let mut path = PathData::default();
    for (i, primitive) in primitives.iter().enumerate() {
        let next = primitives.get(i + 1);
        match primitive {
            Primitive::Line(seg) => {
                let (a, b) = path.orient(seg.start, seg.end, next);
                path.move_to(a);
                path.line_to(b);
            }
            Primitive::Arc { arc, .. } if arc.is_full_circle() => path.circle(arc, smoothing),
            Primitive::Arc { arc, .. } => {
                let (a, b) = path.orient(arc.start_point(), arc.end_point(), next);
                let forward = close(a, arc.start_point());
                path.move_to(a);
                if smoothing {
                    path.arc_to(arc, forward, b);
                } else {
                    path.chords_to(arc, forward);
                }
            }
        }
    }
    path.d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Color;
    use sheetcut_geometry::CurveId;
    use std::f64::consts::FRAC_PI_2;

    fn render(config: &RenderConfig, draw: impl FnOnce(&mut SvgSheetWriter<'_, &mut Vec<u8>>)) -> String {
        let mut buf = Vec::new();
        {
            let mut w = SvgSheetWriter::new(&mut buf, config, LengthUnit::Millimeters);
            w.begin(100.0, 50.0, &config.visible_layers()).unwrap();
            w.begin_layer(Layer::Parts).unwrap();
            draw(&mut w);
            w.end_layer(Layer::Parts).unwrap();
            w.finish().unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    fn rect() -> Rect {
        Rect {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        }
    }

    #[test]
    fn header_declares_units_and_serif_namespace() {
        let svg = render(&RenderConfig::default(), |_| {});
        assert!(svg.contains("width=\"100mm\" height=\"50mm\" viewBox=\"0 0 100 50\""));
        assert!(svg.contains("xmlns:serif=\"http://www.serif.com/\""));
        assert!(svg.contains("<g id=\"OCL_PARTS\">"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn labels_are_sanitized_and_kept_verbatim() {
        let svg = render(&RenderConfig::default(), |w| {
            w.rect(Layer::Parts, rect(), "Leg A/B").unwrap();
        });
        assert!(svg.contains("id=\"Leg_A_B\" serif:id=\"Leg A/B\""), "{svg}");
    }

    #[test]
    fn stroke_defaults_to_black_without_colors() {
        let svg = render(&RenderConfig::default(), |w| {
            w.rect(Layer::Parts, rect(), "1").unwrap();
        });
        assert!(svg.contains("stroke=\"#000000\" fill=\"none\""));
    }

    #[test]
    fn fill_only_suppresses_stroke() {
        let mut config = RenderConfig::default();
        config.parts.fill_color = Some(Color::rgb(0, 255, 0));
        let svg = render(&config, |w| {
            w.rect(Layer::Parts, rect(), "1").unwrap();
        });
        assert!(svg.contains("stroke=\"none\" fill=\"#00ff00\""));
    }

    #[test]
    fn path_closes_and_reverses_arcs_to_stay_continuous() {
        // Quarter arc centered (0, 0) from (1, 0) to (0, 1), traversed backwards.
        let arc = ArcPrimitive::new(Point2::origin(), 1.0, 0.0, FRAC_PI_2);
        let prims = [
            Primitive::Line(Segment::new(Point2::new(1.0, 0.0), Point2::new(0.0, 5.0))),
            Primitive::Line(Segment::new(Point2::new(0.0, 5.0), Point2::new(0.0, 1.0))),
            Primitive::Arc {
                arc,
                curve: CurveId(0),
            },
        ];
        let d = outline_path(&prims, true);
        assert_eq!(d, "M 1 0 L 0 5 L 0 1 A 1 1 0 0 0 1 0 Z");
    }

    #[test]
    fn leading_arc_is_oriented_toward_the_next_primitive() {
        let arc = ArcPrimitive::new(Point2::origin(), 1.0, 0.0, FRAC_PI_2);
        let prims = [
            Primitive::Arc {
                arc,
                curve: CurveId(0),
            },
            Primitive::Line(Segment::new(Point2::new(0.0, 1.0), Point2::new(0.0, 5.0))),
            Primitive::Line(Segment::new(Point2::new(0.0, 5.0), Point2::new(1.0, 0.0))),
        ];
        let d = outline_path(&prims, true);
        assert_eq!(d, "M 1 0 A 1 1 0 0 1 0 1 L 0 5 L 1 0 Z");
    }

    #[test]
    fn unsmoothed_circle_is_a_closed_polygon() {
        let arc = ArcPrimitive::new(Point2::new(5.0, 5.0), 2.0, 0.0, 2.0 * PI);
        let d = outline_path(
            &[Primitive::Arc {
                arc,
                curve: CurveId(0),
            }],
            false,
        );
        assert!(d.starts_with("M 7 5"));
        assert!(d.ends_with(" Z"));
        assert!(!d.contains(" A "));
        assert_eq!(d.matches(" L ").count(), 36);
    }
}
