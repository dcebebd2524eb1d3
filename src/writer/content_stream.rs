//! Page content stream operators.
//!
//! Operators are collected into a [`ContentStreamBuilder`] and rendered as
//! one line of operator text. Coordinates are written with two decimals,
//! colour components and word spacing with three, rotation coefficients
//! with five.

use std::io::Write;

/// A device colour, gray or RGB, with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    /// Gray level
    Gray(f64),
    /// Red, green, blue
    Rgb(f64, f64, f64),
}

impl Color {
    /// Gray from a 0-255 level.
    pub fn gray(level: f64) -> Self {
        Color::Gray(level / 255.0)
    }

    /// RGB from 0-255 components; black is written as gray.
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        if r == 0.0 && g == 0.0 && b == 0.0 {
            Color::Gray(0.0)
        } else {
            Color::Rgb(r / 255.0, g / 255.0, b / 255.0)
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::Gray(0.0)
    }
}

/// Rectangle painting operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaintStyle {
    /// Outline only (`S`)
    #[default]
    Stroke,
    /// Interior only (`f`)
    Fill,
    /// Interior and outline (`B`)
    FillStroke,
}

impl PaintStyle {
    /// Parse `""`/`"D"`, `"F"`, `"DF"`/`"FD"`; anything else strokes.
    pub fn parse(style: &str) -> Self {
        match style.to_uppercase().as_str() {
            "F" => PaintStyle::Fill,
            "FD" | "DF" => PaintStyle::FillStroke,
            _ => PaintStyle::Stroke,
        }
    }

    fn operator(self) -> &'static str {
        match self {
            PaintStyle::Stroke => "S",
            PaintStyle::Fill => "f",
            PaintStyle::FillStroke => "B",
        }
    }
}

/// Operations that can be added to a content stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentStreamOp {
    /// Save graphics state (q)
    SaveState,
    /// Restore graphics state (Q)
    RestoreState,
    /// Line cap style (J)
    SetLineCap(u8),
    /// Line width in points (w)
    SetLineWidth(f64),
    /// Stroking colour (G / RG)
    SetStrokeColor(Color),
    /// Non-stroking colour (g / rg)
    SetFillColor(Color),
    /// Word spacing in points (Tw)
    SetWordSpacing(f64),
    /// Reset word spacing (`0 Tw`)
    ResetWordSpacing,
    /// Begin text object (BT)
    BeginText,
    /// End text object (ET)
    EndText,
    /// Font resource and size (Tf)
    SetFont(String, f64),
    /// Move text position (Td)
    MoveText(f64, f64),
    /// Show literal text (Tj), raw bytes before escaping
    ShowText(Vec<u8>),
    /// Move to (m)
    MoveTo(f64, f64),
    /// Line to (l)
    LineTo(f64, f64),
    /// Rectangle path (re)
    Rectangle(f64, f64, f64, f64),
    /// Paint the current path
    Paint(PaintStyle),
    /// Scale and translate for an image placement (cm)
    PlaceImage {
        /// Width in points
        w: f64,
        /// Height in points
        h: f64,
        /// Lower-left x
        x: f64,
        /// Lower-left y
        y: f64,
    },
    /// Rotation about a point (two cm operators)
    Rotate {
        /// Angle in degrees, counter-clockwise
        degrees: f64,
        /// Centre x in points
        cx: f64,
        /// Centre y in points
        cy: f64,
    },
    /// Paint XObject (Do)
    PaintXObject(String),
}

/// Builder for one line of content stream operators.
#[derive(Debug, Clone, Default)]
pub struct ContentStreamBuilder {
    ops: Vec<ContentStreamOp>,
}

impl ContentStreamBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation.
    pub fn op(&mut self, op: ContentStreamOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    /// Append several operations.
    pub fn ops(&mut self, ops: impl IntoIterator<Item = ContentStreamOp>) -> &mut Self {
        self.ops.extend(ops);
        self
    }

    /// Whether nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// `BT x y Td (text) Tj ET`
    pub fn text(&mut self, x: f64, y: f64, text: &[u8]) -> &mut Self {
        self.ops([
            ContentStreamOp::BeginText,
            ContentStreamOp::MoveText(x, y),
            ContentStreamOp::ShowText(text.to_vec()),
            ContentStreamOp::EndText,
        ])
    }

    /// `BT /Fn size Tf ET`
    pub fn font(&mut self, resource: &str, size: f64) -> &mut Self {
        self.ops([
            ContentStreamOp::BeginText,
            ContentStreamOp::SetFont(resource.to_string(), size),
            ContentStreamOp::EndText,
        ])
    }

    /// Straight stroked segment.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> &mut Self {
        self.ops([
            ContentStreamOp::MoveTo(x1, y1),
            ContentStreamOp::LineTo(x2, y2),
            ContentStreamOp::Paint(PaintStyle::Stroke),
        ])
    }

    /// Rectangle painted with `style`.
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: PaintStyle) -> &mut Self {
        self.ops([ContentStreamOp::Rectangle(x, y, w, h), ContentStreamOp::Paint(style)])
    }

    /// Image XObject placed inside its own graphics state.
    pub fn image(&mut self, resource: &str, w: f64, h: f64, x: f64, y: f64) -> &mut Self {
        self.ops([
            ContentStreamOp::SaveState,
            ContentStreamOp::PlaceImage { w, h, x, y },
            ContentStreamOp::PaintXObject(resource.to_string()),
            ContentStreamOp::RestoreState,
        ])
    }

    /// Render the operators separated by single spaces.
    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                out.push(b' ');
            }
            // Writing into a Vec cannot fail
            let _ = write_op(&mut out, op);
        }
        out
    }
}

fn write_op<W: Write>(w: &mut W, op: &ContentStreamOp) -> std::io::Result<()> {
    match op {
        ContentStreamOp::SaveState => write!(w, "q"),
        ContentStreamOp::RestoreState => write!(w, "Q"),
        ContentStreamOp::SetLineCap(cap) => write!(w, "{} J", cap),
        ContentStreamOp::SetLineWidth(width) => write!(w, "{:.2} w", width),
        ContentStreamOp::SetStrokeColor(Color::Gray(g)) => write!(w, "{:.3} G", g),
        ContentStreamOp::SetStrokeColor(Color::Rgb(r, g, b)) => write!(w, "{:.3} {:.3} {:.3} RG", r, g, b),
        ContentStreamOp::SetFillColor(Color::Gray(g)) => write!(w, "{:.3} g", g),
        ContentStreamOp::SetFillColor(Color::Rgb(r, g, b)) => write!(w, "{:.3} {:.3} {:.3} rg", r, g, b),
        ContentStreamOp::SetWordSpacing(ws) => write!(w, "{:.3} Tw", ws),
        ContentStreamOp::ResetWordSpacing => write!(w, "0 Tw"),
        ContentStreamOp::BeginText => write!(w, "BT"),
        ContentStreamOp::EndText => write!(w, "ET"),
        ContentStreamOp::SetFont(name, size) => write!(w, "/{} {:.2} Tf", name, size),
        ContentStreamOp::MoveText(x, y) => write!(w, "{:.2} {:.2} Td", x, y),
        ContentStreamOp::ShowText(text) => {
            w.write_all(b"(")?;
            w.write_all(&escape_bytes(text))?;
            w.write_all(b") Tj")
        },
        ContentStreamOp::MoveTo(x, y) => write!(w, "{:.2} {:.2} m", x, y),
        ContentStreamOp::LineTo(x, y) => write!(w, "{:.2} {:.2} l", x, y),
        ContentStreamOp::Rectangle(x, y, rw, rh) => write!(w, "{:.2} {:.2} {:.2} {:.2} re", x, y, rw, rh),
        ContentStreamOp::Paint(style) => write!(w, "{}", style.operator()),
        ContentStreamOp::PlaceImage { w: iw, h: ih, x, y } => {
            write!(w, "{:.2} 0 0 {:.2} {:.2} {:.2} cm", iw, ih, x, y)
        },
        ContentStreamOp::Rotate { degrees, cx, cy } => {
            let (s, c) = degrees.to_radians().sin_cos();
            write!(
                w,
                "{:.5} {:.5} {:.5} {:.5} {:.2} {:.2} cm 1 0 0 1 {:.2} {:.2} cm",
                c, s, -s, c, cx, cy, -cx, -cy
            )
        },
        ContentStreamOp::PaintXObject(name) => write!(w, "/{} Do", name),
    }
}

/// Escape `\`, `(`, `)` and carriage return for a literal string.
pub fn escape_bytes(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for &b in text {
        match b {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(b);
            },
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(b),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(build: impl FnOnce(&mut ContentStreamBuilder)) -> String {
        let mut b = ContentStreamBuilder::new();
        build(&mut b);
        String::from_utf8(b.build()).unwrap()
    }

    #[test]
    fn test_text_operator() {
        assert_eq!(
            render(|b| {
                b.text(28.35, 813.54, b"Hello (World)");
            }),
            "BT 28.35 813.54 Td (Hello \\(World\\)) Tj ET"
        );
    }

    #[test]
    fn test_colors() {
        assert_eq!(render(|b| { b.op(ContentStreamOp::SetStrokeColor(Color::gray(255.0))); }), "1.000 G");
        assert_eq!(
            render(|b| {
                b.op(ContentStreamOp::SetFillColor(Color::rgb(255.0, 0.0, 51.0)));
            }),
            "1.000 0.000 0.200 rg"
        );
        assert_eq!(Color::rgb(0.0, 0.0, 0.0), Color::Gray(0.0));
    }

    #[test]
    fn test_rect_and_line() {
        assert_eq!(
            render(|b| {
                b.rect(10.0, 20.0, 30.0, -40.0, PaintStyle::parse("DF"));
            }),
            "10.00 20.00 30.00 -40.00 re B"
        );
        assert_eq!(render(|b| { b.line(0.0, 1.0, 2.0, 3.0); }), "0.00 1.00 m 2.00 3.00 l S");
        assert_eq!(PaintStyle::parse("f"), PaintStyle::Fill);
        assert_eq!(PaintStyle::parse(""), PaintStyle::Stroke);
    }

    #[test]
    fn test_image_and_rotation() {
        assert_eq!(
            render(|b| {
                b.image("I1", 100.0, 50.0, 10.0, 20.0);
            }),
            "q 100.00 0 0 50.00 10.00 20.00 cm /I1 Do Q"
        );
        assert_eq!(
            render(|b| {
                b.op(ContentStreamOp::SaveState).op(ContentStreamOp::Rotate {
                    degrees: 90.0,
                    cx: 10.0,
                    cy: 20.0,
                });
            }),
            "q 0.00000 1.00000 -1.00000 0.00000 10.00 20.00 cm 1 0 0 1 -10.00 -20.00 cm"
        );
    }

    #[test]
    fn test_escape_bytes() {
        assert_eq!(escape_bytes(b"a\\b\rc"), b"a\\\\b\\rc");
        assert_eq!(escape_bytes("é".as_bytes()), "é".as_bytes());
    }
}
