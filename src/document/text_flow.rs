//! Font selection and text layout: single strings, cells, wrapped
//! paragraphs and flowing text.
//!
//! Widths are measured per byte against the current font's 256-entry
//! table, so text is expected in the font's single-byte encoding.

use super::Document;
use crate::error::{Error, Result};
use crate::fonts::{Font, FontStyle};
use crate::writer::content_stream::{ContentStreamBuilder, ContentStreamOp, PaintStyle};
use crate::writer::serializer::LinkTarget;
use bitflags::bitflags;

bitflags! {
    /// Cell edges to draw. All four edges draw a single framed rectangle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Border: u8 {
        /// Left edge
        const LEFT = 0b0001;
        /// Top edge
        const TOP = 0b0010;
        /// Right edge
        const RIGHT = 0b0100;
        /// Bottom edge
        const BOTTOM = 0b1000;
    }
}

impl Border {
    /// Parse a string of `L`, `T`, `R`, `B` letters; `"1"` is a full frame.
    pub fn parse(border: &str) -> Self {
        if border == "1" {
            return Border::all();
        }
        let mut flags = Border::empty();
        for ch in border.chars() {
            match ch.to_ascii_uppercase() {
                'L' => flags |= Border::LEFT,
                'T' => flags |= Border::TOP,
                'R' => flags |= Border::RIGHT,
                'B' => flags |= Border::BOTTOM,
                _ => {},
            }
        }
        flags
    }
}

/// Where the position goes after a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreak {
    /// To the right of the cell
    #[default]
    Right,
    /// To the start of the next line
    NextLine,
    /// Below the cell, same x
    Below,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Flush left
    #[default]
    Left,
    /// Centered
    Center,
    /// Flush right
    Right,
    /// Justified (paragraphs only; single cells align left)
    Justify,
}

/// Cell appearance and behaviour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellOptions {
    /// Edges to draw
    pub border: Border,
    /// Position after the cell
    pub ln: LineBreak,
    /// Text alignment
    pub align: Align,
    /// Paint the background with the fill colour
    pub fill: bool,
    /// Clickable target over the text
    pub link: Option<LinkTarget>,
}

impl CellOptions {
    /// Borderless, left-aligned, unfilled cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the border.
    pub fn border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    /// Set the line break.
    pub fn ln(mut self, ln: LineBreak) -> Self {
        self.ln = ln;
        self
    }

    /// Set the alignment.
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    /// Fill the background.
    pub fn fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }

    /// Link the text.
    pub fn link(mut self, target: LinkTarget) -> Self {
        self.link = Some(target);
        self
    }
}

impl Document {
    /// Register a font from a definition file under the font path.
    ///
    /// Without `file` the name is `<family><style>.json`, lowercase and
    /// without spaces.
    pub fn add_font(&mut self, family: &str, style: &str, file: Option<&str>) -> Result<()> {
        self.fonts.add_font(family, style, file)?;
        Ok(())
    }

    /// Select a font. An empty family keeps the current one, a size of 0
    /// keeps the current size, and `U` in `style` turns on underlining.
    pub fn set_font(&mut self, family: &str, style: &str, size: f64) -> Result<()> {
        self.select_font(family, FontStyle::parse(style), size)
    }

    pub(crate) fn select_font(&mut self, family: &str, style: FontStyle, size: f64) -> Result<()> {
        let family = if family.is_empty() {
            self.font_family.clone()
        } else {
            family.to_lowercase()
        };
        self.underline = style.contains(FontStyle::UNDERLINE);
        let (family, face) = self.fonts.normalize(&family, style);
        let size = if size == 0.0 { self.font_size_pt } else { size };

        if self.font_family == family && self.font_style == face && self.font_size_pt == size {
            return Ok(());
        }

        let resolved = self.fonts.resolve(&family, face.face(), &self.font_family)?;
        self.font_family = resolved.family;
        self.font_style = resolved.style;
        self.font_size_pt = size;
        self.font_size = size / self.k;
        self.current_font = Some(resolved.key);
        if self.page_no() > 0 {
            self.emit_font()?;
        }
        Ok(())
    }

    /// Change the size of the current font, in points.
    pub fn set_font_size(&mut self, size: f64) -> Result<()> {
        if self.font_size_pt == size {
            return Ok(());
        }
        self.font_size_pt = size;
        self.font_size = size / self.k;
        if self.page_no() > 0 && self.current_font.is_some() {
            self.emit_font()?;
        }
        Ok(())
    }

    /// Current font size in points.
    pub fn font_size_pt(&self) -> f64 {
        self.font_size_pt
    }

    fn emit_font(&mut self) -> Result<()> {
        let resource = self.current_font()?.resource_name();
        let mut b = ContentStreamBuilder::new();
        b.font(&resource, self.font_size_pt);
        self.out_builder(&b)
    }

    fn current_font(&self) -> Result<&Font> {
        self.current_font
            .as_deref()
            .and_then(|key| self.fonts.get(key))
            .ok_or(Error::NoFontSelected)
    }

    /// Width of `text` in the current font, in user units.
    pub fn string_width(&self, text: &str) -> Result<f64> {
        self.bytes_width(text.as_bytes())
    }

    fn bytes_width(&self, text: &[u8]) -> Result<f64> {
        let font = self.current_font()?;
        let units: u64 = text.iter().map(|&b| font.def.width(b) as u64).sum();
        Ok(units as f64 * self.font_size / 1000.0)
    }

    /// Underline for `text` drawn with its baseline at `(x, y)`.
    fn underline_ops(&self, x: f64, y: f64, text: &[u8]) -> Result<[ContentStreamOp; 2]> {
        let font = self.current_font()?;
        let (up, ut) = (font.def.up as f64, font.def.ut as f64);
        let spaces = text.iter().filter(|&&b| b == b' ').count() as f64;
        let w = self.bytes_width(text)? + self.ws * spaces;
        let k = self.k;
        Ok([
            ContentStreamOp::Rectangle(
                x * k,
                (self.h - (y - up / 1000.0 * self.font_size)) * k,
                w * k,
                -ut / 1000.0 * self.font_size_pt,
            ),
            ContentStreamOp::Paint(PaintStyle::Fill),
        ])
    }

    /// Print a string with its baseline starting at `(x, y)`.
    pub fn text(&mut self, x: f64, y: f64, text: &str) -> Result<()> {
        self.current_font()?;
        let bytes = text.as_bytes();
        let k = self.k;
        let mut b = ContentStreamBuilder::new();
        if self.color_flag {
            b.op(ContentStreamOp::SaveState).op(ContentStreamOp::SetFillColor(self.text_color));
        }
        b.text(x * k, (self.h - y) * k, bytes);
        if self.underline && !bytes.is_empty() {
            b.ops(self.underline_ops(x, y, bytes)?);
        }
        if self.color_flag {
            b.op(ContentStreamOp::RestoreState);
        }
        self.out_builder(&b)
    }

    /// Print a rectangular cell with optional borders, background and text.
    ///
    /// A width of 0 extends the cell to the right margin. The page breaks
    /// first when the cell would cross the bottom margin.
    pub fn cell(&mut self, w: f64, h: f64, text: &str, options: &CellOptions) -> Result<()> {
        self.cell_bytes(w, h, text.as_bytes(), options)
    }

    fn cell_bytes(&mut self, mut w: f64, h: f64, text: &[u8], options: &CellOptions) -> Result<()> {
        let k = self.k;
        if self.needs_page_break(h) {
            let x = self.x;
            let ws = self.ws;
            if ws > 0.0 {
                self.ws = 0.0;
                self.out(ContentStreamOp::ResetWordSpacing)?;
            }
            self.break_page()?;
            self.x = x;
            if ws > 0.0 {
                self.ws = ws;
                self.out(ContentStreamOp::SetWordSpacing(ws * k))?;
            }
        }
        if w == 0.0 {
            w = self.w - self.right_margin - self.x;
        }

        let (x, y, page_h) = (self.x, self.y, self.h);
        let mut b = ContentStreamBuilder::new();
        let frame = options.border.is_all();
        if options.fill || frame {
            let style = match (options.fill, frame) {
                (true, true) => PaintStyle::FillStroke,
                (true, false) => PaintStyle::Fill,
                _ => PaintStyle::Stroke,
            };
            b.rect(x * k, (page_h - y) * k, w * k, -h * k, style);
        }
        if !frame {
            let (left, right) = (x * k, (x + w) * k);
            let (top, bottom) = ((page_h - y) * k, (page_h - (y + h)) * k);
            if options.border.contains(Border::LEFT) {
                b.line(left, top, left, bottom);
            }
            if options.border.contains(Border::TOP) {
                b.line(left, top, right, top);
            }
            if options.border.contains(Border::RIGHT) {
                b.line(right, top, right, bottom);
            }
            if options.border.contains(Border::BOTTOM) {
                b.line(left, bottom, right, bottom);
            }
        }

        if !text.is_empty() {
            let tw = self.bytes_width(text)?;
            let dx = match options.align {
                Align::Right => w - self.c_margin - tw,
                Align::Center => (w - tw) / 2.0,
                Align::Left | Align::Justify => self.c_margin,
            };
            let tx = x + dx;
            let baseline = y + 0.5 * h + 0.3 * self.font_size;
            if self.color_flag {
                b.op(ContentStreamOp::SaveState).op(ContentStreamOp::SetFillColor(self.text_color));
            }
            b.text(tx * k, (page_h - baseline) * k, text);
            if self.underline {
                b.ops(self.underline_ops(tx, baseline, text)?);
            }
            if self.color_flag {
                b.op(ContentStreamOp::RestoreState);
            }
            if let Some(target) = &options.link {
                let font_size = self.font_size;
                self.link(target.clone(), tx, y + 0.5 * h - 0.5 * font_size, tw, font_size)?;
            }
        }
        if !b.is_empty() {
            self.out_builder(&b)?;
        }

        self.lasth = h;
        match options.ln {
            LineBreak::Right => self.x += w,
            LineBreak::NextLine => {
                self.y += h;
                self.x = self.left_margin;
            },
            LineBreak::Below => self.y += h,
        }
        Ok(())
    }

    /// Print text in a column of width `w`, wrapping at spaces and at
    /// explicit newlines. Each line is a cell of height `h`; justified
    /// lines stretch their word spacing.
    pub fn multi_cell(&mut self, w: f64, h: f64, text: &str, border: Border, align: Align, fill: bool) -> Result<()> {
        let cw = self.current_font()?.def.cw.clone();
        let w = if w == 0.0 { self.w - self.right_margin - self.x } else { w };
        let wmax = (w - 2.0 * self.c_margin) * 1000.0 / self.font_size;
        let s: Vec<u8> = text.bytes().filter(|&b| b != b'\r').collect();
        let mut nb = s.len();
        if nb > 0 && s[nb - 1] == b'\n' {
            nb -= 1;
        }

        // First line gets the top edge, the last one the bottom edge
        let b2 = border & (Border::LEFT | Border::RIGHT);
        let mut b = if border.contains(Border::TOP) { b2 | Border::TOP } else { b2 };
        let line = |b: Border| CellOptions {
            border: b,
            ln: LineBreak::Below,
            align,
            fill,
            link: None,
        };

        let mut sep: Option<usize> = None;
        let (mut i, mut j, mut ns, mut nl) = (0usize, 0usize, 0usize, 1usize);
        let (mut l, mut ls) = (0.0f64, 0.0f64);
        while i < nb {
            let c = s[i];
            if c == b'\n' {
                self.reset_word_spacing()?;
                self.cell_bytes(w, h, &s[j..i], &line(b))?;
                i += 1;
                sep = None;
                j = i;
                l = 0.0;
                ns = 0;
                nl += 1;
                if !border.is_empty() && nl == 2 {
                    b = b2;
                }
                continue;
            }
            if c == b' ' {
                sep = Some(i);
                ls = l;
                ns += 1;
            }
            l += cw[c as usize] as f64;
            if l > wmax {
                match sep {
                    None => {
                        if i == j {
                            i += 1;
                        }
                        self.reset_word_spacing()?;
                        self.cell_bytes(w, h, &s[j..i], &line(b))?;
                    },
                    Some(space) => {
                        if align == Align::Justify {
                            self.ws = if ns > 1 {
                                (wmax - ls) / 1000.0 * self.font_size / (ns - 1) as f64
                            } else {
                                0.0
                            };
                            self.out(ContentStreamOp::SetWordSpacing(self.ws * self.k))?;
                        }
                        self.cell_bytes(w, h, &s[j..space], &line(b))?;
                        i = space + 1;
                    },
                }
                sep = None;
                j = i;
                l = 0.0;
                ns = 0;
                nl += 1;
                if !border.is_empty() && nl == 2 {
                    b = b2;
                }
            } else {
                i += 1;
            }
        }
        self.reset_word_spacing()?;
        if border.contains(Border::BOTTOM) {
            b |= Border::BOTTOM;
        }
        self.cell_bytes(w, h, &s[j..i], &line(b))?;
        self.x = self.left_margin;
        Ok(())
    }

    fn reset_word_spacing(&mut self) -> Result<()> {
        if self.ws > 0.0 {
            self.ws = 0.0;
            self.out(ContentStreamOp::ResetWordSpacing)?;
        }
        Ok(())
    }

    /// Print flowing text from the current position, wrapping at the right
    /// margin and continuing from the left margin. Lines are `h` high.
    pub fn write(&mut self, h: f64, text: &str, link: Option<LinkTarget>) -> Result<()> {
        let cw = self.current_font()?.def.cw.clone();
        let mut w = self.w - self.right_margin - self.x;
        let mut wmax = (w - 2.0 * self.c_margin) * 1000.0 / self.font_size;
        let s: Vec<u8> = text.bytes().filter(|&b| b != b'\r').collect();
        let nb = s.len();
        let line = CellOptions {
            ln: LineBreak::Below,
            link: link.clone(),
            ..CellOptions::default()
        };

        let mut sep: Option<usize> = None;
        let (mut i, mut j, mut nl) = (0usize, 0usize, 1usize);
        let mut l = 0.0f64;
        while i < nb {
            let c = s[i];
            if c == b'\n' {
                self.cell_bytes(w, h, &s[j..i], &line)?;
                i += 1;
                sep = None;
                j = i;
                l = 0.0;
                if nl == 1 {
                    self.x = self.left_margin;
                    w = self.w - self.right_margin - self.x;
                    wmax = (w - 2.0 * self.c_margin) * 1000.0 / self.font_size;
                }
                nl += 1;
                continue;
            }
            if c == b' ' {
                sep = Some(i);
            }
            l += cw[c as usize] as f64;
            if l > wmax {
                match sep {
                    None => {
                        if self.x > self.left_margin {
                            // Start over on the next line at the margin
                            self.x = self.left_margin;
                            self.y += h;
                            w = self.w - self.right_margin - self.x;
                            wmax = (w - 2.0 * self.c_margin) * 1000.0 / self.font_size;
                            i += 1;
                            nl += 1;
                            continue;
                        }
                        if i == j {
                            i += 1;
                        }
                        self.cell_bytes(w, h, &s[j..i], &line)?;
                    },
                    Some(space) => {
                        self.cell_bytes(w, h, &s[j..space], &line)?;
                        i = space + 1;
                    },
                }
                sep = None;
                j = i;
                l = 0.0;
                if nl == 1 {
                    self.x = self.left_margin;
                    w = self.w - self.right_margin - self.x;
                    wmax = (w - 2.0 * self.c_margin) * 1000.0 / self.font_size;
                }
                nl += 1;
            } else {
                i += 1;
            }
        }
        if i != j {
            let last = CellOptions {
                link,
                ..CellOptions::default()
            };
            self.cell_bytes(l / 1000.0 * self.font_size, h, &s[j..], &last)?;
        }
        Ok(())
    }

    /// Line feed: back to the left margin and down by `h`, or by the
    /// height of the last cell.
    pub fn ln(&mut self, h: Option<f64>) {
        self.x = self.left_margin;
        self.y += h.unwrap_or(self.lasth);
    }
}
