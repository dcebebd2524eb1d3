//! Colours, lines, rectangles, rotation and image placement.

use super::Document;
use crate::error::{Error, Result};
use crate::images::ImageFormat;
use crate::writer::content_stream::{Color, ContentStreamBuilder, ContentStreamOp, PaintStyle};
use crate::writer::serializer::LinkTarget;

/// Where and how large to draw an image.
///
/// Zero width and height place the image at 96 dpi. A negative value is a
/// resolution in dpi. When only one dimension is zero it follows from the
/// other and the aspect ratio. Without `y` the image flows: it is placed at
/// the current position, which then moves below it, breaking the page if
/// needed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagePlacement {
    /// Left edge; the current x when `None`
    pub x: Option<f64>,
    /// Top edge; flowing mode when `None`
    pub y: Option<f64>,
    /// Width in user units
    pub w: f64,
    /// Height in user units
    pub h: f64,
    /// Clickable target covering the image
    pub link: Option<LinkTarget>,
}

impl ImagePlacement {
    /// Flowing placement at 96 dpi.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Explicit size; see the type documentation for zero and negative values.
    pub fn size(mut self, w: f64, h: f64) -> Self {
        self.w = w;
        self.h = h;
        self
    }

    /// Make the image a link.
    pub fn link(mut self, target: LinkTarget) -> Self {
        self.link = Some(target);
        self
    }
}

impl Document {
    /// Colour for stroking operations.
    pub fn set_draw_color(&mut self, color: Color) -> Result<()> {
        self.draw_color = color;
        if self.page_no() > 0 {
            self.out(ContentStreamOp::SetStrokeColor(color))?;
        }
        Ok(())
    }

    /// Colour for filling operations.
    pub fn set_fill_color(&mut self, color: Color) -> Result<()> {
        self.fill_color = color;
        self.color_flag = self.fill_color != self.text_color;
        if self.page_no() > 0 {
            self.out(ContentStreamOp::SetFillColor(color))?;
        }
        Ok(())
    }

    /// Colour for text. Applied per text operation, nothing is emitted here.
    pub fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
        self.color_flag = self.fill_color != self.text_color;
    }

    /// Line width in user units.
    pub fn set_line_width(&mut self, width: f64) -> Result<()> {
        self.line_width = width;
        if self.page_no() > 0 {
            self.out(ContentStreamOp::SetLineWidth(width * self.k))?;
        }
        Ok(())
    }

    /// Draw a line between two points.
    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) -> Result<()> {
        let (k, h) = (self.k, self.h);
        let mut b = ContentStreamBuilder::new();
        b.line(x1 * k, (h - y1) * k, x2 * k, (h - y2) * k);
        self.out_builder(&b)
    }

    /// Draw a rectangle with its top-left corner at `(x, y)`.
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: PaintStyle) -> Result<()> {
        let k = self.k;
        let mut b = ContentStreamBuilder::new();
        b.rect(x * k, (self.h - y) * k, w * k, -h * k, style);
        self.out_builder(&b)
    }

    /// Rotate subsequent content by `angle` degrees around a point
    /// (the current position by default).
    ///
    /// The rotation lasts until the next call or the end of the page. An
    /// angle of 0 just ends the previous rotation.
    pub fn rotate_content(&mut self, angle: f64, x: Option<f64>, y: Option<f64>) -> Result<()> {
        let x = x.unwrap_or(self.x);
        let y = y.unwrap_or(self.y);
        if self.content_angle != 0.0 {
            self.out(ContentStreamOp::RestoreState)?;
        }
        self.content_angle = angle;
        if angle != 0.0 {
            let mut b = ContentStreamBuilder::new();
            b.op(ContentStreamOp::SaveState).op(ContentStreamOp::Rotate {
                degrees: angle,
                cx: x * self.k,
                cy: (self.h - y) * self.k,
            });
            self.out_builder(&b)?;
        }
        Ok(())
    }

    /// Draw an image file, detecting the format from its extension.
    pub fn image(&mut self, path: &str, placement: &ImagePlacement) -> Result<()> {
        self.image_with_format(path, None, placement)
    }

    /// Draw an image file of an explicit format.
    ///
    /// Each path is decoded once; later calls reuse the cached image.
    pub fn image_with_format(
        &mut self,
        path: &str,
        format: Option<ImageFormat>,
        placement: &ImagePlacement,
    ) -> Result<()> {
        if self.state == super::DocumentState::Closed {
            return Err(Error::DocumentClosed);
        }
        if path.is_empty() {
            return Err(Error::MissingImageFile(String::new()));
        }
        let image = self.images.register_file(path, format)?;
        let found = (image.index, image.info.width, image.info.height, image.info.has_alpha());
        self.place_image(found, placement)
    }

    /// Draw in-memory image bytes, cached under `key`.
    pub fn image_bytes(
        &mut self,
        key: &str,
        bytes: &[u8],
        format: ImageFormat,
        placement: &ImagePlacement,
    ) -> Result<()> {
        if self.state == super::DocumentState::Closed {
            return Err(Error::DocumentClosed);
        }
        let image = self.images.register_bytes(key, bytes, format)?;
        let found = (image.index, image.info.width, image.info.height, image.info.has_alpha());
        self.place_image(found, placement)
    }

    fn place_image(
        &mut self,
        (index, px_w, px_h, alpha): (usize, u32, u32, bool),
        placement: &ImagePlacement,
    ) -> Result<()> {
        if alpha {
            self.require_version("1.4");
        }
        let k = self.k;
        let (px_w, px_h) = (px_w as f64, px_h as f64);

        let (mut w, mut h) = (placement.w, placement.h);
        if w == 0.0 && h == 0.0 {
            w = -96.0;
            h = -96.0;
        }
        if w < 0.0 {
            w = -px_w * 72.0 / w / k;
        }
        if h < 0.0 {
            h = -px_h * 72.0 / h / k;
        }
        if w == 0.0 {
            w = h * px_w / px_h;
        }
        if h == 0.0 {
            h = w * px_h / px_w;
        }

        let y = match placement.y {
            Some(y) => y,
            None => {
                if self.needs_page_break(h) {
                    let x = self.x;
                    self.break_page()?;
                    self.x = x;
                }
                let y = self.y;
                self.y += h;
                y
            },
        };
        let x = placement.x.unwrap_or(self.x);

        let mut b = ContentStreamBuilder::new();
        b.image(&format!("I{}", index), w * k, h * k, x * k, (self.h - (y + h)) * k);
        self.out_builder(&b)?;
        if let Some(target) = &placement.link {
            self.link(target.clone(), x, y, w, h)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DocumentConfig, Unit};
    use crate::writer::pdf_writer::compress_data;

    fn doc() -> Document {
        let mut d = Document::new(DocumentConfig::new().with_unit(Unit::Pt).with_compress(false)).unwrap();
        d.add_page().unwrap();
        d
    }

    fn last_line(d: &Document) -> String {
        let text = String::from_utf8_lossy(&d.pages.last().unwrap().content).to_string();
        text.lines().last().unwrap_or_default().to_string()
    }

    /// 2x1 8-bit gray PNG, built by hand.
    fn gray_png() -> Vec<u8> {
        fn chunk(out: &mut Vec<u8>, ty: &[u8; 4], payload: &[u8]) {
            out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
            out.extend_from_slice(ty);
            out.extend_from_slice(payload);
            let mut crc = crc32fast::Hasher::new();
            crc.update(ty);
            crc.update(payload);
            out.extend_from_slice(&crc.finalize().to_be_bytes());
        }
        let mut out = crate::images::png::PNG_SIGNATURE.to_vec();
        chunk(&mut out, b"IHDR", &[0, 0, 0, 2, 0, 0, 0, 1, 8, 0, 0, 0, 0]);
        chunk(&mut out, b"IDAT", &compress_data(&[0, 0, 255]).unwrap());
        chunk(&mut out, b"IEND", &[]);
        out
    }

    #[test]
    fn test_colors() {
        let mut d = doc();
        d.set_draw_color(Color::rgb(255.0, 0.0, 0.0)).unwrap();
        assert_eq!(last_line(&d), "1.000 0.000 0.000 RG");
        d.set_text_color(Color::gray(128.0));
        assert!(d.color_flag);
        d.set_fill_color(Color::gray(128.0)).unwrap();
        assert!(!d.color_flag);
        assert_eq!(last_line(&d), "0.502 g");
    }

    #[test]
    fn test_line_and_rect() {
        let mut d = doc();
        d.line(10.0, 20.0, 30.0, 40.0).unwrap();
        assert_eq!(last_line(&d), "10.00 821.89 m 30.00 801.89 l S");
        d.rect(10.0, 20.0, 100.0, 50.0, PaintStyle::parse("F")).unwrap();
        assert_eq!(last_line(&d), "10.00 821.89 100.00 -50.00 re f");
    }

    #[test]
    fn test_rotation_closed_at_page_end() {
        let mut d = doc();
        d.rotate_content(90.0, Some(100.0), Some(100.0)).unwrap();
        assert!(last_line(&d).starts_with("q 0.00000 1.00000 -1.00000 0.00000 100.00 741.89 cm"));
        d.add_page().unwrap();
        let first = String::from_utf8_lossy(&d.pages[0].content).to_string();
        assert!(first.ends_with("cm\nQ\n"));
        assert_eq!(d.content_angle, 0.0);
    }

    #[test]
    fn test_image_sizing_at_96_dpi() {
        let mut d = doc();
        d.image_bytes("gray", &gray_png(), ImageFormat::Png, &ImagePlacement::new().at(0.0, 0.0))
            .unwrap();
        assert_eq!(last_line(&d), "q 1.50 0 0 0.75 0.00 841.14 cm /I1 Do Q");

        d.image_bytes("gray", &[], ImageFormat::Png, &ImagePlacement::new().at(0.0, 0.0).size(20.0, 0.0))
            .unwrap();
        assert_eq!(last_line(&d), "q 20.00 0 0 10.00 0.00 831.89 cm /I1 Do Q");
        assert_eq!(d.images.len(), 1);
    }

    #[test]
    fn test_flowing_image_moves_cursor() {
        let mut d = doc();
        let y0 = d.y();
        d.image_bytes("gray", &gray_png(), ImageFormat::Png, &ImagePlacement::new().size(0.0, 30.0))
            .unwrap();
        assert_eq!(d.y(), y0 + 30.0);
    }

    #[test]
    fn test_empty_image_path() {
        let mut d = doc();
        assert!(matches!(
            d.image("", &ImagePlacement::new()),
            Err(Error::MissingImageFile(_))
        ));
    }
}
