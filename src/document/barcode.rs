//! One-dimensional barcodes drawn as filled rectangles.
//!
//! Symbols are encoded by `barcoders` into a module pattern (1 = bar,
//! 0 = space). Adjacent bar modules are merged into a single rectangle, so
//! the content stream carries one `re f` per visible bar. Bars use the
//! current fill colour.

use super::Document;
use crate::error::{Error, Result};
use crate::writer::content_stream::{ContentStreamBuilder, PaintStyle};

/// Supported barcode symbologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeType {
    /// Code 128, character set B unless the data starts with a set selector
    Code128,
    /// Code 39 (alphanumeric)
    Code39,
    /// Code 93 (alphanumeric, compact)
    Code93,
    /// EAN-13 (12 digits, check digit appended)
    Ean13,
    /// EAN-8 (7 digits, check digit appended)
    Ean8,
    /// UPC-A (11 or 12 digits)
    UpcA,
    /// Interleaved 2 of 5 (even digit count)
    Itf,
    /// Codabar
    Codabar,
}

impl std::fmt::Display for BarcodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BarcodeType::Code128 => write!(f, "Code 128"),
            BarcodeType::Code39 => write!(f, "Code 39"),
            BarcodeType::Code93 => write!(f, "Code 93"),
            BarcodeType::Ean13 => write!(f, "EAN-13"),
            BarcodeType::Ean8 => write!(f, "EAN-8"),
            BarcodeType::UpcA => write!(f, "UPC-A"),
            BarcodeType::Itf => write!(f, "ITF"),
            BarcodeType::Codabar => write!(f, "Codabar"),
        }
    }
}

/// Where and how large to draw a barcode.
///
/// The width is shared evenly between the symbol's modules. Without a
/// height the barcode is a third as tall as it is wide. Without `y` it is
/// drawn at the current position, which then moves below it.
#[derive(Debug, Clone, PartialEq)]
pub struct BarcodePlacement {
    /// Left edge; the current x when `None`
    pub x: Option<f64>,
    /// Top edge; flowing mode when `None`
    pub y: Option<f64>,
    /// Total width in user units
    pub w: f64,
    /// Bar height in user units
    pub h: Option<f64>,
}

impl BarcodePlacement {
    /// Flowing placement with the given total width.
    pub fn new(w: f64) -> Self {
        Self {
            x: None,
            y: None,
            w,
            h: None,
        }
    }

    /// Fixed position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Explicit bar height.
    pub fn height(mut self, h: f64) -> Self {
        self.h = Some(h);
        self
    }
}

/// Encode `data` into its module pattern.
pub fn encode(kind: BarcodeType, data: &str) -> Result<Vec<u8>> {
    use barcoders::sym::codabar::Codabar;
    use barcoders::sym::code128::Code128;
    use barcoders::sym::code39::Code39;
    use barcoders::sym::code93::Code93;
    use barcoders::sym::ean13::EAN13;
    use barcoders::sym::ean8::EAN8;
    use barcoders::sym::tf::TF;

    let fail = |e: barcoders::error::Error| Error::Barcode(format!("{} encoding error: {}", kind, e));
    let modules = match kind {
        BarcodeType::Code128 => {
            // À, Ɓ and Ć select character sets A, B and C
            let data = if data.starts_with(|c: char| matches!(c, '\u{00C0}' | '\u{0181}' | '\u{0106}')) {
                data.to_string()
            } else {
                format!("\u{0181}{}", data)
            };
            Code128::new(data).map_err(fail)?.encode()
        },
        BarcodeType::Code39 => Code39::new(data).map_err(fail)?.encode(),
        BarcodeType::Code93 => Code93::new(data).map_err(fail)?.encode(),
        BarcodeType::Ean13 => EAN13::new(data).map_err(fail)?.encode(),
        BarcodeType::Ean8 => EAN8::new(data).map_err(fail)?.encode(),
        BarcodeType::UpcA => {
            // UPC-A is EAN-13 with a leading zero; a given check digit is recomputed
            let digits = match data.len() {
                11 => data,
                12 => &data[..11],
                _ => return Err(Error::Barcode("UPC-A requires 11 or 12 digits".to_string())),
            };
            EAN13::new(format!("0{}", digits)).map_err(fail)?.encode()
        },
        BarcodeType::Itf => TF::interleaved(data).map_err(fail)?.encode(),
        BarcodeType::Codabar => Codabar::new(data).map_err(fail)?.encode(),
    };
    Ok(modules)
}

/// Runs of bar modules as `(first module, length)`.
fn bar_runs(modules: &[u8]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &m) in modules.iter().enumerate() {
        match (m != 0, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - s));
                start = None;
            },
            _ => {},
        }
    }
    if let Some(s) = start {
        runs.push((s, modules.len() - s));
    }
    runs
}

impl Document {
    /// Draw a one-dimensional barcode.
    pub fn barcode(&mut self, data: &str, kind: BarcodeType, placement: &BarcodePlacement) -> Result<()> {
        if placement.w <= 0.0 {
            return Err(Error::Barcode(format!("{} barcode has no width", kind)));
        }
        let modules = encode(kind, data)?;
        if modules.is_empty() {
            return Err(Error::Barcode(format!("{} produced no modules for {:?}", kind, data)));
        }
        let h = placement.h.unwrap_or(placement.w / 3.0);
        let x = placement.x.unwrap_or(self.x);
        let y = placement.y.unwrap_or(self.y);

        let module = placement.w / modules.len() as f64;
        let k = self.k;
        for (start, len) in bar_runs(&modules) {
            let bx = x + start as f64 * module;
            let mut b = ContentStreamBuilder::new();
            b.rect(bx * k, (self.h - y) * k, len as f64 * module * k, -h * k, PaintStyle::Fill);
            self.out_builder(&b)?;
        }
        if placement.y.is_none() {
            self.y += h;
        }
        log::debug!("Drew {} barcode for {:?} ({} modules)", kind, data, modules.len());
        Ok(())
    }
}
