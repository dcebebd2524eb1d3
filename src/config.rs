//! Configuration for document generation.
//!
//! Everything that used to be process-wide (font search path, compression,
//! default page geometry) is carried by [`DocumentConfig`] and handed to the
//! document at construction time.

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// User unit for coordinates and dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    /// Point (1/72 inch)
    Pt,
    /// Millimeter
    #[default]
    Mm,
    /// Centimeter
    Cm,
    /// Inch
    In,
}

impl Unit {
    /// Number of points in one user unit.
    pub fn scale_factor(self) -> f64 {
        match self {
            Unit::Pt => 1.0,
            Unit::Mm => 72.0 / 25.4,
            Unit::Cm => 72.0 / 2.54,
            Unit::In => 72.0,
        }
    }
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pt" => Ok(Unit::Pt),
            "mm" => Ok(Unit::Mm),
            "cm" => Ok(Unit::Cm),
            "in" => Ok(Unit::In),
            _ => Err(Error::InvalidUnit(s.to_string())),
        }
    }
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Height greater than width
    #[default]
    Portrait,
    /// Width greater than height
    Landscape,
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "p" | "portrait" => Ok(Orientation::Portrait),
            "l" | "landscape" => Ok(Orientation::Landscape),
            _ => Err(Error::InvalidOrientation(s.to_string())),
        }
    }
}

/// Page size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSize {
    /// 297 x 420 mm
    A3,
    /// 210 x 297 mm
    #[default]
    A4,
    /// 148 x 210 mm
    A5,
    /// 8.5 x 11 in
    Letter,
    /// 8.5 x 14 in
    Legal,
    /// Width and height in user units
    Custom(f64, f64),
}

impl PageSize {
    /// Portrait dimensions in user units for scale factor `k`.
    ///
    /// Custom sizes are normalized so that width <= height.
    pub fn dimensions(self, k: f64) -> Result<(f64, f64)> {
        let pt = |w: f64, h: f64| Ok((w / k, h / k));
        match self {
            PageSize::A3 => pt(841.89, 1190.55),
            PageSize::A4 => pt(595.28, 841.89),
            PageSize::A5 => pt(420.94, 595.28),
            PageSize::Letter => pt(612.0, 792.0),
            PageSize::Legal => pt(612.0, 1008.0),
            PageSize::Custom(w, h) => {
                if !(w > 0.0 && h > 0.0) {
                    return Err(Error::InvalidPageSize(format!("{}x{}", w, h)));
                }
                if w > h {
                    Ok((h, w))
                } else {
                    Ok((w, h))
                }
            },
        }
    }
}

impl FromStr for PageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "a3" => Ok(PageSize::A3),
            "a4" => Ok(PageSize::A4),
            "a5" => Ok(PageSize::A5),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            _ => Err(Error::InvalidPageSize(s.to_string())),
        }
    }
}

/// Zoom used by the viewer when the document is opened.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ZoomMode {
    /// Whole page visible
    FullPage,
    /// Page width fills the window
    FullWidth,
    /// Actual size
    Real,
    /// Viewer default
    #[default]
    Default,
    /// Zoom factor in percent
    Percent(f64),
}

impl FromStr for ZoomMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fullpage" => Ok(ZoomMode::FullPage),
            "fullwidth" => Ok(ZoomMode::FullWidth),
            "real" => Ok(ZoomMode::Real),
            "default" => Ok(ZoomMode::Default),
            _ => s
                .parse::<f64>()
                .ok()
                .filter(|p| *p > 0.0)
                .map(ZoomMode::Percent)
                .ok_or_else(|| Error::InvalidZoomMode(s.to_string())),
        }
    }
}

/// Page layout used by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    /// One page at a time
    Single,
    /// Pages in one continuous column
    Continuous,
    /// Two pages side by side
    Two,
    /// Viewer default
    #[default]
    Default,
}

impl FromStr for LayoutMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(LayoutMode::Single),
            "continuous" => Ok(LayoutMode::Continuous),
            "two" => Ok(LayoutMode::Two),
            "default" => Ok(LayoutMode::Default),
            _ => Err(Error::InvalidLayoutMode(s.to_string())),
        }
    }
}

/// Document construction settings.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    /// Default page orientation
    pub orientation: Orientation,
    /// User unit
    pub unit: Unit,
    /// Default page size
    pub page_size: PageSize,
    /// Directory holding font definitions and font programs
    pub font_path: PathBuf,
    /// Whether to compress streams
    pub compress: bool,
    /// PDF version written in the header (e.g., "1.3")
    pub pdf_version: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            unit: Unit::Mm,
            page_size: PageSize::A4,
            font_path: PathBuf::from("fonts"),
            compress: true,
            pdf_version: "1.3".to_string(),
        }
    }
}

impl DocumentConfig {
    /// Create a configuration with defaults (portrait, mm, A4, compressed).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set default orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Set user unit.
    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Set default page size.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the font directory.
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = path.into();
        self
    }

    /// Enable or disable stream compression.
    ///
    /// When enabled, content streams and palettes are compressed
    /// using FlateDecode (zlib/deflate).
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Set the minimum PDF version.
    pub fn with_pdf_version(mut self, version: impl Into<String>) -> Self {
        self.pdf_version = version.into();
        self
    }
}
