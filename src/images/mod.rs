//! Image decoding for PDF embedding.
//!
//! Images are represented as XObjects (PDF spec Section 8.9). Each decoder
//! normalizes its input into an [`ImageInfo`] ready to be written out.
//!
//! # Supported Formats
//!
//! - **PNG**: IDAT data embedded as is with FlateDecode and a PNG predictor;
//!   alpha channels are split into a soft mask
//! - **JPEG**: Pass-through embedding using DCTDecode filter
//! - **GIF**: Decoded and re-encoded as PNG (requires the `gif` feature)

pub mod gif;
pub mod jpeg;
pub mod png;

use crate::error::{Error, Result};
use crate::object::Object;
use crate::writer::object_serializer::ObjectSerializer;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG, embedded without re-encoding
    Jpeg,
    /// GIF, converted to PNG
    Gif,
}

impl ImageFormat {
    /// Parse an explicit type such as `"png"` or `"JPG"`.
    pub fn from_type(ty: &str) -> Result<Self> {
        match ty.to_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "gif" => Ok(ImageFormat::Gif),
            _ => Err(Error::UnsupportedImageType(ty.to_string())),
        }
    }

    /// Infer the format from a file extension.
    pub fn from_path(source: &str) -> Result<Self> {
        match Path::new(source).extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => Self::from_type(ext),
            _ => Err(Error::MissingImageType(source.to_string())),
        }
    }
}

/// Color space for image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Grayscale (1 component per pixel)
    DeviceGray,
    /// RGB color (3 components per pixel)
    DeviceRGB,
    /// CMYK color (4 components per pixel)
    DeviceCMYK,
    /// Palette lookup into DeviceRGB
    Indexed,
}

impl ColorSpace {
    /// Get the number of color components.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpace::DeviceGray | ColorSpace::Indexed => 1,
            ColorSpace::DeviceRGB => 3,
            ColorSpace::DeviceCMYK => 4,
        }
    }

    /// Get the PDF name for this color space.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRGB => "DeviceRGB",
            ColorSpace::DeviceCMYK => "DeviceCMYK",
            ColorSpace::Indexed => "Indexed",
        }
    }
}

/// Stream filter of the embedded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// zlib/deflate
    FlateDecode,
    /// Baseline or progressive JPEG
    DCTDecode,
}

impl ImageFilter {
    /// PDF filter name.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ImageFilter::FlateDecode => "FlateDecode",
            ImageFilter::DCTDecode => "DCTDecode",
        }
    }
}

/// `/DecodeParms` needed to undo PNG row filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictorParams {
    /// Always 15 (PNG optimum)
    pub predictor: u8,
    /// Color components per pixel
    pub colors: u8,
    /// Bits per component
    pub bits_per_component: u8,
    /// Pixels per row
    pub columns: u32,
}

impl PredictorParams {
    /// PNG predictor parameters for the given geometry.
    pub fn png(colors: u8, bits_per_component: u8, columns: u32) -> Self {
        Self {
            predictor: 15,
            colors,
            bits_per_component,
            columns,
        }
    }

    /// Build the `/DecodeParms` dictionary.
    pub fn to_object(&self) -> Object {
        ObjectSerializer::dict(vec![
            ("Predictor", ObjectSerializer::integer(self.predictor as i64)),
            ("Colors", ObjectSerializer::integer(self.colors as i64)),
            ("BitsPerComponent", ObjectSerializer::integer(self.bits_per_component as i64)),
            ("Columns", ObjectSerializer::integer(self.columns as i64)),
        ])
    }
}

/// A decoded image, normalized for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Color space
    pub color_space: ColorSpace,
    /// Bits per component
    pub bits_per_component: u8,
    /// Filter of `data`
    pub filter: ImageFilter,
    /// Predictor parameters for filtered PNG data
    pub decode_parms: Option<PredictorParams>,
    /// Encoded image data
    pub data: Vec<u8>,
    /// Compressed alpha plane, same predictor layout with one component
    pub soft_mask: Option<Vec<u8>>,
    /// RGB palette for indexed images
    pub palette: Vec<u8>,
    /// Chroma-key values: gray, RGB triple or palette index
    pub transparency: Option<Vec<u8>>,
}

impl ImageInfo {
    /// Whether the image carries a full alpha plane.
    pub fn has_alpha(&self) -> bool {
        self.soft_mask.is_some()
    }
}

/// Decode image bytes of a known format.
pub fn decode(source: &str, bytes: Vec<u8>, format: ImageFormat) -> Result<ImageInfo> {
    let info = match format {
        ImageFormat::Png => png::parse(bytes.as_slice(), source)?,
        ImageFormat::Jpeg => jpeg::parse(bytes, source)?,
        ImageFormat::Gif => gif::parse(&bytes, source)?,
    };
    log::debug!(
        "Decoded {:?} image {}: {}x{} {} {} bpc{}",
        format,
        source,
        info.width,
        info.height,
        info.color_space.pdf_name(),
        info.bits_per_component,
        if info.has_alpha() { " with alpha" } else { "" }
    );
    Ok(info)
}

/// A cached image and its resource index.
#[derive(Debug, Clone)]
pub struct RegisteredImage {
    /// 1-based resource index (`/I<i>`)
    pub index: usize,
    /// Decoded image
    pub info: ImageInfo,
}

impl RegisteredImage {
    /// Resource name without the slash, e.g. `I1`.
    pub fn resource_name(&self) -> String {
        format!("I{}", self.index)
    }
}

/// Image cache keyed by source; each source is decoded once.
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    images: IndexMap<String, RegisteredImage>,
}

impl ImageRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image file, decoding it on first use.
    ///
    /// The format comes from `format` or, failing that, the file extension.
    pub fn register_file(&mut self, path: &str, format: Option<ImageFormat>) -> Result<&RegisteredImage> {
        if let Some(i) = self.images.get_index_of(path) {
            return Ok(&self.images[i]);
        }
        let format = match format {
            Some(f) => f,
            None => ImageFormat::from_path(path)?,
        };
        let bytes = read_source(path)?;
        let info = decode(path, bytes, format)?;
        Ok(self.insert(path, info))
    }

    /// Register in-memory image bytes under `key`, decoding on first use.
    pub fn register_bytes(&mut self, key: &str, bytes: &[u8], format: ImageFormat) -> Result<&RegisteredImage> {
        if let Some(i) = self.images.get_index_of(key) {
            return Ok(&self.images[i]);
        }
        if bytes.is_empty() {
            return Err(Error::MissingImageFile(key.to_string()));
        }
        let info = decode(key, bytes.to_vec(), format)?;
        Ok(self.insert(key, info))
    }

    fn insert(&mut self, key: &str, info: ImageInfo) -> &RegisteredImage {
        let index = self.images.len() + 1;
        let (i, _) = self
            .images
            .insert_full(key.to_string(), RegisteredImage { index, info });
        &self.images[i]
    }

    /// Look up a cached image.
    pub fn get(&self, key: &str) -> Option<&RegisteredImage> {
        self.images.get(key)
    }

    /// Cached images in first-use order.
    pub fn images(&self) -> impl Iterator<Item = (&str, &RegisteredImage)> {
        self.images.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether any cached image has an alpha plane.
    pub fn any_alpha(&self) -> bool {
        self.images.values().any(|img| img.info.has_alpha())
    }

    /// Get the number of registered images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Check if any images are registered.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Read a whole image file; the handle is closed on every path.
fn read_source(path: &str) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|_| Error::MissingImageFile(path.to_string()))?;
    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|_| Error::MissingImageFile(path.to_string()))?;
    if bytes.is_empty() {
        return Err(Error::MissingImageFile(path.to_string()));
    }
    Ok(bytes)
}
