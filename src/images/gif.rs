//! GIF support through PNG re-encoding.
//!
//! The first frame is decoded with the `image` crate, written back out as a
//! non-interlaced PNG in memory and handed to the PNG decoder.

use super::ImageInfo;
use crate::error::{Error, Result};

/// Decode a GIF by converting it to PNG.
#[cfg(feature = "gif")]
pub fn parse(data: &[u8], source: &str) -> Result<ImageInfo> {
    use image::DynamicImage;
    use std::io::Cursor;

    let decoded = image::load_from_memory_with_format(data, image::ImageFormat::Gif).map_err(|e| {
        Error::ImageDecode {
            file: source.to_string(),
            reason: e.to_string(),
        }
    })?;

    // GIF decodes to RGBA; drop alpha when no pixel is transparent
    let rgba = decoded.to_rgba8();
    let image = if rgba.pixels().all(|p| p[3] == 255) {
        DynamicImage::ImageRgb8(decoded.to_rgb8())
    } else {
        DynamicImage::ImageRgba8(rgba)
    };

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| Error::ImageDecode {
            file: source.to_string(),
            reason: e.to_string(),
        })?;
    log::trace!("Re-encoded GIF {} as {} bytes of PNG", source, png.get_ref().len());

    super::png::parse(png.get_ref().as_slice(), source)
}

/// GIF support was not compiled in.
#[cfg(not(feature = "gif"))]
pub fn parse(_data: &[u8], _source: &str) -> Result<ImageInfo> {
    Err(Error::MissingCapability("GIF decoding (enable the `gif` feature)"))
}
