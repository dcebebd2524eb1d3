//! JPEG pass-through.
//!
//! The file is embedded unchanged with DCTDecode; only the frame header is
//! read, for dimensions, precision and component count.

use super::{ColorSpace, ImageFilter, ImageInfo};
use crate::error::{Error, Result};

/// Frame header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegHeader {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Sample precision
    pub precision: u8,
    /// Number of components
    pub components: u8,
}

/// Parse JPEG bytes into an embeddable image.
pub fn parse(data: Vec<u8>, source: &str) -> Result<ImageInfo> {
    match image::guess_format(&data) {
        Ok(image::ImageFormat::Jpeg) => {},
        Ok(_) => return Err(Error::NotAJpegFile(source.to_string())),
        Err(_) => return Err(Error::MissingImageFile(source.to_string())),
    }
    let header = parse_jpeg_header(&data).ok_or_else(|| Error::MissingImageFile(source.to_string()))?;

    let color_space = match header.components {
        3 => ColorSpace::DeviceRGB,
        4 => ColorSpace::DeviceCMYK,
        _ => ColorSpace::DeviceGray,
    };
    let bits_per_component = if header.precision == 0 { 8 } else { header.precision };

    Ok(ImageInfo {
        width: header.width,
        height: header.height,
        color_space,
        bits_per_component,
        filter: ImageFilter::DCTDecode,
        decode_parms: None,
        data,
        soft_mask: None,
        palette: Vec::new(),
        transparency: None,
    })
}

/// Find the first SOF marker and read its fields.
pub fn parse_jpeg_header(data: &[u8]) -> Option<JpegHeader> {
    if data.len() < 2 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = data[pos + 1];
        pos += 2;

        // Fill bytes and standalone markers carry no length
        if marker == 0xFF || marker == 0x00 || marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            continue;
        }

        // SOF markers (Start of Frame)
        if matches!(
            marker,
            0xC0 | 0xC1 | 0xC2 | 0xC3 | 0xC5 | 0xC6 | 0xC7 | 0xC9 | 0xCA | 0xCB | 0xCD | 0xCE | 0xCF
        ) {
            if pos + 8 > data.len() {
                return None;
            }
            return Some(JpegHeader {
                precision: data[pos + 2],
                height: u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as u32,
                width: u16::from_be_bytes([data[pos + 5], data[pos + 6]]) as u32,
                components: data[pos + 7],
            });
        }

        // Skip other markers
        if pos + 2 > data.len() {
            break;
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        pos += length;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SOI, an APP0 segment, SOF0 and EOI.
    fn minimal_jpeg(components: u8) -> Vec<u8> {
        let mut d = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        d.extend_from_slice(b"JFIF\0");
        d.extend_from_slice(&[1, 1, 0, 0, 1, 0, 1, 0, 0]);
        d.extend_from_slice(&[0xFF, 0xC0, 0x00, 8 + 3 * components as u8, 8, 0x00, 0x20, 0x00, 0x40]);
        d.push(components);
        for c in 0..components {
            d.extend_from_slice(&[c + 1, 0x11, 0]);
        }
        d.extend_from_slice(&[0xFF, 0xD9]);
        d
    }

    #[test]
    fn test_header_fields() {
        let header = parse_jpeg_header(&minimal_jpeg(3)).unwrap();
        assert_eq!(header.width, 64);
        assert_eq!(header.height, 32);
        assert_eq!(header.precision, 8);
        assert_eq!(header.components, 3);
    }

    #[test]
    fn test_color_spaces() {
        let rgb = parse(minimal_jpeg(3), "a.jpg").unwrap();
        assert_eq!(rgb.color_space, ColorSpace::DeviceRGB);
        assert_eq!(rgb.filter, ImageFilter::DCTDecode);
        assert_eq!(rgb.data, minimal_jpeg(3));

        assert_eq!(parse(minimal_jpeg(4), "c.jpg").unwrap().color_space, ColorSpace::DeviceCMYK);
        assert_eq!(parse(minimal_jpeg(1), "g.jpg").unwrap().color_space, ColorSpace::DeviceGray);
    }

    #[test]
    fn test_not_a_jpeg() {
        let png = super::super::png::PNG_SIGNATURE.to_vec();
        assert!(matches!(parse(png, "x.jpg"), Err(Error::NotAJpegFile(_))));
        assert!(matches!(parse(b"garbage".to_vec(), "x.jpg"), Err(Error::MissingImageFile(_))));
    }
}
