//! PNG decoding.
//!
//! The chunk stream is scanned directly: IDAT payloads are concatenated and
//! embedded still compressed, since PDF's FlateDecode with predictor 15
//! understands PNG row filtering. Only images with an alpha channel are
//! inflated, to split color and alpha into separate planes.

use super::{ColorSpace, ImageFilter, ImageInfo, PredictorParams};
use crate::binary::ByteReader;
use crate::error::{Error, Result};
use crate::writer::pdf_writer::compress_data;
use flate2::read::ZlibDecoder;
use std::io::Read;

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, b'P', b'N', b'G', 13, 10, 26, 10];

/// Parse a PNG stream. `source` names the image in errors.
pub fn parse<R: Read>(input: R, source: &str) -> Result<ImageInfo> {
    let mut r = ByteReader::new(input);

    if r.read_array::<8>()? != PNG_SIGNATURE {
        return Err(Error::NotAPngFile(source.to_string()));
    }

    // IHDR must come first
    r.skip(4)?;
    if &r.read_array::<4>()? != b"IHDR" {
        return Err(Error::IncorrectPngFile(source.to_string()));
    }
    let width = r.read_u32()?;
    let height = r.read_u32()?;
    let bpc = r.read_u8()?;
    if bpc > 8 {
        return Err(Error::UnsupportedBitDepth {
            file: source.to_string(),
            depth: bpc,
        });
    }
    let ct = r.read_u8()?;
    let color_space = match ct {
        0 | 4 => ColorSpace::DeviceGray,
        2 | 6 => ColorSpace::DeviceRGB,
        3 => ColorSpace::Indexed,
        _ => {
            return Err(Error::UnsupportedColorType {
                file: source.to_string(),
                color_type: ct,
            })
        },
    };
    if r.read_u8()? != 0 {
        return Err(Error::UnsupportedCompression(source.to_string()));
    }
    if r.read_u8()? != 0 {
        return Err(Error::UnsupportedFilterMethod(source.to_string()));
    }
    if r.read_u8()? != 0 {
        return Err(Error::InterlacingNotSupported(source.to_string()));
    }
    // CRC
    r.skip(4)?;

    let colors = if color_space == ColorSpace::DeviceRGB { 3 } else { 1 };
    let decode_parms = PredictorParams::png(colors, bpc, width);

    let mut palette = Vec::new();
    let mut transparency = None;
    let mut data = Vec::new();
    loop {
        let n = r.read_u32()?;
        let chunk = r.read_array::<4>()?;
        match &chunk {
            b"PLTE" => {
                palette = r.read_bytes(u64::from(n))?;
                r.skip(4)?;
            },
            b"tRNS" => {
                let t = r.read_bytes(u64::from(n))?;
                transparency = chroma_key(ct, &t, source)?;
                r.skip(4)?;
            },
            b"IDAT" => {
                data.extend_from_slice(&r.read_bytes(u64::from(n))?);
                r.skip(4)?;
            },
            b"IEND" => break,
            _ => r.skip(n as u64 + 4)?,
        }
        if n == 0 {
            break;
        }
    }

    if color_space == ColorSpace::Indexed && palette.is_empty() {
        return Err(Error::MissingPalette(source.to_string()));
    }

    let mut info = ImageInfo {
        width,
        height,
        color_space,
        bits_per_component: bpc,
        filter: ImageFilter::FlateDecode,
        decode_parms: Some(decode_parms),
        data,
        soft_mask: None,
        palette,
        transparency,
    };

    if ct >= 4 {
        let raw = inflate(&info.data, source)?;
        let (color, alpha) = split_alpha(&raw, width as usize, height as usize, ct, source)?;
        info.data = compress_data(&color)?;
        info.soft_mask = Some(compress_data(&alpha)?);
        log::debug!("Extracted alpha plane from {} ({} rows)", source, height);
    }

    Ok(info)
}

/// Chroma-key entries from a tRNS payload.
///
/// Gray and RGB samples are 16-bit; only the low byte is kept. Indexed
/// images use the first fully transparent palette entry, so their tRNS
/// holds at most one alpha per palette slot.
fn chroma_key(ct: u8, t: &[u8], source: &str) -> Result<Option<Vec<u8>>> {
    Ok(match ct {
        0 => t.get(1).map(|g| vec![*g]),
        2 => match (t.get(1), t.get(3), t.get(5)) {
            (Some(r), Some(g), Some(b)) => Some(vec![*r, *g, *b]),
            _ => None,
        },
        _ => match t.iter().position(|&a| a == 0) {
            Some(pos) => {
                let index = u8::try_from(pos).map_err(|_| Error::ImageDecode {
                    file: source.to_string(),
                    reason: format!("tRNS has {} entries, a palette holds 256", t.len()),
                })?;
                Some(vec![index])
            },
            None => None,
        },
    })
}

fn inflate(data: &[u8], source: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::ImageDecode {
            file: source.to_string(),
            reason: e.to_string(),
        })?;
    Ok(out)
}

/// Split interleaved scanlines into a color plane and an alpha plane.
///
/// Each row's filter byte is copied to both planes so both keep the PNG
/// predictor layout.
pub fn split_alpha(
    raw: &[u8],
    width: usize,
    height: usize,
    ct: u8,
    source: &str,
) -> Result<(Vec<u8>, Vec<u8>)> {
    let (pixel, color_bytes): (usize, usize) = if ct == 4 { (2, 1) } else { (4, 3) };
    let overflow = || Error::ImageDecode {
        file: source.to_string(),
        reason: format!("{}x{} pixels exceed addressable memory", width, height),
    };
    let row_len = pixel
        .checked_mul(width)
        .and_then(|n| n.checked_add(1))
        .ok_or_else(overflow)?;
    let expected = row_len.checked_mul(height).ok_or_else(overflow)?;
    if raw.len() < expected {
        return Err(Error::ImageDecode {
            file: source.to_string(),
            reason: format!("expected {} bytes of pixel data, got {}", expected, raw.len()),
        });
    }

    // Both planes are smaller than `expected`, which fits in `raw`
    let mut color = Vec::with_capacity((1 + color_bytes * width) * height);
    let mut alpha = Vec::with_capacity((1 + width) * height);
    for row in raw.chunks_exact(row_len).take(height) {
        color.push(row[0]);
        alpha.push(row[0]);
        for px in row[1..].chunks_exact(pixel) {
            color.extend_from_slice(&px[..color_bytes]);
            alpha.push(px[color_bytes]);
        }
    }
    Ok((color, alpha))
}
