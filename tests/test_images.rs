//! Integration tests for image embedding.
//!
//! Tests cover:
//! - PNG chroma keys, palettes and alpha channels
//! - Soft mask planes and the PDF 1.4 version bump
//! - Placement geometry at 96 dpi and in flowing mode
//! - Decoding each source once
//! - JPEG pass-through from disk and GIF conversion

use flate2::read::ZlibDecoder;
use pdf_quill::images::{self, ColorSpace};
use pdf_quill::writer::compress_data;
use pdf_quill::{Document, DocumentConfig, ErrorKind, ImageFormat, ImagePlacement, Unit};
use std::io::Read;

const PNG_SIGNATURE: [u8; 8] = [137, b'P', b'N', b'G', 13, 10, 26, 10];

fn plain_document() -> Document {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut doc = Document::new(DocumentConfig::new().with_unit(Unit::Pt).with_compress(false)).unwrap();
    doc.add_page().unwrap();
    doc
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn chunk(out: &mut Vec<u8>, ty: &[u8; 4], payload: &[u8]) {
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(ty);
    out.extend_from_slice(payload);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(ty);
    hasher.update(payload);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Build an 8-bit PNG from unfiltered scanlines.
fn build_png(width: u32, height: u32, ct: u8, rows: &[Vec<u8>], extra: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.extend_from_slice(&[8, ct, 0, 0, 0]);
    chunk(&mut out, b"IHDR", &ihdr);
    for (ty, payload) in extra {
        chunk(&mut out, ty, payload);
    }
    let raw: Vec<u8> = rows
        .iter()
        .flat_map(|row| std::iter::once(0u8).chain(row.iter().copied()))
        .collect();
    chunk(&mut out, b"IDAT", &compress_data(&raw).unwrap());
    chunk(&mut out, b"IEND", &[]);
    out
}

fn inflate(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
    out
}

/// SOI, SOF0 with the given geometry, EOI.
fn minimal_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut d = vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 17, 8];
    d.extend_from_slice(&height.to_be_bytes());
    d.extend_from_slice(&width.to_be_bytes());
    d.push(3);
    for c in 1..=3u8 {
        d.extend_from_slice(&[c, 0x11, 0]);
    }
    d.extend_from_slice(&[0xFF, 0xD9]);
    d
}

#[test]
fn test_gray_png_with_chroma_key() {
    let png = build_png(2, 1, 0, &[vec![10, 255]], &[(b"tRNS", vec![0, 255])]);
    let mut doc = plain_document();
    doc.image_bytes("gray", &png, ImageFormat::Png, &ImagePlacement::new().at(10.0, 10.0))
        .unwrap();
    let s = text(&doc.into_bytes().unwrap());

    assert!(s.starts_with("%PDF-1.3"));
    assert!(s.contains("/Mask [255 255]"));
    assert!(!s.contains("/SMask"));
    assert!(s.contains("/ColorSpace /DeviceGray"));
    assert!(s.contains("/DecodeParms <</BitsPerComponent 8 /Colors 1 /Columns 2 /Predictor 15>>"));
    // Two pixels at 96 dpi
    assert!(s.contains("q 1.50 0 0 0.75 10.00 831.14 cm /I1 Do Q"));
}

#[test]
fn test_rgba_png_gets_soft_mask() {
    let rows = vec![vec![255, 0, 0, 255, 0, 255, 0, 128], vec![0, 0, 255, 0, 9, 9, 9, 255]];
    let png = build_png(2, 2, 6, &rows, &[]);

    let info = images::decode("rgba.png", png.clone(), ImageFormat::Png).unwrap();
    assert_eq!(info.color_space, ColorSpace::DeviceRGB);
    let color = inflate(&info.data);
    let alpha = inflate(info.soft_mask.as_ref().unwrap());
    assert_eq!(color.len(), (1 + 3 * 2) * 2);
    assert_eq!(alpha, vec![0, 255, 128, 0, 0, 255]);
    assert_eq!(&color[1..7], &[255, 0, 0, 0, 255, 0]);

    let mut doc = plain_document();
    doc.image_bytes("rgba", &png, ImageFormat::Png, &ImagePlacement::new().at(0.0, 0.0).size(20.0, 0.0))
        .unwrap();
    assert_eq!(doc.pdf_version(), "1.4");
    let s = text(&doc.into_bytes().unwrap());

    assert!(s.starts_with("%PDF-1.4"));
    assert!(s.contains("/SMask "));
    assert!(s.contains("/Group <</CS /DeviceRGB /S /Transparency /Type /Group>>"));
    // Soft mask is a gray image of the same size
    assert_eq!(s.matches("/Subtype /Image").count(), 2);
    assert!(s.contains("q 20.00 0 0 20.00 0.00 821.89 cm /I1 Do Q"));
}

#[test]
fn test_indexed_png_palette() {
    let palette = vec![255, 0, 0, 0, 0, 255];
    let png = build_png(
        2,
        1,
        3,
        &[vec![0, 1]],
        &[(b"PLTE", palette.clone()), (b"tRNS", vec![0])],
    );
    let mut doc = plain_document();
    doc.image_bytes("pal", &png, ImageFormat::Png, &ImagePlacement::new().at(0.0, 0.0))
        .unwrap();
    let s = text(&doc.into_bytes().unwrap());

    // Image follows the page pair, palette stream right after it
    assert!(s.contains("5 0 obj\n<</BitsPerComponent 8 /ColorSpace [/Indexed /DeviceRGB 1 6 0 R]"));
    assert!(s.contains("/Mask [0 0]"));
    assert!(s.contains("6 0 obj\n<</Length 6>>\nstream\n"));
}

#[test]
fn test_image_decoded_once() {
    let png = build_png(1, 1, 2, &[vec![1, 2, 3]], &[]);
    let mut doc = plain_document();
    doc.image_bytes("logo", &png, ImageFormat::Png, &ImagePlacement::new().at(0.0, 0.0))
        .unwrap();
    doc.image_bytes("logo", &[], ImageFormat::Png, &ImagePlacement::new().at(50.0, 0.0))
        .unwrap();
    let s = text(&doc.into_bytes().unwrap());

    assert_eq!(s.matches("/Subtype /Image").count(), 1);
    assert_eq!(s.matches("/I1 Do").count(), 2);
    assert!(s.contains("/XObject <</I1 "));
}

#[test]
fn test_flowing_placement_advances_y() {
    let png = build_png(2, 1, 0, &[vec![0, 0]], &[]);
    let mut doc = plain_document();
    doc.set_xy(20.0, 100.0);
    doc.image_bytes("flow", &png, ImageFormat::Png, &ImagePlacement::new().size(30.0, 0.0))
        .unwrap();
    assert_eq!(doc.y(), 115.0);

    // Negative size is a resolution
    doc.image_bytes("flow", &[], ImageFormat::Png, &ImagePlacement::new().size(-72.0, 0.0))
        .unwrap();
    assert_eq!(doc.y(), 116.0);
}

#[test]
fn test_flowing_image_breaks_page() {
    let png = build_png(1, 1, 0, &[vec![0]], &[]);
    let mut doc = plain_document();
    doc.set_y(800.0, false);
    doc.image_bytes("tall", &png, ImageFormat::Png, &ImagePlacement::new().size(100.0, 100.0))
        .unwrap();
    assert_eq!(doc.page_no(), 2);
}

#[test]
fn test_jpeg_file_pass_through() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("photo.jpg");
    std::fs::write(&path, minimal_jpeg(64, 32)).unwrap();
    let path = path.to_str().unwrap();

    let mut doc = plain_document();
    doc.image(path, &ImagePlacement::new().at(0.0, 0.0).size(64.0, 32.0)).unwrap();
    let s = text(&doc.into_bytes().unwrap());

    assert!(s.contains("/Filter /DCTDecode"));
    assert!(s.contains("/Width 64"));
    assert!(s.contains("/Height 32"));
    assert!(s.contains("/ColorSpace /DeviceRGB"));
    assert!(!s.contains("/DecodeParms"));
}

#[test]
fn test_image_errors() {
    let dir = tempfile::tempdir().unwrap();
    let jpeg = dir.path().join("photo.jpg");
    std::fs::write(&jpeg, minimal_jpeg(1, 1)).unwrap();
    let placement = ImagePlacement::new().at(0.0, 0.0);

    let mut doc = plain_document();
    let missing = dir.path().join("missing.png");
    let err = doc.image(missing.to_str().unwrap(), &placement).unwrap_err();
    assert!(matches!(err, pdf_quill::Error::MissingImageFile(_)));
    assert_eq!(err.kind(), ErrorKind::Image);

    assert!(matches!(
        doc.image("picture.bmp", &placement),
        Err(pdf_quill::Error::UnsupportedImageType(_))
    ));
    assert!(matches!(
        doc.image("picture", &placement),
        Err(pdf_quill::Error::MissingImageType(_))
    ));
    assert!(matches!(
        doc.image_with_format(jpeg.to_str().unwrap(), Some(ImageFormat::Png), &placement),
        Err(pdf_quill::Error::NotAPngFile(_))
    ));
}

#[cfg(feature = "gif")]
#[test]
fn test_gif_converted_to_png() {
    let img = image::RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 0]).unwrap();
    let mut gif = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut gif, image::ImageFormat::Gif)
        .unwrap();

    let mut doc = plain_document();
    doc.image_bytes("anim", gif.get_ref(), ImageFormat::Gif, &ImagePlacement::new().at(0.0, 0.0))
        .unwrap();
    let s = text(&doc.into_bytes().unwrap());

    assert!(s.contains("/Filter /FlateDecode"));
    assert!(s.contains("/Predictor 15"));
    assert!(s.contains("/Subtype /Image"));
}
