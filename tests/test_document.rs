//! Integration tests for whole-document generation.
//!
//! Tests cover:
//! - A single text cell producing a minimal, well-formed file
//! - Object layout: page pairs, shared fonts, trailer size
//! - Cross-reference offsets pointing at their objects
//! - Internal links, page-count alias, metadata, display modes
//! - Error propagation for undefined fonts and bad rotations
//! - Compressed content streams and writing to disk

use flate2::read::ZlibDecoder;
use pdf_quill::{
    Align, Border, CellOptions, Document, DocumentConfig, ErrorKind, LayoutMode, LineBreak,
    LinkTarget, Orientation, PageSize, Unit, ZoomMode,
};
use proptest::prelude::*;
use regex::bytes::Regex;
use std::io::Read;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Uncompressed document in points, so content streams can be inspected.
fn plain_document() -> Document {
    init_logging();
    Document::new(DocumentConfig::new().with_unit(Unit::Pt).with_compress(false)).unwrap()
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Highest `N 0 obj` number in the file.
fn max_object_number(pdf: &[u8]) -> u32 {
    let re = Regex::new(r"(?m)^(\d+) 0 obj").unwrap();
    re.captures_iter(pdf)
        .map(|c| std::str::from_utf8(&c[1]).unwrap().parse::<u32>().unwrap())
        .max()
        .unwrap_or(0)
}

/// Check that `startxref` and every in-use xref entry point at the right bytes.
fn assert_xref_consistent(pdf: &[u8]) {
    let startxref = Regex::new(r"startxref\n(\d+)\n%%EOF\n$").unwrap();
    let caps = startxref.captures(pdf).expect("missing startxref");
    let xref_at: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();
    assert!(pdf[xref_at..].starts_with(b"xref\n0 "));

    let header = Regex::new(r"xref\n0 (\d+)\n").unwrap();
    let size: usize = std::str::from_utf8(&header.captures(&pdf[xref_at..]).unwrap()[1])
        .unwrap()
        .parse()
        .unwrap();

    let entry = Regex::new(r"(\d{10}) (\d{5}) ([nf]) \n").unwrap();
    let entries: Vec<_> = entry.captures_iter(&pdf[xref_at..]).collect();
    assert_eq!(entries.len(), size);
    assert_eq!(&entries[0][0], b"0000000000 65535 f \n");

    for (number, caps) in entries.iter().enumerate().skip(1) {
        assert_eq!(&caps[3], b"n");
        let offset: usize = std::str::from_utf8(&caps[1]).unwrap().parse().unwrap();
        let expected = format!("{} 0 obj\n", number);
        assert!(
            pdf[offset..].starts_with(expected.as_bytes()),
            "xref entry {} points at {:?}",
            number,
            text(&pdf[offset..offset + 12])
        );
    }

    let trailer_size = Regex::new(r"/Size (\d+)").unwrap();
    let declared: usize = std::str::from_utf8(&trailer_size.captures(&pdf[xref_at..]).unwrap()[1])
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(declared, size);
    assert_eq!(declared as u32, max_object_number(pdf) + 1);
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn test_hello_world() {
    init_logging();
    let mut doc = Document::new(DocumentConfig::new().with_compress(false)).unwrap();
    doc.add_page().unwrap();
    doc.set_font("Helvetica", "B", 16.0).unwrap();
    doc.cell(40.0, 10.0, "Hello World!", &CellOptions::new()).unwrap();
    let pdf = doc.into_bytes().unwrap();
    let s = text(&pdf);

    assert!(s.starts_with("%PDF-1.3\n"));
    assert!(s.ends_with("%%EOF\n"));
    assert_eq!(Regex::new(r"/Type /Page\b").unwrap().find_iter(&pdf).count(), 1);
    assert!(s.contains("/F1 16.00 Tf"));
    assert!(s.contains("(Hello World!) Tj"));
    assert!(s.contains("/BaseFont /Helvetica-Bold"));
    assert!(s.contains("/Encoding /WinAnsiEncoding"));
    assert!(s.contains("/Count 1 /Kids [3 0 R]"));
    assert!(s.contains("/Producer (pdf_quill "));
    assert!(s.contains("/Type /Catalog"));
    assert_xref_consistent(&pdf);
}

#[test]
fn test_two_pages_share_one_font() {
    let mut doc = plain_document();
    doc.add_page().unwrap();
    doc.set_font("Times", "", 12.0).unwrap();
    doc.cell(0.0, 14.0, "first", &CellOptions::new().ln(LineBreak::NextLine)).unwrap();
    doc.add_page().unwrap();
    doc.cell(0.0, 14.0, "second", &CellOptions::new()).unwrap();
    let pdf = doc.into_bytes().unwrap();
    let s = text(&pdf);

    assert_eq!(count(&s, "/Type /Font"), 1);
    assert_eq!(count(&s, "/BaseFont /Times-Roman"), 1);
    // Font carried over to the second page
    assert_eq!(count(&s, "/F1 12.00 Tf"), 2);
    assert!(s.contains("/Kids [3 0 R 5 0 R]"));
    assert!(s.contains("3 0 obj\n<</Contents 4 0 R"));
    assert!(s.contains("5 0 obj\n<</Contents 6 0 R"));
    assert_xref_consistent(&pdf);
}

#[test]
fn test_internal_link_destination() {
    let mut doc = plain_document();
    doc.add_page().unwrap();
    doc.set_font("Helvetica", "", 12.0).unwrap();
    let id = doc.add_link();
    doc.cell(60.0, 20.0, "go", &CellOptions::new().link(LinkTarget::Internal(id)))
        .unwrap();
    doc.add_page().unwrap();
    doc.set_link(id, Some(50.0), None).unwrap();
    let pdf = doc.into_bytes().unwrap();
    let s = text(&pdf);

    assert!(s.contains("/Annots ["));
    assert!(s.contains("/Subtype /Link"));
    assert!(s.contains("/Dest [5 0 R /XYZ 0 791.89 null]"));
    assert_xref_consistent(&pdf);
}

#[test]
fn test_external_link() {
    let mut doc = plain_document();
    doc.add_page().unwrap();
    doc.link(LinkTarget::Uri("https://example.com".to_string()), 10.0, 10.0, 50.0, 20.0)
        .unwrap();
    let s = text(&doc.into_bytes().unwrap());
    assert!(s.contains("/A <</S /URI /URI (https://example.com)>>"));
    assert!(s.contains("/Rect [10 831.89 60 811.89]"));
}

#[test]
fn test_unset_link_fails_at_close() {
    let mut doc = plain_document();
    doc.add_page().unwrap();
    let id = doc.add_link();
    doc.link(LinkTarget::Internal(id), 0.0, 0.0, 10.0, 10.0).unwrap();
    let err = doc.close().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(doc.set_link(99, None, None).is_err());
}

#[test]
fn test_undefined_font_leaves_content_unchanged() {
    let mut doc = plain_document();
    doc.add_page().unwrap();
    let err = doc.set_font("Foo", "", 12.0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Font);
    assert!(err.to_string().contains("foo"));

    let s = text(&doc.into_bytes().unwrap());
    assert!(!s.contains(" Tf"));
    assert!(!s.contains("/Type /Font"));
}

#[test]
fn test_page_count_alias() {
    let mut doc = plain_document();
    doc.alias_nb_pages(None);
    doc.set_footer(|d: &mut Document| {
        d.set_y(-30.0, true);
        d.set_font("Helvetica", "I", 8.0)?;
        let label = format!("Page {}/{{nb}}", d.page_no());
        d.cell(0.0, 10.0, &label, &CellOptions::new().align(Align::Center))
    });
    for _ in 0..3 {
        doc.add_page().unwrap();
    }
    let s = text(&doc.into_bytes().unwrap());

    assert!(s.contains("(Page 1/3) Tj"));
    assert!(s.contains("(Page 3/3) Tj"));
    assert!(!s.contains("{nb}"));
}

#[test]
fn test_metadata_and_display_mode() {
    let mut doc = plain_document();
    doc.set_title("Résumé");
    doc.set_author("A. Writer");
    doc.set_subject("Testing");
    doc.set_keywords("pdf test");
    doc.set_creator("integration");
    doc.set_display_mode(ZoomMode::FullPage, LayoutMode::Continuous);
    doc.add_page().unwrap();
    let s = text(&doc.into_bytes().unwrap());

    assert!(s.contains("/Title <FEFF005200E900730075006D00E9>"));
    assert!(s.contains("/Author (A. Writer)"));
    assert!(s.contains("/Subject (Testing)"));
    assert!(s.contains("/Keywords (pdf test)"));
    assert!(s.contains("/Creator (integration)"));
    assert!(s.contains("/CreationDate (D:"));
    assert!(s.contains("/OpenAction [3 0 R /Fit]"));
    assert!(s.contains("/PageLayout /OneColumn"));
}

#[test]
fn test_page_overrides() {
    let mut doc = plain_document();
    doc.add_page().unwrap();
    doc.add_page_with(Some(Orientation::Landscape), Some(PageSize::A5), 90).unwrap();
    assert_eq!(doc.page_width(), 595.28);
    assert_eq!(doc.page_height(), 420.94);
    let pdf = doc.into_bytes().unwrap();
    let s = text(&pdf);

    assert!(s.contains("/MediaBox [0 0 595.28 420.94]"));
    assert!(s.contains("/Rotate 90"));
    // Default size stays on the page tree
    assert!(s.contains("/MediaBox [0 0 595.28 841.89]"));
    assert_xref_consistent(&pdf);
}

#[test]
fn test_auto_page_break_across_pages() {
    let mut doc = plain_document();
    doc.set_auto_page_break(true, 50.0);
    doc.add_page().unwrap();
    doc.set_font("Courier", "", 10.0).unwrap();
    let paragraph = "lorem ipsum dolor sit amet ".repeat(200);
    doc.multi_cell(0.0, 12.0, &paragraph, Border::empty(), Align::Justify, false)
        .unwrap();
    assert!(doc.page_no() > 1);
    let pages = doc.page_no();

    let pdf = doc.into_bytes().unwrap();
    let s = text(&pdf);
    assert!(s.contains(&format!("/Count {}", pages)));
    assert_eq!(count(&s, "/F1 10.00 Tf"), pages);
    assert_xref_consistent(&pdf);
}

#[test]
fn test_compressed_content_stream() {
    init_logging();
    let mut doc = Document::new(DocumentConfig::new()).unwrap();
    doc.add_page().unwrap();
    doc.set_font("Arial", "", 12.0).unwrap();
    doc.write(6.0, "compressed text", None).unwrap();
    let pdf = doc.into_bytes().unwrap();

    // Content stream of the first page is object 4
    let re = Regex::new(r"(?s-u)4 0 obj\n<<[^>]*/Filter /FlateDecode[^>]*>>\nstream\n(.*?)\nendstream").unwrap();
    let caps = re.captures(&pdf).expect("compressed content stream");
    let mut content = String::new();
    ZlibDecoder::new(&caps[1]).read_to_string(&mut content).unwrap();
    assert!(content.contains("(compressed text) Tj"));
    assert_xref_consistent(&pdf);
}

#[test]
fn test_drawing_operators() {
    let mut doc = plain_document();
    doc.add_page().unwrap();
    doc.set_draw_color(pdf_quill::Color::rgb(255.0, 0.0, 0.0)).unwrap();
    doc.set_line_width(2.0).unwrap();
    doc.line(10.0, 10.0, 100.0, 10.0).unwrap();
    doc.set_fill_color(pdf_quill::Color::gray(200.0)).unwrap();
    doc.rect(10.0, 20.0, 50.0, 30.0, pdf_quill::PaintStyle::FillStroke).unwrap();
    let s = text(&doc.into_bytes().unwrap());

    assert!(s.contains("1.000 0.000 0.000 RG"));
    assert!(s.contains("2.00 w"));
    assert!(s.contains("10.00 831.89 m 100.00 831.89 l S"));
    assert!(s.contains("0.784 g"));
    assert!(s.contains("10.00 821.89 50.00 -30.00 re B"));
}

#[test]
fn test_save_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let mut doc = plain_document();
    doc.add_page().unwrap();
    doc.save(&path).unwrap();

    let written = std::fs::read(&path).unwrap();
    assert!(written.starts_with(b"%PDF-1.3"));
    assert_eq!(written, doc.output_bytes().unwrap());
}

#[test]
fn test_empty_document_gets_a_page() {
    let mut doc = plain_document();
    let pdf = doc.output_bytes().unwrap().to_vec();
    assert_eq!(doc.page_no(), 1);
    assert!(text(&pdf).contains("/Count 1"));
    assert_xref_consistent(&pdf);
}

#[test]
fn test_reselecting_aliased_fonts_emits_one_switch_each() {
    let mut doc = plain_document();
    doc.add_page().unwrap();
    doc.set_font("arial", "", 12.0).unwrap();
    doc.set_font("arial", "", 12.0).unwrap();
    doc.set_font("symbol", "B", 12.0).unwrap();
    doc.set_font("symbol", "B", 12.0).unwrap();
    let s = text(&doc.into_bytes().unwrap());

    assert_eq!(count(&s, " Tf"), 2);
    assert!(s.contains("/BaseFont /Helvetica "));
    assert!(s.contains("/BaseFont /Symbol "));
}

#[cfg(feature = "barcodes")]
#[test]
fn test_barcode_drawn_with_fill_color() {
    use pdf_quill::{BarcodePlacement, BarcodeType};

    let mut doc = plain_document();
    doc.add_page().unwrap();
    doc.set_fill_color(pdf_quill::Color::gray(0.0)).unwrap();
    doc.set_xy(20.0, 50.0);
    doc.barcode("PDF-QUILL 42", BarcodeType::Code128, &BarcodePlacement::new(150.0).height(40.0))
        .unwrap();
    assert_eq!(doc.y(), 90.0);
    let pdf = doc.into_bytes().unwrap();
    let s = text(&pdf);

    // Every bar spans the full height from the top edge at y = 50
    let bar = Regex::new(r"(?m)^\d+\.\d{2} 791\.89 \d+\.\d{2} -40\.00 re f$").unwrap();
    assert!(bar.find_iter(&pdf).count() > 10);
    // Leftmost bar starts at the left edge
    assert!(s.contains("20.00 791.89 "));
    assert_xref_consistent(&pdf);

    let mut doc = plain_document();
    doc.add_page().unwrap();
    let err = doc
        .barcode("12ab", BarcodeType::Ean13, &BarcodePlacement::new(60.0).at(0.0, 0.0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Barcode);
}

proptest! {
    #[test]
    fn prop_rotation_must_be_right_angle(rotation in -720i32..720) {
        let mut doc = Document::new(DocumentConfig::new().with_compress(false)).unwrap();
        let result = doc.add_page_with(None, None, rotation);
        prop_assert_eq!(result.is_ok(), rotation % 90 == 0);
        if let Err(e) = result {
            prop_assert_eq!(e.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn prop_cell_text_survives(word in "[A-Za-z0-9 ]{1,40}") {
        let mut doc = Document::new(DocumentConfig::new().with_compress(false)).unwrap();
        doc.add_page().unwrap();
        doc.set_font("Courier", "", 10.0).unwrap();
        doc.cell(0.0, 10.0, &word, &CellOptions::new()).unwrap();
        let pdf = doc.into_bytes().unwrap();
        let needle = format!("({}) Tj", word);
        prop_assert!(text(&pdf).contains(&needle));
    }
}
