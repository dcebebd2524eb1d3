//! Document serialization.
//!
//! Walks a finished document in a fixed order and produces the file:
//!
//! ```text
//! pages (dict + content, pairwise)
//!     ↓
//! page tree (object 1)
//!     ↓
//! fonts → images → resource dictionary (object 2)
//!     ↓
//! info → catalog → xref → trailer
//! ```
//!
//! Object numbers are handed out sequentially by [`PdfWriter`], so the same
//! document always serializes to the same bytes (apart from the creation
//! date).

use super::object_serializer::ObjectSerializer as S;
use super::pdf_writer::{PdfWriter, PAGES_ROOT, RESOURCES};
use crate::config::{LayoutMode, ZoomMode};
use crate::error::{Error, Result};
use crate::fonts::cmap::to_unicode_cmap;
use crate::fonts::standard::has_builtin_encoding;
use crate::fonts::{FontFileInfo, FontRegistry, FontType};
use crate::images::{ColorSpace, ImageInfo, ImageRegistry, PredictorParams};
use crate::object::Object;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};

/// Target of a clickable area.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    /// External URI
    Uri(String),
    /// Internal link id from `add_link`
    Internal(usize),
}

/// Clickable area on a page, in points with y measured from the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLink {
    /// Left edge
    pub x: f64,
    /// Top edge
    pub y: f64,
    /// Width
    pub w: f64,
    /// Height
    pub h: f64,
    /// Where the link goes
    pub target: LinkTarget,
}

/// Destination of an internal link: page number and y in user units from the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkDest {
    /// 1-based page number
    pub page: usize,
    /// Y position in user units
    pub y: f64,
}

/// One finished page.
#[derive(Debug, Clone, Default)]
pub struct PageRecord {
    /// Content stream, uncompressed
    pub content: Vec<u8>,
    /// Size in points when different from the document default
    pub size: Option<(f64, f64)>,
    /// Rotation in degrees, 0 when unrotated
    pub rotation: i32,
    /// Link annotations in insertion order
    pub links: Vec<PageLink>,
}

/// Everything the serializer reads from a document.
#[derive(Debug)]
pub struct DocumentParts<'a> {
    /// Header version
    pub version: &'a str,
    /// Compress content and auxiliary streams
    pub compress: bool,
    /// Scale factor (points per user unit)
    pub scale: f64,
    /// Default page size in points, default orientation applied
    pub default_size: (f64, f64),
    /// Pages in order
    pub pages: &'a [PageRecord],
    /// Internal link destinations indexed by id - 1
    pub links: &'a [Option<LinkDest>],
    /// Registered fonts
    pub fonts: &'a FontRegistry,
    /// Registered images
    pub images: &'a ImageRegistry,
    /// User metadata (Title, Author, ...)
    pub metadata: &'a IndexMap<String, String>,
    /// Viewer zoom
    pub zoom: ZoomMode,
    /// Viewer layout
    pub layout: LayoutMode,
    /// Token replaced by the page count
    pub alias_nb_pages: Option<&'a str>,
}

/// Serialize a document to PDF bytes.
pub fn serialize(parts: &DocumentParts<'_>) -> Result<Vec<u8>> {
    Serializer::new(parts).run()
}

struct Serializer<'a> {
    parts: &'a DocumentParts<'a>,
    w: PdfWriter,
    page_numbers: Vec<u32>,
    font_numbers: Vec<(usize, u32)>,
    image_numbers: Vec<(usize, u32)>,
}

impl<'a> Serializer<'a> {
    fn new(parts: &'a DocumentParts<'a>) -> Self {
        Self {
            parts,
            w: PdfWriter::new(parts.version, parts.compress),
            page_numbers: Vec::new(),
            font_numbers: Vec::new(),
            image_numbers: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<u8>> {
        self.put_pages()?;
        self.put_resources()?;
        let info = self.put_info();
        let catalog = self.put_catalog();
        log::debug!(
            "Serialized {} pages, {} fonts, {} images into {} objects",
            self.parts.pages.len(),
            self.font_numbers.len(),
            self.image_numbers.len(),
            self.w.current_number()
        );
        self.w.finish(catalog, info)
    }

    fn put_pages(&mut self) -> Result<()> {
        let base = self.w.current_number();
        let count = self.parts.pages.len();
        self.page_numbers = (0..count).map(|i| base + 1 + 2 * i as u32).collect();

        let pages = self.parts.pages;
        for (i, page) in pages.iter().enumerate() {
            self.put_page(i, page)?;
        }

        let kids = self.page_numbers.iter().map(|&n| S::reference(n, 0)).collect();
        let (w, h) = self.parts.default_size;
        let root = S::dict(vec![
            ("Type", S::name("Pages")),
            ("Kids", S::array(kids)),
            ("Count", S::integer(count as i64)),
            ("MediaBox", media_box(w, h)),
        ]);
        self.w.write_object(PAGES_ROOT, &root);
        Ok(())
    }

    fn put_page(&mut self, i: usize, page: &PageRecord) -> Result<()> {
        let number = self.w.allocate();
        let mut entries = vec![
            ("Type", S::name("Page")),
            ("Parent", S::reference(PAGES_ROOT, 0)),
            ("Resources", S::reference(RESOURCES, 0)),
            ("Contents", S::reference(number + 1, 0)),
        ];
        if let Some((w, h)) = page.size {
            entries.push(("MediaBox", media_box(w, h)));
        }
        if page.rotation != 0 {
            entries.push(("Rotate", S::integer(page.rotation as i64)));
        }
        if !page.links.is_empty() {
            let annots = page
                .links
                .iter()
                .map(|link| self.annotation(link))
                .collect::<Result<Vec<_>>>()?;
            entries.push(("Annots", S::array(annots)));
        }
        if self.parts.images.any_alpha() {
            entries.push((
                "Group",
                S::dict(vec![
                    ("Type", S::name("Group")),
                    ("S", S::name("Transparency")),
                    ("CS", S::name("DeviceRGB")),
                ]),
            ));
        }
        self.w.write_object(number, &S::dict(entries));

        let content = match self.parts.alias_nb_pages {
            Some(alias) if !alias.is_empty() => {
                replace_bytes(&page.content, alias.as_bytes(), self.parts.pages.len().to_string().as_bytes())
            },
            _ => page.content.clone(),
        };
        let stream = self.w.stream_object(content)?;
        self.w.add_object(&stream);
        log::trace!("Wrote page {} as object {}", i + 1, number);
        Ok(())
    }

    fn annotation(&self, link: &PageLink) -> Result<Object> {
        let rect = S::array(vec![
            S::real(round2(link.x)),
            S::real(round2(link.y)),
            S::real(round2(link.x + link.w)),
            S::real(round2(link.y - link.h)),
        ]);
        let mut entries = vec![
            ("Type", S::name("Annot")),
            ("Subtype", S::name("Link")),
            ("Rect", rect),
            ("Border", S::array(vec![S::integer(0), S::integer(0), S::integer(0)])),
        ];
        match &link.target {
            LinkTarget::Uri(uri) => {
                entries.push(("A", S::dict(vec![("S", S::name("URI")), ("URI", S::text_string(uri))])));
            },
            LinkTarget::Internal(id) => {
                let dest = self
                    .parts
                    .links
                    .get(id.wrapping_sub(1))
                    .copied()
                    .ok_or(Error::UnknownLink(*id))?
                    .ok_or(Error::UnresolvedLink(*id))?;
                let page_number = *self
                    .page_numbers
                    .get(dest.page.wrapping_sub(1))
                    .ok_or(Error::UnresolvedLink(*id))?;
                let height = self.parts.pages[dest.page - 1]
                    .size
                    .map(|(_, h)| h)
                    .unwrap_or(self.parts.default_size.1);
                entries.push((
                    "Dest",
                    S::array(vec![
                        S::reference(page_number, 0),
                        S::name("XYZ"),
                        S::integer(0),
                        S::real(round2(height - dest.y * self.parts.scale)),
                        Object::Null,
                    ]),
                ));
            },
        }
        Ok(S::dict(entries))
    }

    fn put_resources(&mut self) -> Result<()> {
        self.put_fonts()?;
        self.put_images()?;

        let fonts = self
            .font_numbers
            .iter()
            .map(|&(i, n)| (format!("F{}", i), S::reference(n, 0)))
            .collect::<HashMap<_, _>>();
        let xobjects = self
            .image_numbers
            .iter()
            .map(|&(i, n)| (format!("I{}", i), S::reference(n, 0)))
            .collect::<HashMap<_, _>>();
        let procset = ["PDF", "Text", "ImageB", "ImageC", "ImageI"].iter().map(|p| S::name(p)).collect();
        let resources = S::dict(vec![
            ("ProcSet", S::array(procset)),
            ("Font", Object::Dictionary(fonts)),
            ("XObject", Object::Dictionary(xobjects)),
        ]);
        self.w.write_object(RESOURCES, &resources);
        Ok(())
    }

    fn put_fonts(&mut self) -> Result<()> {
        let registry = self.parts.fonts;

        let mut file_numbers: HashMap<&str, u32> = HashMap::new();
        for (file, info) in registry.files() {
            let n = self.put_font_file(file, info)?;
            file_numbers.insert(file, n);
        }

        let mut encodings: HashMap<String, u32> = HashMap::new();
        let mut cmaps: HashMap<String, u32> = HashMap::new();
        for (_, font) in registry.fonts() {
            let def = &font.def;

            let encoding = match def.differences() {
                Some(diff) => {
                    let enc = def.enc.clone().unwrap_or_default();
                    let n = match encodings.get(&enc) {
                        Some(&n) => n,
                        None => {
                            let n = self.w.add_object(&S::dict(vec![
                                ("Type", S::name("Encoding")),
                                ("BaseEncoding", S::name("WinAnsiEncoding")),
                                ("Differences", S::array(diff)),
                            ]));
                            encodings.insert(enc, n);
                            n
                        },
                    };
                    Some(n)
                },
                None => None,
            };

            let to_unicode = match &def.uv {
                Some(uv) => {
                    let key = def.cmap_key().to_string();
                    let n = match cmaps.get(&key) {
                        Some(&n) => n,
                        None => {
                            let stream = self.w.stream_object(to_unicode_cmap(uv).into_bytes())?;
                            let n = self.w.add_object(&stream);
                            cmaps.insert(key, n);
                            n
                        },
                    };
                    Some(n)
                },
                None => None,
            };

            let name = def.base_font();
            let mut entries = vec![
                ("Type", S::name("Font")),
                ("BaseFont", S::name(&name)),
                ("Subtype", S::name(def.font_type.subtype())),
            ];
            if let Some(n) = to_unicode {
                entries.push(("ToUnicode", S::reference(n, 0)));
            }

            let number = match def.font_type {
                FontType::Core => {
                    if !has_builtin_encoding(&name) {
                        entries.push(("Encoding", S::name("WinAnsiEncoding")));
                    }
                    self.w.add_object(&S::dict(entries))
                },
                FontType::TrueType | FontType::Type1 => {
                    let number = self.w.allocate();
                    entries.push(("FirstChar", S::integer(32)));
                    entries.push(("LastChar", S::integer(255)));
                    entries.push(("Widths", S::reference(number + 1, 0)));
                    entries.push(("FontDescriptor", S::reference(number + 2, 0)));
                    entries.push((
                        "Encoding",
                        match encoding {
                            Some(n) => S::reference(n, 0),
                            None => S::name("WinAnsiEncoding"),
                        },
                    ));
                    self.w.write_object(number, &S::dict(entries));

                    let widths = (32..=255u8).map(|b| S::integer(def.width(b) as i64)).collect();
                    self.w.add_object(&S::array(widths));

                    let mut desc: HashMap<String, Object> = def.descriptor_entries().into_iter().collect();
                    desc.insert("Type".to_string(), S::name("FontDescriptor"));
                    desc.insert("FontName".to_string(), S::name(&name));
                    if let Some(file) = &def.file {
                        let n = *file_numbers
                            .get(file.as_str())
                            .ok_or_else(|| Error::FontFileNotFound(file.clone()))?;
                        let key = if def.font_type == FontType::Type1 { "FontFile" } else { "FontFile2" };
                        desc.insert(key.to_string(), S::reference(n, 0));
                    }
                    self.w.add_object(&Object::Dictionary(desc));
                    number
                },
            };
            self.font_numbers.push((font.index, number));
        }
        Ok(())
    }

    fn put_font_file(&mut self, file: &str, info: &FontFileInfo) -> Result<u32> {
        let path = self.parts.fonts.font_path().join(file);
        let mut bytes = Vec::new();
        File::open(&path)
            .and_then(|f| BufReader::new(f).read_to_end(&mut bytes))
            .map_err(|_| Error::FontFileNotFound(file.to_string()))?;
        if bytes.is_empty() {
            return Err(Error::FontFileNotFound(file.to_string()));
        }

        let compressed = file.ends_with(".z");
        if let (false, Some(length2)) = (compressed, info.length2) {
            bytes = strip_pfb_headers(&bytes, info.length1 as usize, length2 as usize)
                .ok_or_else(|| Error::CorruptFontFile {
                    file: file.to_string(),
                    reason: "shorter than declared segment lengths".to_string(),
                })?;
        }

        let mut entries = vec![("Length1", S::integer(info.length1 as i64))];
        if compressed {
            entries.push(("Filter", S::name("FlateDecode")));
        }
        if let Some(length2) = info.length2 {
            entries.push(("Length2", S::integer(length2 as i64)));
            entries.push(("Length3", S::integer(0)));
        }
        log::debug!("Embedding font file {} ({} bytes)", file, bytes.len());
        Ok(self.w.add_object(&S::stream(entries, bytes)))
    }

    fn put_images(&mut self) -> Result<()> {
        let registry = self.parts.images;
        for (_, image) in registry.images() {
            let n = self.put_image(&image.info)?;
            self.image_numbers.push((image.index, n));
        }
        Ok(())
    }

    /// Write an image XObject followed by its soft mask and palette.
    fn put_image(&mut self, info: &ImageInfo) -> Result<u32> {
        let number = self.w.allocate();
        let mut entries = vec![
            ("Type", S::name("XObject")),
            ("Subtype", S::name("Image")),
            ("Width", S::integer(info.width as i64)),
            ("Height", S::integer(info.height as i64)),
        ];
        if info.color_space == ColorSpace::Indexed {
            let palette_number = number + 1 + info.has_alpha() as u32;
            let hival = (info.palette.len() / 3) as i64 - 1;
            entries.push((
                "ColorSpace",
                S::array(vec![
                    S::name("Indexed"),
                    S::name("DeviceRGB"),
                    S::integer(hival),
                    S::reference(palette_number, 0),
                ]),
            ));
        } else {
            entries.push(("ColorSpace", S::name(info.color_space.pdf_name())));
            if info.color_space == ColorSpace::DeviceCMYK {
                let decode = [1, 0, 1, 0, 1, 0, 1, 0].iter().map(|&v| S::integer(v)).collect();
                entries.push(("Decode", S::array(decode)));
            }
        }
        entries.push(("BitsPerComponent", S::integer(info.bits_per_component as i64)));
        entries.push(("Filter", S::name(info.filter.pdf_name())));
        if let Some(dp) = &info.decode_parms {
            entries.push(("DecodeParms", dp.to_object()));
        }
        if let Some(keys) = &info.transparency {
            let mask = keys
                .iter()
                .flat_map(|&k| [S::integer(k as i64), S::integer(k as i64)])
                .collect();
            entries.push(("Mask", S::array(mask)));
        }
        if info.has_alpha() {
            entries.push(("SMask", S::reference(number + 1, 0)));
        }
        self.w.write_object(number, &S::stream(entries, info.data.clone()));

        if let Some(alpha) = &info.soft_mask {
            let smask = ImageInfo {
                width: info.width,
                height: info.height,
                color_space: ColorSpace::DeviceGray,
                bits_per_component: 8,
                filter: info.filter,
                decode_parms: Some(PredictorParams::png(1, 8, info.width)),
                data: alpha.clone(),
                soft_mask: None,
                palette: Vec::new(),
                transparency: None,
            };
            self.put_image(&smask)?;
        }
        if info.color_space == ColorSpace::Indexed {
            let stream = self.w.stream_object(info.palette.clone())?;
            self.w.add_object(&stream);
        }
        Ok(number)
    }

    fn put_info(&mut self) -> u32 {
        let mut entries: HashMap<String, Object> = self
            .parts
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), S::text_string(v)))
            .collect();
        entries.insert(
            "Producer".to_string(),
            S::text_string(&format!("pdf_quill {}", env!("CARGO_PKG_VERSION"))),
        );
        entries.insert(
            "CreationDate".to_string(),
            S::text_string(&chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string()),
        );
        self.w.add_object(&Object::Dictionary(entries))
    }

    fn put_catalog(&mut self) -> u32 {
        let mut entries = vec![("Type", S::name("Catalog")), ("Pages", S::reference(PAGES_ROOT, 0))];
        if let Some(&first) = self.page_numbers.first() {
            let page = S::reference(first, 0);
            let action = match self.parts.zoom {
                ZoomMode::FullPage => Some(vec![page, S::name("Fit")]),
                ZoomMode::FullWidth => Some(vec![page, S::name("FitH"), Object::Null]),
                ZoomMode::Real => Some(vec![page, S::name("XYZ"), Object::Null, Object::Null, S::integer(1)]),
                ZoomMode::Percent(p) => Some(vec![
                    page,
                    S::name("XYZ"),
                    Object::Null,
                    Object::Null,
                    S::real(round2(p / 100.0)),
                ]),
                ZoomMode::Default => None,
            };
            if let Some(action) = action {
                entries.push(("OpenAction", S::array(action)));
            }
        }
        let layout = match self.parts.layout {
            LayoutMode::Single => Some("SinglePage"),
            LayoutMode::Continuous => Some("OneColumn"),
            LayoutMode::Two => Some("TwoColumnLeft"),
            LayoutMode::Default => None,
        };
        if let Some(layout) = layout {
            entries.push(("PageLayout", S::name(layout)));
        }
        self.w.add_object(&S::dict(entries))
    }
}

fn media_box(w: f64, h: f64) -> Object {
    S::array(vec![S::integer(0), S::integer(0), S::real(round2(w)), S::real(round2(h))])
}

/// Round to two decimals, as content operators are written.
fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Replace every occurrence of `needle` in `haystack`.
pub fn replace_bytes(haystack: &[u8], needle: &[u8], replacement: &[u8]) -> Vec<u8> {
    if needle.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            out.extend_from_slice(replacement);
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

/// Drop the 6-byte segment headers of a PFB file, keeping the clear-text
/// and binary segments.
fn strip_pfb_headers(font: &[u8], length1: usize, length2: usize) -> Option<Vec<u8>> {
    let first = font.get(6..6 + length1)?;
    let start = 6 + length1 + 6;
    let second = font.get(start..start + length2)?;
    let mut out = Vec::with_capacity(length1 + length2);
    out.extend_from_slice(first);
    out.extend_from_slice(second);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(
        pages: &'a [PageRecord],
        links: &'a [Option<LinkDest>],
        fonts: &'a FontRegistry,
        images: &'a ImageRegistry,
        metadata: &'a IndexMap<String, String>,
    ) -> DocumentParts<'a> {
        DocumentParts {
            version: "1.3",
            compress: false,
            scale: 1.0,
            default_size: (595.28, 841.89),
            pages,
            links,
            fonts,
            images,
            metadata,
            zoom: ZoomMode::Default,
            layout: LayoutMode::Default,
            alias_nb_pages: Some("{nb}"),
        }
    }

    #[test]
    fn test_replace_bytes() {
        assert_eq!(replace_bytes(b"page 1/{nb} {nb}", b"{nb}", b"12"), b"page 1/12 12");
        assert_eq!(replace_bytes(b"abc", b"", b"x"), b"abc");
    }

    #[test]
    fn test_strip_pfb_headers() {
        let mut pfb = vec![0x80, 1, 3, 0, 0, 0];
        pfb.extend_from_slice(b"abc");
        pfb.extend_from_slice(&[0x80, 2, 2, 0, 0, 0]);
        pfb.extend_from_slice(b"de");
        assert_eq!(strip_pfb_headers(&pfb, 3, 2).unwrap(), b"abcde");
        assert!(strip_pfb_headers(&pfb, 3, 10).is_none());
    }

    #[test]
    fn test_pages_and_alias() {
        let pages = vec![
            PageRecord {
                content: b"(1/{nb}) Tj".to_vec(),
                ..Default::default()
            },
            PageRecord {
                content: b"(2/{nb}) Tj".to_vec(),
                size: Some((200.0, 300.0)),
                rotation: 90,
                ..Default::default()
            },
        ];
        let fonts = FontRegistry::new("fonts");
        let images = ImageRegistry::new();
        let meta = IndexMap::new();
        let bytes = serialize(&parts(&pages, &[], &fonts, &images, &meta)).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(text.starts_with("%PDF-1.3\n"));
        assert!(text.contains("3 0 obj\n<</Contents 4 0 R /Parent 1 0 R /Resources 2 0 R /Type /Page>>"));
        assert!(text.contains("/MediaBox [0 0 200 300] /Parent 1 0 R /Resources 2 0 R /Rotate 90"));
        assert!(text.contains("(1/2) Tj"));
        assert!(text.contains("/Count 2 /Kids [3 0 R 5 0 R] /MediaBox [0 0 595.28 841.89]"));
        assert!(text.contains("/Size 9"));
    }

    #[test]
    fn test_internal_link_destination() {
        let pages = vec![
            PageRecord {
                links: vec![PageLink {
                    x: 10.0,
                    y: 800.0,
                    w: 50.0,
                    h: 20.0,
                    target: LinkTarget::Internal(1),
                }],
                ..Default::default()
            },
            PageRecord::default(),
        ];
        let links = vec![Some(LinkDest { page: 2, y: 50.0 })];
        let fonts = FontRegistry::new("fonts");
        let images = ImageRegistry::new();
        let meta = IndexMap::new();
        let bytes = serialize(&parts(&pages, &links, &fonts, &images, &meta)).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Dest [5 0 R /XYZ 0 791.89 null]"));
        assert!(text.contains("/Rect [10 800 60 780]"));
    }

    #[test]
    fn test_unresolved_link() {
        let pages = vec![PageRecord {
            links: vec![PageLink {
                x: 0.0,
                y: 0.0,
                w: 1.0,
                h: 1.0,
                target: LinkTarget::Internal(1),
            }],
            ..Default::default()
        }];
        let links = vec![None];
        let fonts = FontRegistry::new("fonts");
        let images = ImageRegistry::new();
        let meta = IndexMap::new();
        assert!(matches!(
            serialize(&parts(&pages, &links, &fonts, &images, &meta)),
            Err(Error::UnresolvedLink(1))
        ));
    }
}
