//! Document state machine and page lifecycle.
//!
//! A [`Document`] moves through four states:
//!
//! ```text
//! NoPage ──add_page──▶ WritingPage ◀──add_page── PageClosed
//!                           │                        ▲
//!                           └──────── end page ──────┘
//!                                       │
//!                                     close
//!                                       ▼
//!                                    Closed
//! ```
//!
//! Content operators go to the open page only. Closing serializes the whole
//! document once; the bytes are kept and returned by every later call to
//! [`Document::output_bytes`].

#[cfg(feature = "barcodes")]
pub mod barcode;
pub mod drawing;
pub mod text_flow;

#[cfg(feature = "barcodes")]
pub use barcode::{BarcodePlacement, BarcodeType};
pub use drawing::ImagePlacement;
pub use text_flow::{Align, Border, CellOptions, LineBreak};

use crate::config::{DocumentConfig, LayoutMode, Orientation, PageSize, ZoomMode};
use crate::error::{Error, Result};
use crate::fonts::{FontRegistry, FontStyle};
use crate::images::ImageRegistry;
use crate::writer::content_stream::{Color, ContentStreamBuilder, ContentStreamOp};
use crate::writer::serializer::{self, DocumentParts, LinkDest, LinkTarget, PageLink, PageRecord};
use indexmap::IndexMap;
use std::io::Write;
use std::path::Path;

/// Token replaced by the total page count when [`Document::alias_nb_pages`]
/// gets no explicit token.
pub const DEFAULT_NB_PAGES_ALIAS: &str = "{nb}";

/// Lifecycle state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// No page added yet
    NoPage,
    /// A page is open for content
    WritingPage,
    /// The last page was ended, no page open
    PageClosed,
    /// Serialized; no further mutation allowed
    Closed,
}

/// Header or footer callback, run with full access to the document.
pub type PageHook = Box<dyn FnMut(&mut Document) -> Result<()>>;

/// An in-memory PDF document.
pub struct Document {
    config: DocumentConfig,
    k: f64,
    state: DocumentState,
    pages: Vec<PageRecord>,
    pdf_version: String,
    buffer: Option<Vec<u8>>,

    // Page geometry, user units
    def_orientation: Orientation,
    cur_orientation: Orientation,
    def_size: (f64, f64),
    cur_size: (f64, f64),
    cur_rotation: i32,
    w: f64,
    h: f64,
    x: f64,
    y: f64,
    lasth: f64,
    left_margin: f64,
    top_margin: f64,
    right_margin: f64,
    bottom_margin: f64,
    c_margin: f64,
    auto_page_break: bool,
    page_break_trigger: f64,

    // Font selection
    fonts: FontRegistry,
    font_family: String,
    font_style: FontStyle,
    underline: bool,
    current_font: Option<String>,
    font_size_pt: f64,
    font_size: f64,

    // Graphics state
    line_width: f64,
    draw_color: Color,
    fill_color: Color,
    text_color: Color,
    color_flag: bool,
    ws: f64,
    content_angle: f64,

    images: ImageRegistry,
    links: Vec<Option<LinkDest>>,
    metadata: IndexMap<String, String>,
    zoom: ZoomMode,
    layout: LayoutMode,
    alias_nb_pages: Option<String>,
    header: Option<PageHook>,
    footer: Option<PageHook>,
    in_header: bool,
    in_footer: bool,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("state", &self.state)
            .field("pages", &self.pages.len())
            .field("page_size", &(self.w, self.h))
            .field("position", &(self.x, self.y))
            .field("fonts", &self.fonts.len())
            .field("images", &self.images.len())
            .field("pdf_version", &self.pdf_version)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Create an empty document.
    ///
    /// Margins default to 1 cm (2 cm at the bottom), line width to 0.2 mm,
    /// and automatic page breaking is on.
    pub fn new(config: DocumentConfig) -> Result<Self> {
        let k = config.unit.scale_factor();
        let size = config.page_size.dimensions(k)?;
        let (w, h) = oriented(config.orientation, size);
        let margin = 28.35 / k;

        let doc = Self {
            k,
            state: DocumentState::NoPage,
            pages: Vec::new(),
            pdf_version: config.pdf_version.clone(),
            buffer: None,
            def_orientation: config.orientation,
            cur_orientation: config.orientation,
            def_size: size,
            cur_size: size,
            cur_rotation: 0,
            w,
            h,
            x: margin,
            y: margin,
            lasth: 0.0,
            left_margin: margin,
            top_margin: margin,
            right_margin: margin,
            bottom_margin: 2.0 * margin,
            c_margin: margin / 10.0,
            auto_page_break: true,
            page_break_trigger: h - 2.0 * margin,
            fonts: FontRegistry::new(config.font_path.clone()),
            font_family: String::new(),
            font_style: FontStyle::empty(),
            underline: false,
            current_font: None,
            font_size_pt: 12.0,
            font_size: 12.0 / k,
            line_width: 0.567 / k,
            draw_color: Color::default(),
            fill_color: Color::default(),
            text_color: Color::default(),
            color_flag: false,
            ws: 0.0,
            content_angle: 0.0,
            images: ImageRegistry::new(),
            links: Vec::new(),
            metadata: IndexMap::new(),
            zoom: ZoomMode::Default,
            layout: LayoutMode::Default,
            alias_nb_pages: None,
            header: None,
            footer: None,
            in_header: false,
            in_footer: false,
            config,
        };
        log::debug!(
            "Created document: {:.2}x{:.2} user units, scale {:.4}, version {}",
            doc.w,
            doc.h,
            doc.k,
            doc.pdf_version
        );
        Ok(doc)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Points per user unit.
    pub fn scale_factor(&self) -> f64 {
        self.k
    }

    /// Current page number, 0 before the first page.
    pub fn page_no(&self) -> usize {
        self.pages.len()
    }

    /// Current page width in user units.
    pub fn page_width(&self) -> f64 {
        self.w
    }

    /// Current page height in user units.
    pub fn page_height(&self) -> f64 {
        self.h
    }

    /// Header version, possibly raised by the content.
    pub fn pdf_version(&self) -> &str {
        &self.pdf_version
    }

    /// Abscissa of the current position.
    pub fn x(&self) -> f64 {
        self.x
    }

    /// Ordinate of the current position.
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Set the abscissa; negative values are measured from the right edge.
    pub fn set_x(&mut self, x: f64) {
        self.x = if x >= 0.0 { x } else { self.w + x };
    }

    /// Set the ordinate, optionally moving x back to the left margin.
    /// Negative values are measured from the bottom edge.
    pub fn set_y(&mut self, y: f64, reset_x: bool) {
        self.y = if y >= 0.0 { y } else { self.h + y };
        if reset_x {
            self.x = self.left_margin;
        }
    }

    /// Set both coordinates.
    pub fn set_xy(&mut self, x: f64, y: f64) {
        self.set_x(x);
        self.set_y(y, false);
    }

    /// Set left, top and right margins; `right` defaults to `left`.
    pub fn set_margins(&mut self, left: f64, top: f64, right: Option<f64>) {
        self.left_margin = left;
        self.top_margin = top;
        self.right_margin = right.unwrap_or(left);
    }

    /// Set the left margin, pushing x inside it on an open page.
    pub fn set_left_margin(&mut self, margin: f64) {
        self.left_margin = margin;
        if self.page_no() > 0 && self.x < margin {
            self.x = margin;
        }
    }

    /// Set the top margin.
    pub fn set_top_margin(&mut self, margin: f64) {
        self.top_margin = margin;
    }

    /// Set the right margin.
    pub fn set_right_margin(&mut self, margin: f64) {
        self.right_margin = margin;
    }

    /// Set the bottom margin and with it the page-break threshold.
    pub fn set_bottom_margin(&mut self, margin: f64) {
        self.bottom_margin = margin;
        self.page_break_trigger = self.h - margin;
    }

    /// Left margin.
    pub fn left_margin(&self) -> f64 {
        self.left_margin
    }

    /// Right margin.
    pub fn right_margin(&self) -> f64 {
        self.right_margin
    }

    /// Interior padding of cells.
    pub fn cell_margin(&self) -> f64 {
        self.c_margin
    }

    /// Enable or disable automatic page breaks, `margin` above the bottom edge.
    pub fn set_auto_page_break(&mut self, auto: bool, margin: f64) {
        self.auto_page_break = auto;
        self.set_bottom_margin(margin);
    }

    /// Whether automatic page breaking is enabled.
    pub fn auto_page_break(&self) -> bool {
        self.auto_page_break
    }

    /// Viewer zoom and layout when the document is opened.
    pub fn set_display_mode(&mut self, zoom: ZoomMode, layout: LayoutMode) {
        self.zoom = zoom;
        self.layout = layout;
    }

    /// Enable or disable stream compression.
    pub fn set_compression(&mut self, compress: bool) {
        self.config.compress = compress;
    }

    /// Document title.
    pub fn set_title(&mut self, title: &str) {
        self.metadata.insert("Title".to_string(), title.to_string());
    }

    /// Document author.
    pub fn set_author(&mut self, author: &str) {
        self.metadata.insert("Author".to_string(), author.to_string());
    }

    /// Document subject.
    pub fn set_subject(&mut self, subject: &str) {
        self.metadata.insert("Subject".to_string(), subject.to_string());
    }

    /// Space-separated keywords.
    pub fn set_keywords(&mut self, keywords: &str) {
        self.metadata.insert("Keywords".to_string(), keywords.to_string());
    }

    /// Application that created the content.
    pub fn set_creator(&mut self, creator: &str) {
        self.metadata.insert("Creator".to_string(), creator.to_string());
    }

    /// Replace `alias` with the total page count when serializing.
    /// `None` uses [`DEFAULT_NB_PAGES_ALIAS`].
    pub fn alias_nb_pages(&mut self, alias: Option<&str>) {
        self.alias_nb_pages = Some(alias.unwrap_or(DEFAULT_NB_PAGES_ALIAS).to_string());
    }

    /// Register the header hook, run at the start of every page.
    pub fn set_header<F>(&mut self, hook: F)
    where
        F: FnMut(&mut Document) -> Result<()> + 'static,
    {
        self.header = Some(Box::new(hook));
    }

    /// Register the footer hook, run at the end of every page.
    pub fn set_footer<F>(&mut self, hook: F)
    where
        F: FnMut(&mut Document) -> Result<()> + 'static,
    {
        self.footer = Some(Box::new(hook));
    }

    /// Add a page with the default orientation and size.
    pub fn add_page(&mut self) -> Result<()> {
        self.add_page_with(None, None, 0)
    }

    /// Add a page, overriding orientation, size or rotation.
    ///
    /// The footer of the previous page runs first, then the header of the
    /// new one. Line width, font and colours carry over to the new page.
    pub fn add_page_with(
        &mut self,
        orientation: Option<Orientation>,
        size: Option<PageSize>,
        rotation: i32,
    ) -> Result<()> {
        let orientation = orientation.unwrap_or(self.def_orientation);
        let size = match size {
            Some(size) => size.dimensions(self.k)?,
            None => self.def_size,
        };
        self.start_page(orientation, size, rotation)
    }

    /// Page break keeping the current orientation, size and rotation.
    pub(crate) fn break_page(&mut self) -> Result<()> {
        self.start_page(self.cur_orientation, self.cur_size, self.cur_rotation)
    }

    fn start_page(&mut self, orientation: Orientation, size: (f64, f64), rotation: i32) -> Result<()> {
        if self.state == DocumentState::Closed {
            return Err(Error::DocumentClosed);
        }
        if rotation % 90 != 0 {
            return Err(Error::InvalidRotation(rotation));
        }

        let family = self.font_family.clone();
        let mut style = self.font_style;
        if self.underline {
            style |= FontStyle::UNDERLINE;
        }
        let font_size = self.font_size_pt;
        let lw = self.line_width;
        let dc = self.draw_color;
        let fc = self.fill_color;
        let tc = self.text_color;
        let cf = self.color_flag;

        if self.page_no() > 0 {
            self.run_footer()?;
            self.end_page()?;
        }
        self.begin_page(orientation, size, rotation);

        self.out(ContentStreamOp::SetLineCap(2))?;
        self.line_width = lw;
        self.out(ContentStreamOp::SetLineWidth(lw * self.k))?;
        if !family.is_empty() {
            self.select_font(&family, style, font_size)?;
        }
        self.draw_color = dc;
        if dc != Color::default() {
            self.out(ContentStreamOp::SetStrokeColor(dc))?;
        }
        self.fill_color = fc;
        if fc != Color::default() {
            self.out(ContentStreamOp::SetFillColor(fc))?;
        }
        self.text_color = tc;
        self.color_flag = cf;

        self.run_header()?;

        // Undo whatever the header changed
        if self.line_width != lw {
            self.line_width = lw;
            self.out(ContentStreamOp::SetLineWidth(lw * self.k))?;
        }
        if !family.is_empty() {
            self.select_font(&family, style, font_size)?;
        }
        if self.draw_color != dc {
            self.draw_color = dc;
            self.out(ContentStreamOp::SetStrokeColor(dc))?;
        }
        if self.fill_color != fc {
            self.fill_color = fc;
            self.out(ContentStreamOp::SetFillColor(fc))?;
        }
        self.text_color = tc;
        self.color_flag = cf;
        Ok(())
    }

    fn begin_page(&mut self, orientation: Orientation, size: (f64, f64), rotation: i32) {
        let mut page = PageRecord::default();
        self.state = DocumentState::WritingPage;
        self.x = self.left_margin;
        self.y = self.top_margin;
        self.font_family.clear();

        if orientation != self.cur_orientation || size != self.cur_size {
            let (w, h) = oriented(orientation, size);
            self.w = w;
            self.h = h;
            self.page_break_trigger = h - self.bottom_margin;
            self.cur_orientation = orientation;
            self.cur_size = size;
        }
        if orientation != self.def_orientation || size != self.def_size {
            page.size = Some((self.w * self.k, self.h * self.k));
        }
        page.rotation = rotation;
        self.cur_rotation = rotation;

        self.pages.push(page);
        log::debug!(
            "Began page {} ({:.2}x{:.2} pt, rotation {})",
            self.pages.len(),
            self.w * self.k,
            self.h * self.k,
            rotation
        );
    }

    fn end_page(&mut self) -> Result<()> {
        if self.content_angle != 0.0 {
            self.content_angle = 0.0;
            self.out(ContentStreamOp::RestoreState)?;
        }
        self.state = DocumentState::PageClosed;
        if let Some(page) = self.pages.last() {
            log::trace!("Ended page {} ({} content bytes)", self.pages.len(), page.content.len());
        }
        Ok(())
    }

    fn run_header(&mut self) -> Result<()> {
        self.in_header = true;
        let result = match self.header.take() {
            Some(mut hook) => {
                let result = hook(self);
                self.header.get_or_insert(hook);
                result
            },
            None => Ok(()),
        };
        self.in_header = false;
        result
    }

    fn run_footer(&mut self) -> Result<()> {
        self.in_footer = true;
        let result = match self.footer.take() {
            Some(mut hook) => {
                let result = hook(self);
                self.footer.get_or_insert(hook);
                result
            },
            None => Ok(()),
        };
        self.in_footer = false;
        result
    }

    /// Whether an automatic page break should happen before an element of
    /// height `h` at the current position.
    pub(crate) fn needs_page_break(&self, h: f64) -> bool {
        self.y + h > self.page_break_trigger && !self.in_header && !self.in_footer && self.auto_page_break
    }

    /// Append one line of operator text to the open page.
    pub fn emit(&mut self, line: &[u8]) -> Result<()> {
        match self.state {
            DocumentState::WritingPage => match self.pages.last_mut() {
                Some(page) => {
                    page.content.extend_from_slice(line);
                    page.content.push(b'\n');
                    Ok(())
                },
                None => Err(Error::NoPageOpen),
            },
            DocumentState::NoPage | DocumentState::PageClosed => Err(Error::NoPageOpen),
            DocumentState::Closed => Err(Error::DocumentClosed),
        }
    }

    pub(crate) fn out(&mut self, op: ContentStreamOp) -> Result<()> {
        let mut builder = ContentStreamBuilder::new();
        builder.op(op);
        self.emit(&builder.build())
    }

    pub(crate) fn out_builder(&mut self, builder: &ContentStreamBuilder) -> Result<()> {
        self.emit(&builder.build())
    }

    /// Raise the header version to at least `version`.
    pub(crate) fn require_version(&mut self, version: &str) {
        if self.pdf_version.as_str() < version {
            log::debug!("Raising PDF version from {} to {}", self.pdf_version, version);
            self.pdf_version = version.to_string();
        }
    }

    /// Create an internal link and return its id.
    ///
    /// The destination is set later with [`Document::set_link`].
    pub fn add_link(&mut self) -> usize {
        self.links.push(None);
        self.links.len()
    }

    /// Set the destination of an internal link.
    ///
    /// `y` defaults to the current position and `page` to the current page.
    pub fn set_link(&mut self, id: usize, y: Option<f64>, page: Option<usize>) -> Result<()> {
        let dest = LinkDest {
            page: page.unwrap_or(self.page_no()),
            y: y.unwrap_or(self.y),
        };
        match id.checked_sub(1).and_then(|i| self.links.get_mut(i)) {
            Some(slot) => {
                *slot = Some(dest);
                Ok(())
            },
            None => Err(Error::UnknownLink(id)),
        }
    }

    /// Put a clickable area on the current page.
    pub fn link(&mut self, target: LinkTarget, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
        if self.state == DocumentState::Closed {
            return Err(Error::DocumentClosed);
        }
        let k = self.k;
        let h_pt = self.h * k;
        let page = self.pages.last_mut().ok_or(Error::NoPageOpen)?;
        page.links.push(PageLink {
            x: x * k,
            y: h_pt - y * k,
            w: w * k,
            h: h * k,
            target,
        });
        Ok(())
    }

    /// Finish the document: run the last footer, end the page and serialize.
    ///
    /// A document without pages gets one blank page. Calling this again is
    /// a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.state == DocumentState::Closed {
            return Ok(());
        }
        if self.page_no() == 0 {
            self.add_page()?;
        }
        self.run_footer()?;
        self.end_page()?;

        let default_size = {
            let (w, h) = oriented(self.def_orientation, self.def_size);
            (w * self.k, h * self.k)
        };
        let parts = DocumentParts {
            version: &self.pdf_version,
            compress: self.config.compress,
            scale: self.k,
            default_size,
            pages: &self.pages,
            links: &self.links,
            fonts: &self.fonts,
            images: &self.images,
            metadata: &self.metadata,
            zoom: self.zoom,
            layout: self.layout,
            alias_nb_pages: self.alias_nb_pages.as_deref(),
        };
        let bytes = serializer::serialize(&parts)?;
        log::info!("Closed document: {} pages, {} bytes", self.pages.len(), bytes.len());
        self.buffer = Some(bytes);
        self.state = DocumentState::Closed;
        Ok(())
    }

    /// Close the document if needed and return the PDF bytes.
    pub fn output_bytes(&mut self) -> Result<&[u8]> {
        self.close()?;
        Ok(self.buffer.as_deref().unwrap_or_default())
    }

    /// Close the document and take the PDF bytes.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.close()?;
        Ok(self.buffer.take().unwrap_or_default())
    }

    /// Close the document and write it to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.output_bytes()?;
        std::fs::write(path, bytes).map_err(|source| Error::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Close the document and stream it to `writer`.
    pub fn write_to<W: Write>(&mut self, mut writer: W) -> Result<()> {
        let bytes = self.output_bytes()?;
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }
}

/// Width and height for an orientation, from portrait dimensions.
fn oriented(orientation: Orientation, (w, h): (f64, f64)) -> (f64, f64) {
    match orientation {
        Orientation::Portrait => (w, h),
        Orientation::Landscape => (h, w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Unit;

    fn doc() -> Document {
        Document::new(DocumentConfig::new().with_compress(false)).unwrap()
    }

    fn content(doc: &Document) -> String {
        String::from_utf8_lossy(&doc.pages.last().unwrap().content).to_string()
    }

    #[test]
    fn test_defaults() {
        let d = doc();
        assert_eq!(d.state(), DocumentState::NoPage);
        assert!((d.page_width() - 210.0).abs() < 0.01);
        assert!((d.left_margin() - 10.0).abs() < 0.01);
        assert!((d.page_break_trigger - (d.page_height() - 20.0)).abs() < 0.01);
    }

    #[test]
    fn test_emit_requires_open_page() {
        let mut d = doc();
        assert!(matches!(d.emit(b"0 g"), Err(Error::NoPageOpen)));
        d.add_page().unwrap();
        d.emit(b"0 g").unwrap();
        assert!(content(&d).ends_with("0 g\n"));
        d.close().unwrap();
        assert!(matches!(d.emit(b"0 g"), Err(Error::DocumentClosed)));
        assert!(matches!(d.add_page(), Err(Error::DocumentClosed)));
    }

    #[test]
    fn test_page_prologue() {
        let mut d = doc();
        d.add_page().unwrap();
        assert_eq!(content(&d), "2 J\n0.57 w\n");
        assert_eq!((d.x(), d.y()), (d.left_margin(), d.top_margin));
    }

    #[test]
    fn test_landscape_override_recorded() {
        let mut d = Document::new(DocumentConfig::new().with_unit(Unit::Pt)).unwrap();
        d.add_page().unwrap();
        d.add_page_with(Some(Orientation::Landscape), None, 90).unwrap();
        assert_eq!(d.pages[0].size, None);
        assert_eq!(d.pages[1].size, Some((841.89, 595.28)));
        assert_eq!(d.pages[1].rotation, 90);
        assert_eq!(d.page_width(), 841.89);
    }

    #[test]
    fn test_invalid_rotation() {
        let mut d = doc();
        assert!(matches!(d.add_page_with(None, None, 45), Err(Error::InvalidRotation(45))));
        assert_eq!(d.page_no(), 0);
    }

    #[test]
    fn test_negative_positions() {
        let mut d = Document::new(DocumentConfig::new().with_unit(Unit::Pt)).unwrap();
        d.set_xy(-100.0, -50.0);
        assert!((d.x() - 495.28).abs() < 1e-9);
        assert!((d.y() - 791.89).abs() < 1e-9);
        d.set_y(10.0, true);
        assert_eq!(d.x(), d.left_margin());
    }

    #[test]
    fn test_links() {
        let mut d = doc();
        let id = d.add_link();
        assert_eq!(id, 1);
        assert!(matches!(d.set_link(2, None, None), Err(Error::UnknownLink(2))));
        d.set_link(id, Some(50.0), Some(1)).unwrap();
        assert_eq!(d.links[0], Some(LinkDest { page: 1, y: 50.0 }));
        assert!(matches!(
            d.link(LinkTarget::Internal(id), 0.0, 0.0, 1.0, 1.0),
            Err(Error::NoPageOpen)
        ));
    }

    #[test]
    fn test_close_is_idempotent_and_adds_page() {
        let mut d = doc();
        let first = d.output_bytes().unwrap().to_vec();
        assert_eq!(d.page_no(), 1);
        let second = d.output_bytes().unwrap().to_vec();
        assert_eq!(first, second);
        assert!(first.starts_with(b"%PDF-1.3"));
    }

    #[test]
    fn test_hooks_run_per_page() {
        use std::cell::Cell;
        use std::rc::Rc;

        let headers = Rc::new(Cell::new(0));
        let footers = Rc::new(Cell::new(0));
        let mut d = doc();
        let h = headers.clone();
        d.set_header(move |doc| {
            h.set(h.get() + 1);
            doc.set_line_width(1.0)
        });
        let f = footers.clone();
        d.set_footer(move |_| {
            f.set(f.get() + 1);
            Ok(())
        });
        d.add_page().unwrap();
        d.add_page().unwrap();
        // Header changed the width, which is restored afterwards
        assert!(content(&d).ends_with("1.00 w\n0.57 w\n"));
        d.close().unwrap();
        assert_eq!(headers.get(), 2);
        assert_eq!(footers.get(), 2);
    }

    #[test]
    fn test_save_reports_path() {
        let mut d = doc();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("out.pdf");
        match d.save(&missing) {
            Err(Error::OutputWriteFailed { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
