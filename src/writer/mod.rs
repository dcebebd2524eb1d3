//! PDF writing module.
//!
//! ## Architecture
//!
//! ```text
//! Document (page/layout coordinator)
//!     ↓
//! [ContentStreamBuilder] (operators → page content bytes)
//!     ↓
//! [serializer] (pages, fonts, images, info, catalog in fixed order)
//!     ↓
//! [PdfWriter] (object numbering, offsets, xref, trailer)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)
//!     ↓
//! PDF bytes
//! ```

pub mod content_stream;
pub mod object_serializer;
pub mod pdf_writer;
pub mod serializer;

pub use content_stream::{Color, ContentStreamBuilder, ContentStreamOp, PaintStyle};
pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{compress_data, PdfWriter, PAGES_ROOT, RESOURCES};
pub use serializer::{serialize, DocumentParts, LinkDest, LinkTarget, PageLink, PageRecord};
