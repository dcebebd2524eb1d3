//! Error types for the PDF library.
//!
//! Every failure is fatal for the document being built: nothing is retried
//! internally and a document that returned an error must not be reused.

use std::path::PathBuf;

/// Result type alias for PDF library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad unit, page size, orientation, rotation, zoom or layout mode
    Configuration,
    /// Operation not allowed in the current document state
    State,
    /// Undefined font, missing font file, unsupported font type
    Font,
    /// Missing or corrupt image, unsupported format or capability
    Image,
    /// Barcode data invalid for its symbology
    Barcode,
    /// Unexpected end of input while reading a binary structure
    Stream,
    /// Output write failure
    Io,
}

/// Error types that can occur while building a PDF document.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// Unknown user unit
    #[error("Incorrect unit: {0}")]
    InvalidUnit(String),

    /// Unknown page size name or non-positive dimensions
    #[error("Unknown page size: {0}")]
    InvalidPageSize(String),

    /// Unknown orientation string
    #[error("Incorrect orientation: {0}")]
    InvalidOrientation(String),

    /// Rotation that is not a multiple of 90 degrees
    #[error("Incorrect rotation value: {0}")]
    InvalidRotation(i32),

    /// Unknown zoom display mode
    #[error("Incorrect zoom display mode: {0}")]
    InvalidZoomMode(String),

    /// Unknown layout display mode
    #[error("Incorrect layout display mode: {0}")]
    InvalidLayoutMode(String),

    /// Content emitted before any page was added
    #[error("No page has been added yet")]
    NoPageOpen,

    /// Mutation attempted after the document was finalized
    #[error("The document is closed")]
    DocumentClosed,

    /// Text output or measurement before a font was selected
    #[error("No font has been set")]
    NoFontSelected,

    /// Link id never returned by `add_link`
    #[error("Unknown link: {0}")]
    UnknownLink(usize),

    /// Internal link whose destination was never set
    #[error("Link {0} has no destination page")]
    UnresolvedLink(usize),

    /// An allocated object number was never written
    #[error("Object {0} was allocated but never written")]
    MissingObject(u32),

    /// Font family/style not registered and not a core font
    #[error("Undefined font: {family} {style}")]
    UndefinedFont {
        /// Requested family (lowercase)
        family: String,
        /// Requested style (canonical)
        style: String,
    },

    /// Font definition file unreadable or malformed
    #[error("Invalid font definition {file}: {reason}")]
    InvalidFontDefinition {
        /// Definition file name
        file: String,
        /// What was wrong with it
        reason: String,
    },

    /// Embedded font program missing at serialization time
    #[error("Font file not found: {0}")]
    FontFileNotFound(String),

    /// Embedded font program shorter than its declared segment lengths
    #[error("Corrupt font file {file}: {reason}")]
    CorruptFontFile {
        /// Font program file name
        file: String,
        /// What was wrong with it
        reason: String,
    },

    /// Font type without an emitter
    #[error("Unsupported font type: {0}")]
    UnsupportedFontType(String),

    /// Image source empty or unreadable
    #[error("Missing or incorrect image file: {0}")]
    MissingImageFile(String),

    /// Image source without extension and no explicit type
    #[error("Image file has no extension and no type was specified: {0}")]
    MissingImageType(String),

    /// Image type outside {png, jpg, jpeg, gif}
    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),

    /// Bad PNG signature
    #[error("Not a PNG file: {0}")]
    NotAPngFile(String),

    /// PNG without a leading IHDR chunk
    #[error("Incorrect PNG file: {0}")]
    IncorrectPngFile(String),

    /// PNG bit depth above 8
    #[error("{depth}-bit depth not supported: {file}")]
    UnsupportedBitDepth {
        /// Image source
        file: String,
        /// Declared bit depth
        depth: u8,
    },

    /// PNG color type outside {0, 2, 3, 4, 6}
    #[error("Unknown color type {color_type}: {file}")]
    UnsupportedColorType {
        /// Image source
        file: String,
        /// Declared color type
        color_type: u8,
    },

    /// PNG compression method other than 0
    #[error("Unknown compression method: {0}")]
    UnsupportedCompression(String),

    /// PNG filter method other than 0
    #[error("Unknown filter method: {0}")]
    UnsupportedFilterMethod(String),

    /// Interlaced PNG
    #[error("Interlacing not supported: {0}")]
    InterlacingNotSupported(String),

    /// Indexed PNG without PLTE chunk
    #[error("Missing palette in {0}")]
    MissingPalette(String),

    /// Detected format is not JPEG
    #[error("Not a JPEG file: {0}")]
    NotAJpegFile(String),

    /// Image data that could not be decoded
    #[error("Image decoding error in {file}: {reason}")]
    ImageDecode {
        /// Image source
        file: String,
        /// Decoder message
        reason: String,
    },

    /// Barcode data rejected by the symbology, or unusable geometry
    #[error("Barcode error: {0}")]
    Barcode(String),

    /// Decoder support not compiled in
    #[error("Missing capability: {0}")]
    MissingCapability(&'static str),

    /// Binary structure ended early
    #[error("Unexpected end of stream")]
    UnexpectedEndOfStream,

    /// Output file could not be written
    #[error("Unable to create output file {path}: {source}")]
    OutputWriteFailed {
        /// Destination path
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUnit(_)
            | Error::InvalidPageSize(_)
            | Error::InvalidOrientation(_)
            | Error::InvalidRotation(_)
            | Error::InvalidZoomMode(_)
            | Error::InvalidLayoutMode(_) => ErrorKind::Configuration,
            Error::NoPageOpen
            | Error::DocumentClosed
            | Error::NoFontSelected
            | Error::UnknownLink(_)
            | Error::UnresolvedLink(_)
            | Error::MissingObject(_) => ErrorKind::State,
            Error::Barcode(_) => ErrorKind::Barcode,
            Error::UndefinedFont { .. }
            | Error::InvalidFontDefinition { .. }
            | Error::FontFileNotFound(_)
            | Error::CorruptFontFile { .. }
            | Error::UnsupportedFontType(_) => ErrorKind::Font,
            Error::MissingImageFile(_)
            | Error::MissingImageType(_)
            | Error::UnsupportedImageType(_)
            | Error::NotAPngFile(_)
            | Error::IncorrectPngFile(_)
            | Error::UnsupportedBitDepth { .. }
            | Error::UnsupportedColorType { .. }
            | Error::UnsupportedCompression(_)
            | Error::UnsupportedFilterMethod(_)
            | Error::InterlacingNotSupported(_)
            | Error::MissingPalette(_)
            | Error::NotAJpegFile(_)
            | Error::ImageDecode { .. }
            | Error::MissingCapability(_) => ErrorKind::Image,
            Error::UnexpectedEndOfStream => ErrorKind::Stream,
            Error::OutputWriteFailed { .. } | Error::Io(_) => ErrorKind::Io,
        }
    }
}
