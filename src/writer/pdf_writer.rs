//! Low-level PDF file writer.
//!
//! Owns the output buffer, the object-number counter and the offset table.
//! Object numbers 1 (page tree) and 2 (resource dictionary) are reserved up
//! front; everything else is allocated sequentially from 3.

use super::object_serializer::ObjectSerializer;
use crate::error::{Error, Result};
use crate::object::Object;
use std::collections::BTreeMap;
use std::io::Write;

/// Object number of the page tree root.
pub const PAGES_ROOT: u32 = 1;
/// Object number of the shared resource dictionary.
pub const RESOURCES: u32 = 2;

/// Compress data using Flate/Deflate compression.
///
/// Returns compressed bytes suitable for FlateDecode filter.
pub fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Append-only PDF byte writer.
#[derive(Debug)]
pub struct PdfWriter {
    serializer: ObjectSerializer,
    buffer: Vec<u8>,
    /// Highest allocated object number
    n: u32,
    /// Object number -> byte offset of its `n 0 obj` token
    offsets: BTreeMap<u32, usize>,
    compress: bool,
}

impl PdfWriter {
    /// Create a writer and emit the file header.
    pub fn new(version: &str, compress: bool) -> Self {
        let mut buffer = Vec::new();
        let _ = writeln!(buffer, "%PDF-{}", version);
        // Binary marker (recommended for binary content)
        buffer.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
        Self {
            serializer: ObjectSerializer::compact(),
            buffer,
            n: RESOURCES,
            offsets: BTreeMap::new(),
            compress,
        }
    }

    /// Highest object number allocated so far.
    pub fn current_number(&self) -> u32 {
        self.n
    }

    /// Allocate the next object number.
    pub fn allocate(&mut self) -> u32 {
        self.n += 1;
        self.n
    }

    /// Current length of the output, i.e. the offset of the next byte.
    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    /// Write an indirect object under a previously allocated (or reserved) number.
    pub fn write_object(&mut self, number: u32, obj: &Object) {
        self.offsets.insert(number, self.buffer.len());
        let bytes = self.serializer.serialize_indirect(number, 0, obj);
        self.buffer.extend_from_slice(&bytes);
    }

    /// Allocate a number and write the object under it.
    pub fn add_object(&mut self, obj: &Object) -> u32 {
        let number = self.allocate();
        self.write_object(number, obj);
        number
    }

    /// Build a stream object, compressing the payload when enabled.
    pub fn stream_object(&self, data: Vec<u8>) -> Result<Object> {
        if self.compress {
            let compressed = compress_data(&data)?;
            Ok(ObjectSerializer::stream(
                vec![("Filter", ObjectSerializer::name("FlateDecode"))],
                compressed,
            ))
        } else {
            Ok(ObjectSerializer::stream(vec![], data))
        }
    }

    /// Write the cross-reference table and trailer, consuming the writer.
    ///
    /// Every number in `1..=n` must have been written.
    pub fn finish(mut self, root: u32, info: u32) -> Result<Vec<u8>> {
        let xref_start = self.buffer.len();
        let size = self.n + 1;
        writeln!(self.buffer, "xref")?;
        writeln!(self.buffer, "0 {}", size)?;

        // Object 0 is always free
        writeln!(self.buffer, "0000000000 65535 f ")?;

        for number in 1..=self.n {
            let offset = self.offsets.get(&number).ok_or(Error::MissingObject(number))?;
            writeln!(self.buffer, "{:010} 00000 n ", offset)?;
        }

        let trailer = ObjectSerializer::dict(vec![
            ("Size", ObjectSerializer::integer(size as i64)),
            ("Root", ObjectSerializer::reference(root, 0)),
            ("Info", ObjectSerializer::reference(info, 0)),
        ]);

        writeln!(self.buffer, "trailer")?;
        let trailer_bytes = self.serializer.serialize(&trailer);
        self.buffer.extend_from_slice(&trailer_bytes);
        writeln!(self.buffer)?;
        writeln!(self.buffer, "startxref")?;
        writeln!(self.buffer, "{}", xref_start)?;
        writeln!(self.buffer, "%%EOF")?;

        log::debug!(
            "Wrote xref with {} objects at offset {} ({} bytes total)",
            size,
            xref_start,
            self.buffer.len()
        );
        Ok(self.buffer)
    }
}
