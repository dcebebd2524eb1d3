//! Binary readers for image decoding.
//!
//! Thin wrapper over any [`Read`] source that turns short reads into
//! [`Error::UnexpectedEndOfStream`]. Lengths taken from the input are
//! never trusted for allocation: variable reads grow with the data.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::{self, Read};

/// Reads exact-length fields from a byte source.
#[derive(Debug)]
pub struct ByteReader<R> {
    inner: R,
}

impl<R: Read> ByteReader<R> {
    /// Wrap a byte source.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read exactly `n` bytes.
    pub fn read_bytes(&mut self, n: u64) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let read = (&mut self.inner).take(n).read_to_end(&mut buf)?;
        if (read as u64) < n {
            return Err(Error::UnexpectedEndOfStream);
        }
        Ok(buf)
    }

    /// Read exactly `N` bytes into an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.inner.read_exact(&mut buf).map_err(map_eof)?;
        Ok(buf)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.inner.read_u8().map_err(map_eof)
    }

    /// Read a 4-byte big-endian unsigned integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.inner.read_u32::<BigEndian>().map_err(map_eof)
    }

    /// Discard exactly `n` bytes.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        let copied = io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        if copied < n {
            return Err(Error::UnexpectedEndOfStream);
        }
        Ok(())
    }
}

fn map_eof(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEndOfStream
    } else {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_u32_big_endian() {
        let mut r = ByteReader::new(Cursor::new(vec![0x00, 0x00, 0x01, 0x02, 0xFF]));
        assert_eq!(r.read_u32().unwrap(), 258);
        assert_eq!(r.read_u8().unwrap(), 0xFF);
        assert!(matches!(r.read_u8(), Err(Error::UnexpectedEndOfStream)));
    }

    #[test]
    fn test_read_bytes_exact() {
        let mut r = ByteReader::new(Cursor::new(b"IHDRrest".to_vec()));
        assert_eq!(r.read_array::<4>().unwrap(), *b"IHDR");
        assert_eq!(r.read_bytes(4).unwrap(), b"rest");
    }

    #[test]
    fn test_short_read_is_end_of_stream() {
        let mut r = ByteReader::new(Cursor::new(vec![1, 2, 3]));
        assert!(matches!(r.read_u32(), Err(Error::UnexpectedEndOfStream)));

        let mut r = ByteReader::new(Cursor::new(vec![1, 2, 3]));
        assert!(matches!(r.read_bytes(8), Err(Error::UnexpectedEndOfStream)));
    }

    #[test]
    fn test_oversized_length_fails_without_allocating_it() {
        let mut r = ByteReader::new(Cursor::new(vec![7u8; 16]));
        assert!(matches!(r.read_bytes(u32::MAX as u64), Err(Error::UnexpectedEndOfStream)));
    }

    #[test]
    fn test_skip() {
        let mut r = ByteReader::new(Cursor::new(vec![0, 1, 2, 3, 4]));
        r.skip(3).unwrap();
        assert_eq!(r.read_u8().unwrap(), 3);
        assert!(matches!(r.skip(5), Err(Error::UnexpectedEndOfStream)));
    }
}
