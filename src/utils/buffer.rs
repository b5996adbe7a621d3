use std::fmt::Write as _;
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use byteorder::{BigEndian, ByteOrder};

/// Growable byte container with a read cursor.
///
/// The declared `size` is the number of bytes the owner expects to store;
/// `space_left()` reports how much of that is still unfilled. Writes always
/// append and may grow past the declared size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
    cursor: usize,
    size: usize,
}

impl Buffer {
    /// Wrap existing bytes, the declared size is their length
    pub fn new(data: Vec<u8>) -> Self {
        let size = data.len();
        Buffer {
            data,
            cursor: 0,
            size,
        }
    }

    /// Create an empty buffer expecting `size` bytes
    pub fn with_size(size: usize) -> Self {
        Buffer {
            data: Vec::with_capacity(size),
            cursor: 0,
            size,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Buffer::new(bytes.to_vec())
    }

    /// Get current cursor position
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Set cursor position
    pub fn set_position(&mut self, pos: usize) -> IoResult<()> {
        if pos > self.data.len() {
            return Err(IoError::new(ErrorKind::InvalidInput, "Position out of bounds"));
        }
        self.cursor = pos;
        Ok(())
    }

    /// Bytes between the cursor and the end of the data
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.cursor)
    }

    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Unread part of the buffer
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.cursor.min(self.data.len())..]
    }

    /// Declared size of the buffer
    pub fn size(&self) -> usize {
        self.size.max(self.data.len())
    }

    /// Bytes still expected before the declared size is filled
    pub fn space_left(&self) -> usize {
        self.size.saturating_sub(self.data.len())
    }

    fn take(&mut self, len: usize) -> IoResult<&[u8]> {
        if !self.has_remaining(len) {
            return Err(IoError::new(ErrorKind::UnexpectedEof, "Not enough bytes"));
        }
        let start = self.cursor;
        self.cursor += len;
        Ok(&self.data[start..start + len])
    }

    pub fn read_bytes(&mut self, len: usize) -> IoResult<Vec<u8>> {
        self.take(len).map(|bytes| bytes.to_vec())
    }

    pub fn read_u8(&mut self) -> IoResult<u8> {
        self.take(1).map(|bytes| bytes[0])
    }

    pub fn read_u16_be(&mut self) -> IoResult<u16> {
        self.take(2).map(BigEndian::read_u16)
    }

    pub fn read_i16_be(&mut self) -> IoResult<i16> {
        self.take(2).map(BigEndian::read_i16)
    }

    /// Read a 3 byte big endian value
    pub fn read_u24_be(&mut self) -> IoResult<u32> {
        self.take(3).map(BigEndian::read_u24)
    }

    pub fn read_u32_be(&mut self) -> IoResult<u32> {
        self.take(4).map(BigEndian::read_u32)
    }

    pub fn read_f64_be(&mut self) -> IoResult<f64> {
        self.take(8).map(BigEndian::read_f64)
    }

    /// Append raw bytes
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16_be(&mut self, value: u16) {
        let mut bytes = [0u8; 2];
        BigEndian::write_u16(&mut bytes, value);
        self.append(&bytes);
    }

    pub fn write_i16_be(&mut self, value: i16) {
        let mut bytes = [0u8; 2];
        BigEndian::write_i16(&mut bytes, value);
        self.append(&bytes);
    }

    /// Write the low 24 bits of `value` big endian
    pub fn write_u24_be(&mut self, value: u32) {
        let mut bytes = [0u8; 3];
        BigEndian::write_u24(&mut bytes, value & 0x00ff_ffff);
        self.append(&bytes);
    }

    pub fn write_u32_be(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        BigEndian::write_u32(&mut bytes, value);
        self.append(&bytes);
    }

    pub fn write_f64_be(&mut self, value: f64) {
        let mut bytes = [0u8; 8];
        BigEndian::write_f64(&mut bytes, value);
        self.append(&bytes);
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Clear data and reset cursor, the declared size is kept
    pub fn clear(&mut self) {
        self.data.clear();
        self.cursor = 0;
    }

    /// Number of bytes stored
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Space separated hex dump, used in trace logging
    pub fn hexify(&self) -> String {
        hexify(&self.data)
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(data: Vec<u8>) -> Self {
        Buffer::new(data)
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// Format bytes as `03 00 1f ..`
pub fn hexify(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_u8() {
        let mut buffer = Buffer::with_size(10);
        buffer.write_u8(0x42);
        buffer.write_u8(0x84);

        assert_eq!(buffer.read_u8().unwrap(), 0x42);
        assert_eq!(buffer.read_u8().unwrap(), 0x84);
    }

    #[test]
    fn test_read_write_u24() {
        let mut buffer = Buffer::with_size(3);
        buffer.write_u24_be(0x01_1f_14);
        assert_eq!(buffer.as_slice(), &[0x01, 0x1f, 0x14]);
        assert_eq!(buffer.read_u24_be().unwrap(), 0x01_1f_14);
    }

    #[test]
    fn test_space_left_tracks_declared_size() {
        let mut buffer = Buffer::with_size(8);
        assert_eq!(buffer.space_left(), 8);
        buffer.append(&[1, 2, 3]);
        assert_eq!(buffer.space_left(), 5);
        buffer.append(&[0; 10]);
        assert_eq!(buffer.space_left(), 0);
        assert_eq!(buffer.size(), 13);
    }

    #[test]
    fn test_remaining_bytes() {
        let mut buffer = Buffer::new(vec![1, 2, 3, 4, 5]);

        assert_eq!(buffer.remaining(), 5);
        buffer.read_u8().unwrap();
        assert_eq!(buffer.remaining(), 4);
        assert_eq!(buffer.remaining_slice(), &[2, 3, 4, 5]);
    }

    #[test]
    fn test_boundary_checks() {
        let mut buffer = Buffer::new(vec![1, 2]);

        assert!(buffer.read_u16_be().is_ok());
        assert!(buffer.read_u32_be().is_err());
        // a failed read leaves the cursor alone
        assert_eq!(buffer.position(), 2);
    }

    #[test]
    fn test_hexify() {
        assert_eq!(hexify(&[0x03, 0x00, 0x1f]), "03 00 1f");
        assert_eq!(hexify(&[]), "");
    }
}
