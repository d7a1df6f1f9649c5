//! Bounds-checked field reader over the raw bank image

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Read-only view over the bank image with bounds-checked field extraction.
///
/// All decoding goes through this type so that a corrupt offset surfaces as
/// [`Error::OutOfBounds`] with the offending location instead of a panic.
#[derive(Debug, Clone, Copy)]
pub struct BankCursor<'a> {
    data: &'a [u8],
}

impl<'a> BankCursor<'a> {
    /// Create a cursor over the (already header-stripped) bank image.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Total size of the image.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the image is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// A `len`-byte slice starting at `offset`.
    pub fn bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(Error::OutOfBounds {
                offset,
                len,
                size: self.data.len(),
            })
    }

    /// Single byte at `offset`.
    pub fn u8_at(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes_at(offset, 1)?[0])
    }

    /// Big-endian u16 at `offset` (table-offset pointers).
    pub fn u16_be_at(&self, offset: usize) -> Result<u16> {
        Ok(BigEndian::read_u16(self.bytes_at(offset, 2)?))
    }

    /// Little-endian 3-byte integer at `offset` (clip header fields).
    pub fn u24_le_at(&self, offset: usize) -> Result<u32> {
        Ok(LittleEndian::read_u24(self.bytes_at(offset, 3)?))
    }

    /// Big-endian 3-byte integer at `offset` (directory offsets).
    pub fn u24_be_at(&self, offset: usize) -> Result<u32> {
        Ok(BigEndian::read_u24(self.bytes_at(offset, 3)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fixed_width_fields() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let cur = BankCursor::new(&data);

        assert_eq!(cur.u8_at(0).unwrap(), 0x01);
        assert_eq!(cur.u16_be_at(0).unwrap(), 0x0102);
        assert_eq!(cur.u24_le_at(1).unwrap(), 0x040302);
        assert_eq!(cur.u24_be_at(1).unwrap(), 0x020304);
    }

    #[test]
    fn out_of_bounds_reports_offset() {
        let data = [0u8; 4];
        let cur = BankCursor::new(&data);

        let err = cur.u24_le_at(2).unwrap_err();
        match err {
            Error::OutOfBounds { offset, len, size } => {
                assert_eq!(offset, 2);
                assert_eq!(len, 3);
                assert_eq!(size, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn offset_overflow_is_out_of_bounds() {
        let data = [0u8; 4];
        let cur = BankCursor::new(&data);
        assert!(cur.bytes_at(usize::MAX, 2).is_err());
    }
}
