use std::io;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::ParseError;

/// Sequential big-endian reader over an in-memory class file.
///
/// Every read is bounds-checked up front, so a failed read never moves the
/// position.
pub struct ByteCursor<'a>(io::Cursor<&'a [u8]>);

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> ByteCursor<'a> {
        ByteCursor(io::Cursor::new(bytes))
    }

    pub fn position(&self) -> usize {
        self.0.position() as usize
    }

    pub fn remaining(&self) -> usize {
        self.0.get_ref().len().saturating_sub(self.position())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ParseError> {
        self.ensure(n)?;
        self.0.set_position((self.position() + n) as u64);
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        self.ensure(n)?;
        let start = self.position();
        let bytes: &'a [u8] = *self.0.get_ref();
        let bytes = &bytes[start..start + n];
        self.0.set_position((start + n) as u64);
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        self.ensure(1)?;
        self.0.read_u8().map_err(|e| self.eof(e, 1))
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.ensure(2)?;
        self.0.read_u16::<BigEndian>().map_err(|e| self.eof(e, 2))
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.ensure(4)?;
        self.0.read_u32::<BigEndian>().map_err(|e| self.eof(e, 4))
    }

    pub fn read_u64(&mut self) -> Result<u64, ParseError> {
        self.ensure(8)?;
        self.0.read_u64::<BigEndian>().map_err(|e| self.eof(e, 8))
    }

    pub fn read_i8(&mut self) -> Result<i8, ParseError> {
        self.ensure(1)?;
        self.0.read_i8().map_err(|e| self.eof(e, 1))
    }

    pub fn read_i16(&mut self) -> Result<i16, ParseError> {
        self.ensure(2)?;
        self.0.read_i16::<BigEndian>().map_err(|e| self.eof(e, 2))
    }

    pub fn read_i32(&mut self) -> Result<i32, ParseError> {
        self.ensure(4)?;
        self.0.read_i32::<BigEndian>().map_err(|e| self.eof(e, 4))
    }

    fn ensure(&self, needed: usize) -> Result<(), ParseError> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(ParseError::UnexpectedEof {
                offset: self.position(),
                needed,
                remaining,
            });
        }
        Ok(())
    }

    fn eof(&self, _: io::Error, needed: usize) -> ParseError {
        ParseError::UnexpectedEof {
            offset: self.position(),
            needed,
            remaining: self.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_big_endian() {
        let bytes = [0xca, 0xfe, 0xba, 0xbe, 0x00, 0x01, 0xff];
        let mut cursor = ByteCursor::new(&bytes);

        assert_eq!(cursor.read_u32().unwrap(), 0xcafebabe);
        assert_eq!(cursor.read_u16().unwrap(), 1);
        assert_eq!(cursor.read_i8().unwrap(), -1);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn short_read_fails_without_moving() {
        let bytes = [0x00, 0x01, 0x02];
        let mut cursor = ByteCursor::new(&bytes);
        cursor.skip(1).unwrap();

        assert_eq!(
            cursor.read_u32(),
            Err(ParseError::UnexpectedEof {
                offset: 1,
                needed: 4,
                remaining: 2,
            })
        );
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_u16().unwrap(), 0x0102);
    }

    #[test]
    fn read_bytes_and_u64() {
        let bytes = [1, 2, 3, 0, 0, 0, 0, 0, 0, 0, 9];
        let mut cursor = ByteCursor::new(&bytes);

        assert_eq!(cursor.read_bytes(3).unwrap(), &[1, 2, 3]);
        assert_eq!(cursor.read_u64().unwrap(), 9);
        assert!(cursor.read_bytes(1).is_err());
    }
}
