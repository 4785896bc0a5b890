//! Big-endian primitives shared by the schema and table encoders.

use crate::error::{DecodeError, MergeError};

/// Bounds-checked cursor over an encoded buffer.
#[derive(Debug, Clone)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) const fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    pub(crate) const fn position(&self) -> usize {
        self.pos
    }

    pub(crate) const fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.take(n).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.array().map(i32::from_be_bytes)
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64, DecodeError> {
        self.array().map(i64::from_be_bytes)
    }

    pub(crate) fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.array().map(f32::from_be_bytes)
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64, DecodeError> {
        self.array().map(f64::from_be_bytes)
    }

    /// A non-negative i32 length, checked against the bytes still available
    /// when each counted item occupies at least `min_item_size` bytes.
    pub(crate) fn read_len(&mut self, min_item_size: usize) -> Result<usize, DecodeError> {
        let raw = self.read_i32()?;
        let len = usize::try_from(raw).map_err(|_| DecodeError::NegativeLength(raw))?;
        let needed = len.saturating_mul(min_item_size);
        if needed > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed,
                available: self.remaining(),
            });
        }
        Ok(len)
    }

    /// Length-prefixed bytes.
    pub(crate) fn read_blob(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_len(1)?;
        self.take(len)
    }

    pub(crate) fn read_string(&mut self, what: &'static str) -> Result<String, DecodeError> {
        let bytes = self.read_blob()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8(what))
    }
}

/// Writes an i32 length prefix.
pub(crate) fn put_len(out: &mut Vec<u8>, len: usize) -> Result<(), MergeError> {
    let len = i32::try_from(len).map_err(|_| MergeError::LengthOverflow(len))?;
    out.extend_from_slice(&len.to_be_bytes());
    Ok(())
}

pub(crate) fn put_blob(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), MergeError> {
    put_len(out, bytes.len())?;
    out.extend_from_slice(bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_primitives() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&7i32.to_be_bytes());
        buf.extend_from_slice(&(-9i64).to_be_bytes());
        buf.extend_from_slice(&1.5f64.to_be_bytes());
        put_blob(&mut buf, b"abc").unwrap();

        let mut r = ByteReader::new(&buf);
        assert_eq!(r.read_i32().unwrap(), 7);
        assert_eq!(r.read_i64().unwrap(), -9);
        assert_eq!(r.read_f64().unwrap(), 1.5);
        assert_eq!(r.read_blob().unwrap(), b"abc");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn truncated_read_reports_offset() {
        let buf = [0u8, 0, 1];
        let mut r = ByteReader::new(&buf);
        assert_eq!(
            r.read_i32(),
            Err(DecodeError::Truncated {
                offset: 0,
                needed: 4,
                available: 3
            })
        );
    }

    #[test]
    fn negative_and_oversized_lengths_are_rejected() {
        let bytes = (-1i32).to_be_bytes();
        let mut r = ByteReader::new(&bytes);
        assert_eq!(r.read_len(1), Err(DecodeError::NegativeLength(-1)));

        let buf = 1000i32.to_be_bytes();
        let mut r = ByteReader::new(&buf);
        assert!(matches!(r.read_len(4), Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn oversized_length_prefix_is_an_error() {
        let mut out = Vec::new();
        let too_long = usize::try_from(i32::MAX).unwrap() + 1;
        assert!(matches!(
            put_len(&mut out, too_long),
            Err(MergeError::LengthOverflow(n)) if n == too_long
        ));
        assert!(out.is_empty());

        put_len(&mut out, 3).unwrap();
        assert_eq!(out, [0, 0, 0, 3]);
    }
}
