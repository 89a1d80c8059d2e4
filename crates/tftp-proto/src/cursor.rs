//! Bounds-checked cursors over caller-owned buffers.
//!
//! [`Reader`] and [`Writer`] are the only code that indexes frame buffers.
//! Both borrow the buffer for their whole lifetime and never copy it.
//!
//! Reads and writes are all-or-nothing: on failure the position is left
//! untouched, so a parser may try another path from the same spot.
//!
//! [`Reader::skip`] and [`Writer::skip`] are the exception. They move the
//! position unconditionally, even past the end, and callers must only skip
//! lengths they have already validated. A cursor positioned past the end
//! reports nothing available and fails every read or write.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{ProtocolError, Result};

/// Sequential read view over a byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Start reading at the beginning of `buf`.
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current offset into the buffer.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read (zero once the position passes the end).
    pub const fn available(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Unread suffix of the buffer, without advancing.
    pub fn remaining(&self) -> &'a [u8] {
        self.buf.get(self.pos..).unwrap_or_default()
    }

    /// Advance by `n` bytes without bounds checking.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    /// Take exactly `n` bytes, or fail without moving.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        let bytes = self
            .pos
            .checked_add(n)
            .and_then(|end| self.buf.get(self.pos..end))
            .ok_or(ProtocolError::Truncated { needed: n, available: self.available() })?;
        self.pos += n;
        Ok(bytes)
    }

    /// Take a big-endian `u16`.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_exact(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Take a fixed-layout header in place.
    pub fn read_as<T>(&mut self) -> Result<&'a T>
    where
        T: FromBytes + KnownLayout + Immutable + Unaligned,
    {
        let needed = size_of::<T>();
        let available = self.available();
        let bytes = self.remaining().get(..needed).ok_or(ProtocolError::Truncated { needed, available })?;
        let header =
            T::ref_from_bytes(bytes).map_err(|_| ProtocolError::Truncated { needed, available })?;
        self.pos += needed;
        Ok(header)
    }

    /// Take a NUL-terminated run, returning it without the terminator.
    ///
    /// Fails without moving if no NUL byte remains.
    pub fn read_until_nul(&mut self) -> Result<&'a [u8]> {
        let rest = self.remaining();
        let len = rest.iter().position(|&b| b == 0).ok_or(ProtocolError::MissingTerminator)?;
        self.pos += len + 1;
        Ok(&rest[..len])
    }
}

/// Sequential write view over a mutable byte slice.
#[derive(Debug)]
pub struct Writer<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Writer<'a> {
    /// Start writing at the beginning of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written (or skipped) so far.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Capacity left (zero once the position passes the end).
    pub const fn available(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Unwritten suffix of the buffer.
    pub fn remaining_mut(&mut self) -> &mut [u8] {
        self.buf.get_mut(self.pos..).unwrap_or_default()
    }

    /// Advance by `n` bytes without bounds checking.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n);
    }

    /// Write one byte if there is room.
    pub fn write_one(&mut self, byte: u8) -> Result<()> {
        self.write_all(&[byte])
    }

    /// Write all of `data` if it fits, or nothing.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let available = self.available();
        let slot = self
            .pos
            .checked_add(data.len())
            .and_then(|end| self.buf.get_mut(self.pos..end))
            .ok_or(ProtocolError::BufferTooSmall { needed: data.len(), available })?;
        slot.copy_from_slice(data);
        self.pos += data.len();
        Ok(())
    }

    /// Write a big-endian `u16`.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Write a fixed-layout header.
    pub fn write_as<T>(&mut self, value: &T) -> Result<()>
    where
        T: IntoBytes + Immutable,
    {
        self.write_all(value.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn zero_length_read_succeeds_anywhere_in_bounds() {
        let buf = [1, 2, 3];
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_exact(0).unwrap(), &[] as &[u8]);
        assert_eq!(reader.position(), 0);

        reader.skip(3);
        assert_eq!(reader.read_exact(0).unwrap(), &[] as &[u8]);
        assert_eq!(reader.position(), 3);
    }

    #[test]
    fn read_exactly_to_end() {
        let buf = [1, 2, 3];
        let mut reader = Reader::new(&buf);
        reader.skip(1);
        assert_eq!(reader.read_exact(2).unwrap(), &[2, 3]);
        assert_eq!(reader.available(), 0);
        assert!(reader.remaining().is_empty());
    }

    #[test]
    fn read_one_past_end_fails_without_moving() {
        let buf = [1, 2, 3];
        let mut reader = Reader::new(&buf);
        reader.skip(1);
        let err = reader.read_exact(3).unwrap_err();
        assert_eq!(err, ProtocolError::Truncated { needed: 3, available: 2 });
        assert_eq!(reader.position(), 1);
        assert_eq!(reader.remaining(), &[2, 3]);
    }

    #[test]
    fn skip_past_end_clamps_views_not_position() {
        let buf = [1, 2];
        let mut reader = Reader::new(&buf);
        reader.skip(5);
        assert_eq!(reader.position(), 5);
        assert_eq!(reader.available(), 0);
        assert!(reader.remaining().is_empty());
        assert!(reader.read_exact(0).is_err());
        assert!(reader.read_until_nul().is_err());
    }

    #[test]
    fn huge_read_does_not_overflow() {
        let buf = [1, 2];
        let mut reader = Reader::new(&buf);
        reader.skip(1);
        assert!(reader.read_exact(usize::MAX).is_err());
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn read_until_nul_consumes_terminator() {
        let buf = *b"abc\0de\0";
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_until_nul().unwrap(), b"abc");
        assert_eq!(reader.read_until_nul().unwrap(), b"de");
        assert_eq!(reader.available(), 0);
    }

    #[test]
    fn read_until_nul_without_terminator_leaves_position() {
        let buf = *b"abc";
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_until_nul(), Err(ProtocolError::MissingTerminator));
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn read_u16_is_big_endian() {
        let buf = [0x12, 0x34];
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn write_one_stops_at_capacity() {
        let mut buf = [0u8; 2];
        let mut writer = Writer::new(&mut buf);
        writer.write_one(7).unwrap();
        writer.write_one(8).unwrap();
        assert_eq!(
            writer.write_one(9),
            Err(ProtocolError::BufferTooSmall { needed: 1, available: 0 })
        );
        assert_eq!(writer.position(), 2);
        assert_eq!(buf, [7, 8]);
    }

    #[test]
    fn write_all_is_all_or_nothing() {
        let mut buf = [0u8; 4];
        let mut writer = Writer::new(&mut buf);
        writer.write_all(&[1, 2]).unwrap();
        assert!(writer.write_all(&[3, 4, 5]).is_err());
        assert_eq!(writer.position(), 2);
        writer.write_all(&[3, 4]).unwrap();
        assert_eq!(writer.available(), 0);
        assert_eq!(buf, [1, 2, 3, 4]);
    }

    #[test]
    fn writer_skip_leaves_bytes_for_caller() {
        let mut buf = [0u8; 4];
        let mut writer = Writer::new(&mut buf);
        writer.remaining_mut()[..2].copy_from_slice(b"hi");
        writer.skip(2);
        writer.write_one(0).unwrap();
        assert_eq!(writer.position(), 3);
        assert_eq!(&buf[..3], b"hi\0");
    }

    proptest! {
        #[test]
        fn read_exact_is_atomic(
            buf in proptest::collection::vec(any::<u8>(), 0..64),
            start in 0usize..80,
            n in 0usize..80,
        ) {
            let mut reader = Reader::new(&buf);
            reader.skip(start);
            match reader.read_exact(n) {
                Ok(bytes) => {
                    prop_assert!(start + n <= buf.len());
                    prop_assert_eq!(bytes, &buf[start..start + n]);
                    prop_assert_eq!(reader.position(), start + n);
                },
                Err(_) => {
                    prop_assert!(start + n > buf.len());
                    prop_assert_eq!(reader.position(), start);
                },
            }
        }

        #[test]
        fn read_exact_boundaries(buf in proptest::collection::vec(any::<u8>(), 1..64), start in 0usize..64) {
            let start = start % (buf.len() + 1);
            let left = buf.len() - start;

            let mut reader = Reader::new(&buf);
            reader.skip(start);
            prop_assert!(reader.read_exact(left + 1).is_err());
            prop_assert_eq!(reader.position(), start);
            prop_assert_eq!(reader.read_exact(left).map(<[u8]>::len), Ok(left));
            prop_assert_eq!(reader.read_exact(0).map(<[u8]>::len), Ok(0));
        }

        #[test]
        fn write_all_is_atomic(cap in 0usize..32, first in 0usize..32, second in 0usize..32) {
            let mut buf = vec![0u8; cap];
            let mut writer = Writer::new(&mut buf);
            let first_ok = writer.write_all(&vec![1; first]).is_ok();
            prop_assert_eq!(first_ok, first <= cap);
            let after_first = writer.position();
            let second_ok = writer.write_all(&vec![2; second]).is_ok();
            prop_assert_eq!(second_ok, after_first + second <= cap);
            let expected = if second_ok { after_first + second } else { after_first };
            prop_assert_eq!(writer.position(), expected);
        }
    }
}
