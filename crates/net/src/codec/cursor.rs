use super::{Decode, Encode};

/// Append-only byte sequence builder. All multi-byte values written through
/// [`Encode`] land in big-endian wire order regardless of host endianness.
#[derive(Debug, Default, Clone)]
pub struct WriteCursor {
    buf: Vec<u8>,
}

impl WriteCursor {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Encodes `value` and returns the number of bytes appended.
    pub fn write<T: Encode + ?Sized>(&mut self, value: &T) -> usize {
        let before = self.buf.len();
        value.encode(self);
        self.buf.len() - before
    }

    pub fn put_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Immutable byte sequence plus a read position.
///
/// The cursor is sticky on failure: the first read that cannot be satisfied
/// poisons it, and every subsequent read returns `None`. Without this a
/// partially failed composite decode would keep pulling misaligned garbage.
#[derive(Debug)]
pub struct ReadCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> ReadCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }

    /// Decodes a value of type `T`, or `None` if the cursor is exhausted,
    /// poisoned, or `T`'s deserializer rejects the bytes.
    pub fn read<T: Decode>(&mut self) -> Option<T> {
        if self.failed {
            return None;
        }
        let value = T::decode(self);
        if value.is_none() {
            self.failed = true;
        }
        value
    }

    /// Consumes exactly `count` bytes, failing whole if fewer remain.
    pub fn take_bytes(&mut self, count: usize) -> Option<&'a [u8]> {
        if self.failed || self.remaining() < count {
            self.failed = true;
            return None;
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Some(slice)
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.failed || self.remaining() == 0
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trip() {
        let mut out = WriteCursor::new();
        out.write(&0xDEADBEEFu32);
        out.write(&-7i16);
        out.write(&true);

        let mut input = ReadCursor::new(out.as_bytes());
        assert_eq!(input.read::<u32>(), Some(0xDEADBEEF));
        assert_eq!(input.read::<i16>(), Some(-7));
        assert_eq!(input.read::<bool>(), Some(true));
        assert!(input.is_exhausted());
    }

    #[test]
    fn write_reports_byte_count() {
        let mut out = WriteCursor::new();
        assert_eq!(out.write(&1u8), 1);
        assert_eq!(out.write(&1u32), 4);
        assert_eq!(out.write(&1u64), 8);
        assert_eq!(out.len(), 13);
    }

    #[test]
    fn big_endian_canonical_bytes() {
        // Scenario: u32(12) then u8(12) must produce [0,0,0,12,12] on every host.
        let mut out = WriteCursor::new();
        out.write(&12u32);
        out.write(&12u8);
        assert_eq!(out.as_bytes(), &[0, 0, 0, 12, 12]);
    }

    #[test]
    fn failed_read_is_sticky() {
        let bytes = [0u8, 1];
        let mut input = ReadCursor::new(&bytes);
        assert_eq!(input.read::<u32>(), None);
        // Two bytes are still physically present, but the cursor is poisoned.
        assert_eq!(input.read::<u8>(), None);
        assert!(input.has_failed());
    }

    #[test]
    fn take_bytes_fails_whole() {
        let bytes = [1u8, 2, 3];
        let mut input = ReadCursor::new(&bytes);
        assert_eq!(input.take_bytes(4), None);
        assert_eq!(input.take_bytes(1), None);
    }
}
