//! A growable buffer of bits packed into 64-bit words.
//!
//! Fields are written and read most significant bit first. The first bit of the buffer is the
//! highest bit of the first word, so the byte view of a buffer is the big-endian serialization of
//! its words.
use crate::alloc::vec::Vec;
use crate::{Code, LzwError, CODE_SIZE};

const WORD_BITS: usize = 64;
/// The widest field a single `write` or `read_bits` may transfer.
pub const MAX_FIELD_BITS: u8 = 32;

/// An append and random-access buffer of individual bits.
///
/// The buffer has separate read and write cursors. [`rewind`] moves both back to the origin
/// without touching the content, which allows reading back what was just written. [`clear`]
/// additionally discards all content.
///
/// [`rewind`]: #method.rewind
/// [`clear`]: #method.clear
#[derive(Clone, Debug)]
pub struct BitBuffer {
    /// The backing words, never empty.
    words: Vec<u64>,
    /// The bit address of the next write.
    write_pos: usize,
    /// The bit address of the next read.
    read_pos: usize,
    /// The number of valid bits.
    len: usize,
}

impl BitBuffer {
    /// Create a buffer with room for one word.
    pub fn new() -> Self {
        Self::with_capacity(8)
    }

    /// Create a buffer with room for at least `bytes` bytes before it needs to grow.
    pub fn with_capacity(bytes: usize) -> Self {
        let mut words = Vec::new();
        words.resize(((bytes + 7) / 8).max(1), 0);
        BitBuffer {
            words,
            write_pos: 0,
            read_pos: 0,
            len: 0,
        }
    }

    /// Create a buffer whose content is `bytes`, with both cursors at the origin.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut words = Vec::with_capacity(bytes.len() / 8 + 1);
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            words.push(u64::from_be_bytes(word));
        }

        if words.is_empty() {
            words.push(0);
        }

        BitBuffer {
            words,
            write_pos: 0,
            read_pos: 0,
            len: bytes.len() * 8,
        }
    }

    /// The number of valid bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of bits that fit before the next growth.
    pub fn capacity(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    /// The number of valid bits after the read cursor.
    pub fn remaining(&self) -> usize {
        self.len.saturating_sub(self.read_pos)
    }

    /// The bit address of the read cursor.
    pub fn read_position(&self) -> usize {
        self.read_pos
    }

    /// The bit address of the write cursor.
    pub fn write_position(&self) -> usize {
        self.write_pos
    }

    /// Move both cursors back to the origin, keeping the content.
    pub fn rewind(&mut self) {
        self.read_pos = 0;
        self.write_pos = 0;
    }

    /// Discard all content and move both cursors to the origin.
    ///
    /// The storage is kept for reuse.
    pub fn clear(&mut self) {
        for word in &mut self.words {
            *word = 0;
        }
        self.rewind();
        self.len = 0;
    }

    /// Append the low `bits` bits of `value` at the write cursor, most significant first.
    ///
    /// Writing zero bits does nothing. More than 32 bits are rejected and leave the buffer
    /// unchanged.
    pub fn write(&mut self, value: u32, bits: u8) -> Result<(), LzwError> {
        if bits > MAX_FIELD_BITS {
            return Err(LzwError::InvalidBitCount(bits));
        }

        if bits == 0 {
            return Ok(());
        }

        self.put(value, usize::from(bits));
        Ok(())
    }

    /// Append a code word.
    pub(crate) fn write_code(&mut self, code: Code) {
        self.put(u32::from(code), usize::from(CODE_SIZE));
    }

    /// Consume a code word.
    pub(crate) fn read_code(&mut self) -> Result<Code, LzwError> {
        self.read_bits(CODE_SIZE).map(|code| code as Code)
    }

    /// Append every byte of `bytes` as an 8-bit field.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.reserve_to(self.write_pos + 8 * bytes.len());
        for &byte in bytes {
            self.put(u32::from(byte), 8);
        }
    }

    /// Consume the next `bits` bits at the read cursor, right-aligned in the result.
    ///
    /// Fails without moving the cursor if fewer than `bits` valid bits remain.
    pub fn read_bits(&mut self, bits: u8) -> Result<u32, LzwError> {
        if bits > MAX_FIELD_BITS {
            return Err(LzwError::InvalidBitCount(bits));
        }

        let count = usize::from(bits);
        let remaining = self.remaining();
        if count > remaining {
            return Err(LzwError::ReadPastEnd {
                requested: count,
                remaining,
            });
        }

        if count == 0 {
            return Ok(0);
        }

        let index = self.read_pos / WORD_BITS;
        let free = WORD_BITS - self.read_pos % WORD_BITS;
        let word = self.words[index];

        let value = if count <= free {
            (word >> (free - count)) & mask(count)
        } else {
            let tail = count - free;
            let high = word & mask(free);
            let low = self.words[index + 1] >> (WORD_BITS - tail);
            (high << tail) | low
        };

        self.read_pos += count;
        Ok(value as u32)
    }

    /// Return the first `bits` bits of the content as bytes, independent of the cursors.
    ///
    /// A final partial byte is left-justified with its low bits zero.
    pub fn extract_bytes(&self, bits: usize) -> Result<Vec<u8>, LzwError> {
        if bits > self.len {
            return Err(LzwError::ReadPastEnd {
                requested: bits,
                remaining: self.len,
            });
        }

        let full = bits / 8;
        let partial = bits % 8;
        let mut bytes = Vec::with_capacity(full + 1);
        bytes.extend(
            self.words
                .iter()
                .flat_map(|word| word.to_be_bytes())
                .take(full + usize::from(partial > 0)),
        );

        if partial > 0 {
            if let Some(last) = bytes.last_mut() {
                *last &= 0xff << (8 - partial);
            }
        }

        Ok(bytes)
    }

    /// Return the whole content as bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.extract_bytes(self.len).unwrap_or_default()
    }

    /// Write the low `count` bits of `value`, for `count` in `1..=32`.
    fn put(&mut self, value: u32, count: usize) {
        let end = self.write_pos + count;
        self.reserve_to(end);

        let value = u64::from(value) & mask(count);
        let index = self.write_pos / WORD_BITS;
        let free = WORD_BITS - self.write_pos % WORD_BITS;

        if count <= free {
            let shift = free - count;
            let word = &mut self.words[index];
            *word = (*word & !(mask(count) << shift)) | (value << shift);
        } else {
            // The field straddles two words: the high part fills the current word, the rest
            // starts the next one.
            let tail = count - free;
            let head = &mut self.words[index];
            *head = (*head & !mask(free)) | (value >> tail);
            let next = &mut self.words[index + 1];
            let shift = WORD_BITS - tail;
            *next = (*next & !(mask(tail) << shift)) | ((value & mask(tail)) << shift);
        }

        self.write_pos = end;
        self.len = self.len.max(end);
    }

    /// Double the word array until the bit address `end` is addressable.
    fn reserve_to(&mut self, end: usize) {
        let mut words = self.words.len();
        if end <= words * WORD_BITS {
            return;
        }

        while end > words * WORD_BITS {
            words *= 2;
        }

        tracing::trace!(from = self.words.len(), to = words, "bit buffer grows");
        self.words.resize(words, 0);
    }
}

impl Default for BitBuffer {
    fn default() -> Self {
        BitBuffer::new()
    }
}

/// The low `bits` bits set, for `bits` below 64.
fn mask(bits: usize) -> u64 {
    (1u64 << bits) - 1
}

#[cfg(test)]
mod tests {
    use super::{BitBuffer, LzwError};

    #[test]
    fn reads_back_mixed_widths_across_growth() {
        for first in 1..=32u8 {
            for second in 1..=32u8 {
                let mut buffer = BitBuffer::with_capacity(1);
                let a = 0xdead_beefu32 & ((1u64 << first) - 1) as u32;
                let b = 0x5a5a_a5a5u32 & ((1u64 << second) - 1) as u32;

                // Enough fields to force at least one doubling of a single word.
                let rounds = 64 / usize::from(first + second) + 2;
                for _ in 0..rounds {
                    buffer.write(a, first).unwrap();
                    buffer.write(b, second).unwrap();
                }
                assert!(buffer.capacity() > 64);

                buffer.rewind();
                for _ in 0..rounds {
                    assert_eq!(buffer.read_bits(first), Ok(a), "{} {}", first, second);
                    assert_eq!(buffer.read_bits(second), Ok(b), "{} {}", first, second);
                }
                assert_eq!(buffer.remaining(), 0);
            }
        }
    }

    #[test]
    fn straddles_word_boundary() {
        let mut buffer = BitBuffer::with_capacity(8);
        buffer.write(0, 60).unwrap_err();
        buffer.write(0, 30).unwrap();
        buffer.write(0, 30).unwrap();
        buffer.write(0xfff, 12).unwrap();
        assert_eq!(buffer.len(), 72);
        assert_eq!(buffer.capacity(), 128);

        buffer.rewind();
        assert_eq!(buffer.read_bits(30), Ok(0));
        assert_eq!(buffer.read_bits(30), Ok(0));
        assert_eq!(buffer.read_bits(12), Ok(0xfff));
    }

    #[test]
    fn msb_first_bytes() {
        let mut buffer = BitBuffer::new();
        buffer.write(0x41, 12).unwrap();
        buffer.write(0x42, 12).unwrap();
        assert_eq!(buffer.extract_bytes(24), Ok(vec![0x04, 0x10, 0x42]));
        assert_eq!(buffer.to_bytes(), vec![0x04, 0x10, 0x42]);

        buffer.write(0xfff, 12).unwrap();
        // The trailing nibble is padded with zeros.
        assert_eq!(buffer.extract_bytes(36), Ok(vec![0x04, 0x10, 0x42, 0xff, 0xf0]));
        assert_eq!(buffer.extract_bytes(3), Ok(vec![0x00]));
        assert_eq!(buffer.extract_bytes(0), Ok(vec![]));
    }

    #[test]
    fn from_bytes_reads_fields() {
        let mut buffer = BitBuffer::from_bytes(&[0x04, 0x10, 0x42, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(buffer.len(), 80);
        assert_eq!(buffer.read_bits(12), Ok(0x41));
        assert_eq!(buffer.read_bits(12), Ok(0x42));
        assert_eq!(buffer.read_bits(32), Ok(0x0102_0304));
        assert_eq!(buffer.read_bits(24), Ok(0x05_0607));
        assert!(BitBuffer::from_bytes(&[]).is_empty());
    }

    #[test]
    fn read_past_end_keeps_cursor() {
        let mut buffer = BitBuffer::new();
        buffer.write(0b101, 3).unwrap();
        assert_eq!(
            buffer.read_bits(4),
            Err(LzwError::ReadPastEnd {
                requested: 4,
                remaining: 3
            })
        );
        assert_eq!(buffer.read_position(), 0);
        assert_eq!(buffer.read_bits(3), Ok(0b101));
        assert_eq!(buffer.read_bits(0), Ok(0));
        assert!(buffer.read_bits(1).is_err());
    }

    #[test]
    fn rejects_wide_fields() {
        let mut buffer = BitBuffer::new();
        assert_eq!(buffer.write(1, 33), Err(LzwError::InvalidBitCount(33)));
        assert!(buffer.is_empty());
        assert_eq!(buffer.write_position(), 0);
        assert_eq!(buffer.read_bits(40), Err(LzwError::InvalidBitCount(40)));
        assert!(buffer.extract_bytes(1).is_err());
    }

    #[test]
    fn rewind_overwrites_and_clear_discards() {
        let mut buffer = BitBuffer::new();
        buffer.write(0xff, 8).unwrap();
        buffer.write(0xff, 8).unwrap();

        buffer.rewind();
        buffer.write(0x0, 4).unwrap();
        assert_eq!(buffer.len(), 16);
        assert_eq!(buffer.to_bytes(), vec![0x0f, 0xff]);

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.remaining(), 0);
        buffer.write(0x1, 1).unwrap();
        assert_eq!(buffer.to_bytes(), vec![0x80]);
    }

    #[test]
    fn write_bytes_grows() {
        let data: Vec<u8> = (0..=255).collect();
        let mut buffer = BitBuffer::with_capacity(1);
        buffer.write(0b1, 1).unwrap();
        buffer.write_bytes(&data);
        assert_eq!(buffer.len(), 1 + 8 * 256);

        buffer.rewind();
        assert_eq!(buffer.read_bits(1), Ok(1));
        for &byte in &data {
            assert_eq!(buffer.read_bits(8), Ok(u32::from(byte)));
        }
    }
}
