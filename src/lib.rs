//! # LZW with fixed 12-bit code words
//!
//! This crate provides an [`Encoder`] and a [`Decoder`] for LZW streams in which every code word
//! is exactly 12 bits wide, written most significant bit first. The dictionary holds at most
//! 4096 entries. Codes `0..256` are the literal bytes, every further pattern is assigned the next
//! free code starting at `256`, and once the code space is exhausted the dictionary is reset to
//! the literals and assignment resumes at `256`.
//!
//! The stream is not self-describing. It has no header and no end code, so the number of code
//! words written by the encoder must travel out-of-band to the decoder.
//!
//! Exemplary use:
//!
//! ```
//! use lzw12::{decode::Decoder, encode::Encoder};
//! let data = b"TOBEORNOTTOBEORTOBEORNOT";
//!
//! let mut compressed = Encoder::new().compress(data);
//! assert!(compressed.code_words < data.len());
//!
//! let restored = Decoder::new()
//!     .decompress(&mut compressed.buffer, compressed.code_words)
//!     .unwrap();
//! assert_eq!(&restored[..], &data[..]);
//! ```
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

#[cfg(all(feature = "alloc", not(feature = "std")))]
extern crate alloc;
#[cfg(all(feature = "alloc", feature = "std"))]
use std as alloc;

/// The width of every code word in bits.
pub const CODE_SIZE: u8 = 12;
/// The number of codes in the dictionary.
pub const MAX_ENTRIES: usize = 1 << CODE_SIZE as usize;
/// The number of literal codes, one for each byte value.
pub const LITERALS: usize = 256;
/// The first code assigned to a multi-byte pattern.
pub const FIRST_CODE: Code = LITERALS as Code;

/// Alias for a LZW code point
pub type Code = u16;

/// Selects how the dictionary trie searches among the children of a node.
///
/// Both strategies produce the same code stream. They only differ in speed, depending on how
/// many distinct bytes follow the typical pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Children are appended in insertion order and scanned linearly.
    Linear,
    /// Children are kept sorted by edge byte and searched by bisection once a node has many.
    Sorted,
}

/// The error kinds of the bit buffer and the codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LzwError {
    /// A bit field wider than 32 bits was requested.
    InvalidBitCount(u8),
    /// Fewer bits remain in the buffer than were requested.
    ReadPastEnd {
        /// The number of bits requested.
        requested: usize,
        /// The number of valid bits that were left.
        remaining: usize,
    },
    /// The stream contained a code that is not yet assigned in the dictionary.
    InvalidCode(Code),
}

impl core::fmt::Display for LzwError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LzwError::InvalidBitCount(bits) => {
                write!(f, "invalid bit count {}, fields are at most 32 bits", bits)
            }
            LzwError::ReadPastEnd {
                requested,
                remaining,
            } => write!(
                f,
                "cannot read {} bits from a buffer with {} bits remaining",
                requested, remaining
            ),
            LzwError::InvalidCode(code) => write!(f, "invalid code {} in stream", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for LzwError {}

#[cfg(feature = "alloc")]
pub mod bits;
#[cfg(feature = "alloc")]
pub mod decode;
#[cfg(feature = "alloc")]
pub mod encode;
#[cfg(feature = "alloc")]
mod intlist;
#[cfg(feature = "alloc")]
pub mod table;
#[cfg(feature = "alloc")]
pub mod trie;

#[cfg(feature = "alloc")]
pub use self::bits::BitBuffer;
#[cfg(feature = "alloc")]
pub use self::decode::Decoder;
#[cfg(feature = "alloc")]
pub use self::encode::{Compressed, Encoder};

/// Compress `data` with a fresh encoder using the default search strategy.
#[cfg(feature = "alloc")]
pub fn compress(data: &[u8]) -> Compressed {
    Encoder::new().compress(data)
}

/// Decompress exactly `code_words` codes from the start of `buffer`.
///
/// The read cursor of `buffer` is rewound before decoding.
#[cfg(feature = "alloc")]
pub fn decompress(
    buffer: &mut BitBuffer,
    code_words: usize,
) -> Result<alloc::vec::Vec<u8>, LzwError> {
    buffer.rewind();
    Decoder::new().decompress(buffer, code_words)
}
