//! A module for all decoding needs.
use crate::alloc::{boxed::Box, vec::Vec};
use crate::bits::BitBuffer;
use crate::table::{Entry, Table};
use crate::{Code, LzwError, CODE_SIZE, FIRST_CODE};

#[cfg(feature = "std")]
use std::io::{self, Read, Write};

/// The LZW decompressor.
pub struct Decoder {
    state: Box<DecodeState>,
}

/// A decoding stream sink.
///
/// See [`Decoder::into_stream`] on how to create this type and more information.
///
/// [`Decoder::into_stream`]: struct.Decoder.html#method.into_stream
#[cfg(feature = "std")]
pub struct IntoStream<'d, W> {
    decoder: &'d mut Decoder,
    writer: W,
}

/// An async decoding sink.
///
/// See [`Decoder::into_async`] on how to create this type and more information.
///
/// [`Decoder::into_async`]: struct.Decoder.html#method.into_async
#[cfg(feature = "async")]
pub struct IntoAsync<'d, W> {
    decoder: &'d mut Decoder,
    writer: W,
}

/// The result of coding a whole stream.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct AllResult {
    /// The total number of bytes consumed from the reader.
    pub bytes_read: usize,
    /// The total number of bytes written into the writer.
    pub bytes_written: usize,
    /// The number of code words in the coded stream.
    pub code_words: usize,
    /// The possible error that occurred.
    ///
    /// Note that when writing into streams it is not in general possible to recover from an
    /// error.
    pub status: std::io::Result<()>,
}

struct DecodeState {
    /// The table of decoded codes.
    table: Table,
    /// The dictionary resets during the last call.
    resets: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            state: Box::new(DecodeState::new()),
        }
    }

    /// Decode exactly `code_words` codes starting at the read cursor of `inp`.
    ///
    /// The count is not part of the stream and has to be the one reported by the encoder. Too
    /// few codes in `inp` fail with [`LzwError::ReadPastEnd`].
    ///
    /// [`LzwError::ReadPastEnd`]: ../enum.LzwError.html#variant.ReadPastEnd
    pub fn decompress(
        &mut self,
        inp: &mut BitBuffer,
        code_words: usize,
    ) -> Result<Vec<u8>, LzwError> {
        // The count is untrusted, only codes actually present can contribute to the estimate.
        let present = code_words.min(inp.remaining() / usize::from(CODE_SIZE));
        let mut out = BitBuffer::with_capacity(1 + present * usize::from(CODE_SIZE) / 8);
        let written = self.decompress_into(inp, code_words, &mut out)?;
        out.extract_bytes(8 * written)
    }

    /// Decode exactly `code_words` codes, appending the bytes at the write cursor of `out`.
    ///
    /// Returns the number of bytes written.
    pub fn decompress_into(
        &mut self,
        inp: &mut BitBuffer,
        code_words: usize,
        out: &mut BitBuffer,
    ) -> Result<usize, LzwError> {
        self.state.advance(inp, code_words, out)
    }

    /// The number of dictionary resets during the last decompression.
    pub fn resets(&self) -> usize {
        self.state.resets
    }

    /// Construct a decoder into a writer.
    #[cfg(feature = "std")]
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            decoder: self,
            writer,
        }
    }

    /// Construct a decoder into an async writer.
    #[cfg(feature = "async")]
    pub fn into_async<W: futures::io::AsyncWrite>(&mut self, writer: W) -> IntoAsync<'_, W> {
        IntoAsync {
            decoder: self,
            writer,
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}

#[cfg(feature = "std")]
impl<W: Write> IntoStream<'_, W> {
    /// Decode `code_words` codes of packed data from a reader.
    ///
    /// The whole input is read before decoding.
    pub fn decode_all(self, mut read: impl Read, code_words: usize) -> AllResult {
        let IntoStream { decoder, mut writer } = self;

        let mut bytes_read = 0;
        let mut bytes_written = 0;

        let status = (|| {
            let mut data = Vec::new();
            bytes_read = read.read_to_end(&mut data)?;

            let mut packed = BitBuffer::from_bytes(&data);
            let decoded = decoder
                .decompress(&mut packed, code_words)
                .map_err(invalid_data)?;

            writer.write_all(&decoded)?;
            writer.flush()?;
            bytes_written = decoded.len();
            Ok::<_, io::Error>(())
        })();

        AllResult {
            bytes_read,
            bytes_written,
            code_words,
            status,
        }
    }
}

#[cfg(feature = "async")]
impl<W: futures::io::AsyncWrite + core::marker::Unpin> IntoAsync<'_, W> {
    /// Decode `code_words` codes of packed data from an async reader.
    ///
    /// See [`IntoStream::decode_all`] for the semantics.
    ///
    /// [`IntoStream::decode_all`]: struct.IntoStream.html#method.decode_all
    pub async fn decode_all(
        self,
        mut read: impl futures::io::AsyncRead + core::marker::Unpin,
        code_words: usize,
    ) -> AllResult {
        use futures::io::{AsyncReadExt, AsyncWriteExt};
        let IntoAsync { decoder, mut writer } = self;

        let mut bytes_read = 0;
        let mut bytes_written = 0;

        let status = async {
            let mut data = Vec::new();
            bytes_read = read.read_to_end(&mut data).await?;

            let mut packed = BitBuffer::from_bytes(&data);
            let decoded = decoder
                .decompress(&mut packed, code_words)
                .map_err(invalid_data)?;

            writer.write_all(&decoded).await?;
            writer.flush().await?;
            bytes_written = decoded.len();
            Ok::<_, io::Error>(())
        }
        .await;

        AllResult {
            bytes_read,
            bytes_written,
            code_words,
            status,
        }
    }
}

#[cfg(feature = "std")]
fn invalid_data(err: LzwError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

impl DecodeState {
    fn new() -> Self {
        DecodeState {
            table: Table::new(),
            resets: 0,
        }
    }

    fn entry(&self, code: Code) -> Result<&Entry, LzwError> {
        self.table.get(code).ok_or(LzwError::InvalidCode(code))
    }

    fn advance(
        &mut self,
        inp: &mut BitBuffer,
        code_words: usize,
        out: &mut BitBuffer,
    ) -> Result<usize, LzwError> {
        self.table.reset();
        self.resets = 0;

        if code_words == 0 {
            return Ok(0);
        }

        // The first code after a reset can only be a literal.
        let mut previous = inp.read_code()?;
        let first = self.entry(previous)?;
        out.write_bytes(first.pattern());
        let mut written = first.len();

        for _ in 1..code_words {
            let next = inp.read_code()?;

            // Each code after the first completes the entry the encoder created when emitting
            // the previous one. If that creation reset the dictionary, `next` already refers to
            // the fresh table.
            let full = self.table.is_full();
            let next_free = if full {
                FIRST_CODE
            } else {
                self.table.next_code()
            };

            let prefix = self.entry(previous)?;
            let byte = if next < next_free {
                self.entry(next)?.first_byte()
            } else if next == next_free {
                // The encoder used the entry right after creating it, so it starts like its
                // own prefix.
                prefix.first_byte()
            } else {
                return Err(LzwError::InvalidCode(next));
            };
            let derived = prefix.extend(byte);

            if full {
                tracing::debug!(written, "code space exhausted, resetting table");
                self.table.reset();
                self.resets += 1;
            }
            self.table.push(derived);

            let current = self.entry(next)?;
            out.write_bytes(current.pattern());
            written += current.len();
            previous = next;
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::Decoder;
    use crate::{BitBuffer, LzwError, FIRST_CODE, MAX_ENTRIES};

    fn packed(codes: &[u16]) -> BitBuffer {
        let mut buffer = BitBuffer::new();
        for &code in codes {
            buffer.write(u32::from(code), 12).unwrap();
        }
        buffer.rewind();
        buffer
    }

    #[test]
    fn zero_codes_decode_to_nothing() {
        let mut buffer = BitBuffer::new();
        assert_eq!(Decoder::new().decompress(&mut buffer, 0), Ok(vec![]));
    }

    #[test]
    fn classic_sequence() {
        let mut buffer = packed(&[65, 66, 256, 258]);
        assert_eq!(Decoder::new().decompress(&mut buffer, 4), Ok(b"ABABABA".to_vec()));
    }

    #[test]
    fn self_referential_code() {
        // The second code refers to the entry created while reading it.
        let mut buffer = packed(&[65, 256, 257]);
        assert_eq!(Decoder::new().decompress(&mut buffer, 3), Ok(b"AAAAAA".to_vec()));
    }

    #[test]
    fn unassigned_code_rejected() {
        let mut buffer = packed(&[65, 257]);
        assert_eq!(
            Decoder::new().decompress(&mut buffer, 2),
            Err(LzwError::InvalidCode(257))
        );

        let mut buffer = packed(&[300]);
        assert_eq!(
            Decoder::new().decompress(&mut buffer, 1),
            Err(LzwError::InvalidCode(300))
        );
    }

    #[test]
    fn missing_codes_fail() {
        let mut buffer = packed(&[65, 66]);
        assert!(matches!(
            Decoder::new().decompress(&mut buffer, 3),
            Err(LzwError::ReadPastEnd { requested: 12, remaining: 0 })
        ));
    }

    #[test]
    fn oversized_count_fails_at_end_of_input() {
        let mut buffer = BitBuffer::from_bytes(&[0x04, 0x10, 0x42]);
        assert!(matches!(
            Decoder::new().decompress(&mut buffer, usize::MAX),
            Err(LzwError::ReadPastEnd { .. })
        ));
    }

    /// Codes that fill the table exactly with their last literal.
    fn literals_until_full(byte: u8) -> Vec<u16> {
        // Every code after the first creates one entry.
        vec![u16::from(byte); MAX_ENTRIES - usize::from(FIRST_CODE) + 1]
    }

    #[test]
    fn fresh_code_right_after_reset() {
        let mut codes = literals_until_full(b'A');
        let literals = codes.len();
        codes.push(FIRST_CODE);

        let mut buffer = packed(&codes);
        let mut decoder = Decoder::new();
        let decoded = decoder.decompress(&mut buffer, codes.len()).unwrap();

        let mut expected = vec![b'A'; literals];
        expected.extend_from_slice(b"AA");
        assert_eq!(decoded, expected);
        assert_eq!(decoder.resets(), 1);
    }

    #[test]
    fn stale_code_right_after_reset_rejected() {
        // Code 257 was assigned before the reset but not yet after it.
        let mut codes = literals_until_full(b'A');
        codes.push(FIRST_CODE + 1);

        let mut buffer = packed(&codes);
        assert_eq!(
            Decoder::new().decompress(&mut buffer, codes.len()),
            Err(LzwError::InvalidCode(FIRST_CODE + 1))
        );
    }

    #[test]
    fn decoder_is_reusable_after_error() {
        let mut decoder = Decoder::new();
        let mut bad = packed(&[65, 4000]);
        assert!(decoder.decompress(&mut bad, 2).is_err());

        let mut good = packed(&[72, 73]);
        assert_eq!(decoder.decompress(&mut good, 2), Ok(b"HI".to_vec()));
    }
}
