//! A module for all encoding needs.
use crate::alloc::{boxed::Box, vec::Vec};
use crate::bits::BitBuffer;
use crate::table::Dictionary;
use crate::trie::{ChildSearch, Linear, Node, Sorted, ROOT};
use crate::{Code, LzwError, SearchStrategy, CODE_SIZE};

#[cfg(feature = "std")]
use crate::decode::AllResult;
#[cfg(feature = "std")]
use std::io::{self, Read, Write};

/// The LZW compressor.
///
/// One encoder can compress any number of unrelated inputs, every call starts from the literal
/// dictionary.
pub struct Encoder {
    state: Box<dyn Stateful + Send + 'static>,
}

/// The outcome of compressing an input.
#[derive(Clone, Debug)]
pub struct Compressed {
    /// The code words, packed from the origin of the buffer.
    pub buffer: BitBuffer,
    /// The number of code words, which the decoder needs to know.
    pub code_words: usize,
}

/// An encoding stream sink.
///
/// See [`Encoder::into_stream`] on how to create this type and more information.
///
/// [`Encoder::into_stream`]: struct.Encoder.html#method.into_stream
#[cfg(feature = "std")]
pub struct IntoStream<'d, W> {
    encoder: &'d mut Encoder,
    writer: W,
}

/// An async encoding sink.
///
/// See [`Encoder::into_async`] on how to create this type and more information.
///
/// [`Encoder::into_async`]: struct.Encoder.html#method.into_async
#[cfg(feature = "async")]
pub struct IntoAsync<'d, W> {
    encoder: &'d mut Encoder,
    writer: W,
}

trait Stateful {
    fn compress(&mut self, inp: &[u8], out: &mut BitBuffer) -> usize;
    fn resets(&self) -> usize;
}

struct EncodeState<S: ChildSearch> {
    /// The patterns seen so far and their codes.
    dictionary: Dictionary<S>,
    /// The bytes of the current candidate pattern.
    pattern: Vec<u8>,
    /// The dictionary resets during the last call.
    resets: usize,
}

impl Encoder {
    /// Create an encoder whose dictionary scans children linearly.
    pub fn new() -> Self {
        Encoder::with_search(SearchStrategy::Linear)
    }

    /// Create an encoder using the given child search in its dictionary.
    pub fn with_search(search: SearchStrategy) -> Self {
        type Boxed = Box<dyn Stateful + Send + 'static>;
        let state = match search {
            SearchStrategy::Linear => Box::new(EncodeState::<Linear>::new()) as Boxed,
            SearchStrategy::Sorted => Box::new(EncodeState::<Sorted>::new()) as Boxed,
        };

        Encoder { state }
    }

    /// Compress all of `data` into a new buffer.
    pub fn compress(&mut self, data: &[u8]) -> Compressed {
        let mut buffer = BitBuffer::with_capacity(data.len() / 2 + 8);
        let code_words = self.compress_into(data, &mut buffer);
        Compressed { buffer, code_words }
    }

    /// Compress all of `data`, appending the code words at the write cursor of `out`.
    ///
    /// Returns the number of code words written.
    pub fn compress_into(&mut self, data: &[u8], out: &mut BitBuffer) -> usize {
        self.state.compress(data, out)
    }

    /// The number of dictionary resets during the last compression.
    pub fn resets(&self) -> usize {
        self.state.resets()
    }

    /// Construct an encoder into a writer.
    #[cfg(feature = "std")]
    pub fn into_stream<W: Write>(&mut self, writer: W) -> IntoStream<'_, W> {
        IntoStream {
            encoder: self,
            writer,
        }
    }

    /// Construct an encoder into an async writer.
    #[cfg(feature = "async")]
    pub fn into_async<W: futures::io::AsyncWrite>(&mut self, writer: W) -> IntoAsync<'_, W> {
        IntoAsync {
            encoder: self,
            writer,
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Encoder::new()
    }
}

impl Compressed {
    /// The number of meaningful bits in the buffer.
    pub fn bit_len(&self) -> usize {
        self.code_words * usize::from(CODE_SIZE)
    }

    /// The packed code words with zero padding in the final byte.
    ///
    /// Fails with [`LzwError::ReadPastEnd`] when `buffer` no longer holds `code_words` codes.
    ///
    /// [`LzwError::ReadPastEnd`]: ../enum.LzwError.html#variant.ReadPastEnd
    pub fn to_bytes(&self) -> Result<Vec<u8>, LzwError> {
        self.buffer.extract_bytes(self.bit_len())
    }
}

#[cfg(feature = "std")]
impl<W: Write> IntoStream<'_, W> {
    /// Encode all data from a reader.
    ///
    /// The whole input is read before encoding. The writer receives the packed code words, the
    /// number of which is reported in the result.
    pub fn encode_all(self, mut read: impl Read) -> AllResult {
        let IntoStream { encoder, mut writer } = self;

        let mut bytes_read = 0;
        let mut bytes_written = 0;
        let mut code_words = 0;

        let status = (|| {
            let mut data = Vec::new();
            bytes_read = read.read_to_end(&mut data)?;

            let compressed = encoder.compress(&data);
            let packed = compressed.to_bytes().map_err(inconsistent)?;
            code_words = compressed.code_words;

            writer.write_all(&packed)?;
            writer.flush()?;
            bytes_written = packed.len();
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
    /// Encode all data from an async reader.
    ///
    /// See [`IntoStream::encode_all`] for the semantics.
    ///
    /// [`IntoStream::encode_all`]: struct.IntoStream.html#method.encode_all
    pub async fn encode_all(
        self,
        mut read: impl futures::io::AsyncRead + core::marker::Unpin,
    ) -> AllResult {
        use futures::io::{AsyncReadExt, AsyncWriteExt};
        let IntoAsync { encoder, mut writer } = self;

        let mut bytes_read = 0;
        let mut bytes_written = 0;
        let mut code_words = 0;

        let status = async {
            let mut data = Vec::new();
            bytes_read = read.read_to_end(&mut data).await?;

            let compressed = encoder.compress(&data);
            let packed = compressed.to_bytes().map_err(inconsistent)?;
            code_words = compressed.code_words;

            writer.write_all(&packed).await?;
            writer.flush().await?;
            bytes_written = packed.len();
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
fn inconsistent(err: LzwError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

impl<S: ChildSearch> EncodeState<S> {
    fn new() -> Self {
        EncodeState {
            dictionary: Dictionary::new(),
            pattern: Vec::with_capacity(64),
            resets: 0,
        }
    }

    /// Walk one byte down from `node`, if the longer pattern is itself an entry.
    fn extend(&self, node: Node, byte: u8) -> Option<(Node, Code)> {
        let trie = self.dictionary.trie();
        let next = trie.child(node, byte)?;
        trie.value(next).map(|code| (next, code))
    }
}

impl<S: ChildSearch> Stateful for EncodeState<S> {
    fn compress(&mut self, inp: &[u8], out: &mut BitBuffer) -> usize {
        self.dictionary.reset();
        self.pattern.clear();
        self.resets = 0;

        let mut code_words = 0;
        // The candidate, that is the longest match so far, as its trie node and code.
        let mut node = ROOT;
        let mut current: Option<Code> = None;

        for &byte in inp {
            self.pattern.push(byte);
            if let Some((next, code)) = self.extend(node, byte) {
                node = next;
                current = Some(code);
                continue;
            }

            if let Some(code) = current {
                out.write_code(code);
                code_words += 1;
            }

            let (_, reset) = self.dictionary.insert(&self.pattern);
            if reset {
                self.resets += 1;
            }

            self.pattern.clear();
            self.pattern.push(byte);
            node = self.dictionary.literal_node(byte);
            current = Some(Code::from(byte));
        }

        if let Some(code) = current {
            out.write_code(code);
            code_words += 1;
        }

        code_words
    }

    fn resets(&self) -> usize {
        self.resets
    }
}
