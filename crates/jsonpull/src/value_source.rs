//! Raw extraction of the next JSON value as a byte stream.
//!
//! [`JsonReader::next_source`] pre-seeds a prefix with whatever the reader
//! already consumed to classify the value (an opener byte, or a whole
//! primitive literal), then tracks nesting and string state just far enough
//! to know where the value ends. Bytes are never consumed past that end.

use alloc::vec::Vec;

use crate::byte_set::ByteSet;
use crate::error::Result;
use crate::reader::{JsonReader, DOUBLE_QUOTE_OR_SLASH, SINGLE_QUOTE_OR_SLASH};
use crate::scope::Scope;

const JSON_INTERESTING: ByteSet = ByteSet::of(b"[]{}\"'");

/// Where the sub-stream's scan currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamState {
    /// Between values inside an object or array; brackets adjust the depth.
    Json,
    /// Inside a double-quoted string; `\` escapes the next byte.
    DoubleQuoted,
    /// Inside a single-quoted (lenient) string.
    SingleQuoted,
    /// The value is complete; only the prefix may remain to drain.
    EndOfJson,
}

impl StreamState {
    fn interesting(self) -> &'static ByteSet {
        match self {
            StreamState::Json => &JSON_INTERESTING,
            StreamState::DoubleQuoted => &DOUBLE_QUOTE_OR_SLASH,
            StreamState::SingleQuoted => &SINGLE_QUOTE_OR_SLASH,
            StreamState::EndOfJson => &JSON_INTERESTING, // never scanned
        }
    }
}

/// Sub-stream bookkeeping held by the reader while a value is streaming.
#[derive(Debug, Clone)]
pub(crate) struct ValueStream {
    state: StreamState,
    prefix: Vec<u8>,
    prefix_pos: usize,
    /// Open `[`/`{` count while in [`StreamState::Json`].
    depth: usize,
    /// Buffered bytes verified to belong to the value and safe to emit.
    limit: usize,
}

impl ValueStream {
    pub(crate) fn new(state: StreamState, prefix: Vec<u8>, depth: usize) -> Self {
        Self {
            state,
            prefix,
            prefix_pos: 0,
            depth,
            limit: 0,
        }
    }
}

/// The byte stream returned by [`JsonReader::next_source`].
///
/// Reading yields exactly the raw text of one JSON value — quotes, escapes,
/// interior whitespace and all — and then reports end of input. Dropping the
/// stream early is fine: the next reader operation skips whatever part of
/// the value was not read.
#[derive(Debug)]
pub struct ValueSource<'a> {
    reader: &'a mut JsonReader,
}

impl<'a> ValueSource<'a> {
    pub(crate) fn new(reader: &'a mut JsonReader) -> Self {
        Self { reader }
    }

    /// Reads up to `dst.len()` bytes of the value. `Ok(0)` once the value is
    /// complete (or `dst` is empty).
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.reader.value_stream_read(dst)
    }

    /// Reads the rest of the value, appending to `out`. Returns the number
    /// of bytes appended.
    pub fn read_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let mut total = 0;
        let mut chunk = [0u8; 512];
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&chunk[..n]);
            total += n;
        }
    }
}

#[cfg(feature = "std")]
impl std::io::Read for ValueSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        ValueSource::read(self, buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

impl JsonReader {
    pub(crate) fn value_stream_read(&mut self, dst: &mut [u8]) -> Result<usize> {
        // Replay the prefix before touching the live stream.
        if let Some(stream) = self.value_stream.as_mut() {
            let remaining = stream.prefix.len() - stream.prefix_pos;
            if remaining > 0 {
                let n = dst.len().min(remaining);
                dst[..n].copy_from_slice(&stream.prefix[stream.prefix_pos..stream.prefix_pos + n]);
                stream.prefix_pos += n;
                return Ok(n);
            }
        } else {
            return Ok(0);
        }
        if dst.is_empty() {
            return Ok(0);
        }

        self.advance_value_limit(dst.len())?;
        let limit = match &self.value_stream {
            Some(stream) => stream.limit,
            None => 0,
        };
        if limit == 0 {
            return Ok(0);
        }
        let n = dst.len().min(limit);
        self.source.read_slice(&mut dst[..n]);
        if let Some(stream) = self.value_stream.as_mut() {
            stream.limit -= n;
        }
        Ok(n)
    }

    /// Scans forward until at least `want` bytes are known to belong to the
    /// value, or the value ends. Only already-buffered bytes are inspected;
    /// the scan requests more input one step at a time.
    fn advance_value_limit(&mut self, want: usize) -> Result<()> {
        loop {
            let (state, limit, depth) = match &self.value_stream {
                Some(stream) => (stream.state, stream.limit, stream.depth),
                None => return Ok(()),
            };
            if state == StreamState::EndOfJson || limit >= want {
                return Ok(());
            }
            if !self.source.request(limit + 1)? {
                return Err(self.err_eof());
            }

            let (state, limit, depth) = match self.source.index_of_element_buffered(state.interesting(), limit)
            {
                // Nothing interesting buffered yet; everything seen so far
                // belongs to the value.
                None => (state, self.source.buffered_len(), depth),
                Some(i) => {
                    let b = self.source.get_byte(i);
                    match state {
                        StreamState::Json => match b {
                            b'[' | b'{' => (state, i + 1, depth + 1),
                            b']' | b'}' => {
                                let depth = depth - 1;
                                let state = if depth == 0 {
                                    StreamState::EndOfJson
                                } else {
                                    StreamState::Json
                                };
                                (state, i + 1, depth)
                            }
                            b'"' => (StreamState::DoubleQuoted, i + 1, depth),
                            b'\'' => (StreamState::SingleQuoted, i + 1, depth),
                            _ => unreachable!("byte not in the interesting set"),
                        },
                        StreamState::DoubleQuoted | StreamState::SingleQuoted => {
                            if b == b'\\' {
                                // Keep the escaped byte with its backslash.
                                if !self.source.request(i + 2)? {
                                    return Err(self.err_syntax("Unterminated escape sequence"));
                                }
                                (state, i + 2, depth)
                            } else {
                                let state = if depth == 0 {
                                    StreamState::EndOfJson
                                } else {
                                    StreamState::Json
                                };
                                (state, i + 1, depth)
                            }
                        }
                        StreamState::EndOfJson => unreachable!("loop exits in EndOfJson"),
                    }
                }
            };
            if let Some(stream) = self.value_stream.as_mut() {
                stream.state = state;
                stream.limit = limit;
                stream.depth = depth;
            }
        }
    }

    /// Skips the remainder of an outstanding sub-stream and pops its scope.
    /// Reader operations call this before touching the byte stream again.
    pub(crate) fn finish_value_stream(&mut self) -> Result<()> {
        if let Some(stream) = self.value_stream.as_mut() {
            stream.prefix_pos = stream.prefix.len();
        }
        loop {
            self.advance_value_limit(4096)?;
            let limit = match &self.value_stream {
                Some(stream) => stream.limit,
                None => 0,
            };
            if limit == 0 {
                break;
            }
            self.source.skip(limit);
            if let Some(stream) = self.value_stream.as_mut() {
                stream.limit = 0;
            }
        }
        self.value_stream = None;
        debug_assert_eq!(self.stack.top(), Scope::StreamingValue);
        self.stack.pop();
        Ok(())
    }
}
