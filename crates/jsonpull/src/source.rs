//! The refillable buffered byte queue backing the reader.
//!
//! [`ByteSource`] separates the transport ([`FillSource`]) from buffering.
//! All buffered bytes live in one shared window; [`ByteSource::peek`] hands
//! out additional views over the same window at independent positions, which
//! is what makes a deep-copied reader cheap: the fork sees every byte the
//! original had already buffered, and further look-ahead on either view
//! refills the common window.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::byte_set::ByteSet;
use crate::error::StreamError;
use crate::sink::Sink;

/// The transport port: anything that can append more bytes on demand.
///
/// `Ok(0)` signals end of input. Implementations choose their own chunk
/// sizes; the queue never asks for a specific amount.
pub trait FillSource {
    fn fill(&mut self, sink: &mut Vec<u8>) -> Result<usize, StreamError>;
}

/// A fill source with nothing to add. Used for preloaded in-memory data.
struct NoFill;

impl FillSource for NoFill {
    fn fill(&mut self, _sink: &mut Vec<u8>) -> Result<usize, StreamError> {
        Ok(0)
    }
}

#[cfg(feature = "std")]
struct IoFill<R> {
    inner: R,
}

#[cfg(feature = "std")]
impl<R: std::io::Read> FillSource for IoFill<R> {
    fn fill(&mut self, sink: &mut Vec<u8>) -> Result<usize, StreamError> {
        use alloc::string::ToString;
        let mut chunk = [0u8; 8192];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    sink.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::new(e.to_string())),
            }
        }
    }
}

/// Compact the window once this many consumed bytes accumulate at its front.
const COMPACT_AFTER: usize = 8 * 1024;

struct SourceCore {
    fill: Box<dyn FillSource>,
    /// Buffered bytes `[base, base + buf.len())` in absolute stream offsets.
    buf: Vec<u8>,
    base: u64,
    /// Bytes of `buf` below this index were consumed by the primary view.
    head: usize,
    eof: bool,
    closed: bool,
}

impl SourceCore {
    fn abs_head(&self) -> u64 {
        self.base + self.head as u64
    }

    fn abs_end(&self) -> u64 {
        self.base + self.buf.len() as u64
    }

    fn fill_more(&mut self) -> Result<bool, StreamError> {
        if self.eof {
            return Ok(false);
        }
        let n = self.fill.fill(&mut self.buf)?;
        if n == 0 {
            self.eof = true;
        }
        Ok(n != 0)
    }

    fn compact(&mut self) {
        if self.head >= COMPACT_AFTER && self.head * 2 >= self.buf.len() {
            self.buf.drain(..self.head);
            self.base += self.head as u64;
            self.head = 0;
        }
    }
}

/// A refillable buffered byte queue with single-byte-granular look-ahead.
///
/// The primary view (from a constructor) consumes bytes; forked views from
/// [`peek`](ByteSource::peek) read the same stream without consuming it. A
/// fork that falls behind the primary's consumption point reports a
/// [`StreamError`] on its next operation.
///
/// Reads of buffered bytes (`get_byte`, `skip`, ...) require the caller to
/// have established availability via [`request`](ByteSource::request) first;
/// violating that contract panics.
pub struct ByteSource {
    core: Rc<RefCell<SourceCore>>,
    /// Absolute stream offset of this view's next byte.
    pos: u64,
    primary: bool,
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteSource")
            .field("pos", &self.pos)
            .field("primary", &self.primary)
            .finish()
    }
}

impl ByteSource {
    /// A source over in-memory data.
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self::seeded(data.as_ref().to_vec(), Box::new(NoFill))
    }

    /// A source that refills from `fill` on demand.
    pub fn with_fill(fill: impl FillSource + 'static) -> Self {
        Self::seeded(Vec::new(), Box::new(fill))
    }

    /// A source that refills from a [`std::io::Read`].
    #[cfg(feature = "std")]
    pub fn from_reader(reader: impl std::io::Read + 'static) -> Self {
        Self::seeded(Vec::new(), Box::new(IoFill { inner: reader }))
    }

    fn seeded(buf: Vec<u8>, fill: Box<dyn FillSource>) -> Self {
        Self {
            core: Rc::new(RefCell::new(SourceCore {
                fill,
                buf,
                base: 0,
                head: 0,
                eof: false,
                closed: false,
            })),
            pos: 0,
            primary: true,
        }
    }

    fn start(&self, core: &SourceCore) -> usize {
        (self.pos - core.base) as usize
    }

    fn check_live(&self, core: &SourceCore) -> Result<(), StreamError> {
        if core.closed {
            return Err(StreamError::new("byte source is closed"));
        }
        if self.pos < core.abs_head() {
            return Err(StreamError::new(
                "source view invalidated by a later read on the primary view",
            ));
        }
        Ok(())
    }

    /// Ensures at least `count` bytes are buffered at this view's position,
    /// or returns `false` when the input ends first.
    pub fn request(&mut self, count: usize) -> Result<bool, StreamError> {
        let mut core = self.core.borrow_mut();
        self.check_live(&core)?;
        while core.abs_end() < self.pos + count as u64 {
            if !core.fill_more()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Number of bytes currently buffered at this view's position.
    pub fn buffered_len(&self) -> usize {
        let core = self.core.borrow();
        (core.abs_end() - self.pos) as usize
    }

    /// The `index`-th buffered byte. Must already be buffered.
    pub fn get_byte(&self, index: usize) -> u8 {
        let core = self.core.borrow();
        core.buf[self.start(&core) + index]
    }

    /// Consumes and returns the next buffered byte.
    pub fn read_byte(&mut self) -> u8 {
        let b = self.get_byte(0);
        self.consume(1);
        b
    }

    /// Consumes `count` buffered bytes.
    pub fn skip(&mut self, count: usize) {
        debug_assert!(count <= self.buffered_len());
        self.consume(count);
    }

    /// Consumes `count` buffered bytes and returns them as text. Invalid
    /// UTF-8 is replaced, never reported.
    pub fn read_utf8(&mut self, count: usize) -> String {
        let text = {
            let core = self.core.borrow();
            let start = self.start(&core);
            String::from_utf8_lossy(&core.buf[start..start + count]).into_owned()
        };
        self.consume(count);
        text
    }

    /// Consumes exactly `dst.len()` buffered bytes into `dst`.
    pub fn read_slice(&mut self, dst: &mut [u8]) {
        {
            let core = self.core.borrow();
            let start = self.start(&core);
            dst.copy_from_slice(&core.buf[start..start + dst.len()]);
        }
        self.consume(dst.len());
    }

    /// Consumes `count` buffered bytes, routing them into `sink`.
    ///
    /// This is the passthrough primitive: a scanner that skips via `move_to`
    /// produces output byte-identical to its input.
    pub fn move_to(&mut self, sink: &mut dyn Sink, count: usize) -> Result<(), StreamError> {
        {
            let core = self.core.borrow();
            let start = self.start(&core);
            sink.write_all(&core.buf[start..start + count])?;
        }
        self.consume(count);
        Ok(())
    }

    fn consume(&mut self, count: usize) {
        self.pos += count as u64;
        if self.primary {
            let mut core = self.core.borrow_mut();
            core.head = (self.pos - core.base) as usize;
            core.compact();
        }
    }

    /// Position of the first byte in `set` at or after `from`, searching only
    /// already-buffered bytes.
    pub fn index_of_element_buffered(&self, set: &ByteSet, from: usize) -> Option<usize> {
        let core = self.core.borrow();
        let start = self.start(&core);
        set.find_in(&core.buf[start + from..]).map(|i| i + from)
    }

    /// Position of the first byte in `set` at or after `from`, refilling as
    /// needed. `None` means the input ended without a match.
    pub fn index_of_element(
        &mut self,
        set: &ByteSet,
        from: usize,
    ) -> Result<Option<usize>, StreamError> {
        let mut from = from;
        loop {
            if let Some(i) = self.index_of_element_buffered(set, from) {
                return Ok(Some(i));
            }
            from = self.buffered_len();
            if !self.request(from + 1)? {
                return Ok(None);
            }
        }
    }

    /// Position of the first occurrence of `needle` at or after `from`,
    /// refilling as needed. `None` means the input ended without a match.
    pub fn index_of(&mut self, needle: &[u8], from: usize) -> Result<Option<usize>, StreamError> {
        debug_assert!(!needle.is_empty());
        let finder = memchr::memmem::Finder::new(needle);
        let mut from = from;
        loop {
            {
                let core = self.core.borrow();
                let start = self.start(&core);
                if let Some(i) = finder.find(&core.buf[start + from..]) {
                    return Ok(Some(i + from));
                }
            }
            let len = self.buffered_len();
            if !self.request(len + 1)? {
                return Ok(None);
            }
            // A match may straddle the old buffer end; back up enough to see it.
            from = from.max(len.saturating_sub(needle.len() - 1));
        }
    }

    /// Atomically matches and consumes the first option whose bytes prefix
    /// the stream. Options are expected to be prefix-free (each ends with a
    /// terminator byte).
    pub fn select(&mut self, options: &[Vec<u8>]) -> Result<Option<usize>, StreamError> {
        'options: for (i, option) in options.iter().enumerate() {
            if !self.request(option.len())? {
                continue;
            }
            {
                let core = self.core.borrow();
                let start = self.start(&core);
                if &core.buf[start..start + option.len()] != option.as_slice() {
                    continue 'options;
                }
            }
            self.consume(option.len());
            return Ok(Some(i));
        }
        Ok(None)
    }

    /// A logically independent view at the same position.
    ///
    /// The fork shares this source's buffered window, so look-ahead already
    /// satisfied here is satisfied on the fork as well. Reading on the fork
    /// never consumes from the primary view.
    pub fn peek(&self) -> ByteSource {
        ByteSource {
            core: Rc::clone(&self.core),
            pos: self.pos,
            primary: false,
        }
    }

    /// Releases the source. Subsequent operations on any view fail.
    pub fn close(&mut self) {
        self.core.borrow_mut().closed = true;
    }
}
