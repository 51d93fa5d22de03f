use alloc::vec::Vec;

use crate::error::StreamError;

/// A byte sink for passthrough streaming.
///
/// [`JsonReader::stream_value`](crate::JsonReader::stream_value) copies the
/// bytes of the next JSON value into one of these, verbatim.
pub trait Sink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), StreamError>;
}

/// A sink that discards everything written to it.
///
/// The scanner runs the same code in skipping and streaming modes; skipping
/// is streaming into a `Blackhole`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blackhole;

impl Sink for Blackhole {
    #[inline]
    fn write_all(&mut self, _bytes: &[u8]) -> Result<(), StreamError> {
        Ok(())
    }
}

impl Sink for Vec<u8> {
    #[inline]
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

/// The hook a streaming JSON writer exposes so raw values can be spliced into
/// its output.
///
/// [`JsonReader::stream_value_to_writer`](crate::JsonReader::stream_value_to_writer)
/// invokes [`before_value`](ValueSink::before_value) exactly once — letting
/// the writer emit any pending separators or indentation — and then routes
/// the passthrough bytes into the sink.
pub trait ValueSink: Sink {
    fn before_value(&mut self) -> Result<(), StreamError>;
}

/// Adapts any [`std::io::Write`] into a [`Sink`].
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct IoSink<W>(pub W);

#[cfg(feature = "std")]
impl<W: std::io::Write> Sink for IoSink<W> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        use alloc::string::ToString;
        self.0
            .write_all(bytes)
            .map_err(|e| StreamError::new(e.to_string()))
    }
}
