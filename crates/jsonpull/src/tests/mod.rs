use alloc::vec::Vec;

use crate::error::StreamError;
use crate::source::FillSource;

mod numbers;
mod streaming;
mod value_source;

/// Trickles input to the byte queue `step` bytes at a time, to exercise the
/// request/refill protocol at every boundary.
pub(crate) struct ChunkedFill {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl ChunkedFill {
    pub(crate) fn new(data: impl AsRef<[u8]>, step: usize) -> Self {
        Self {
            data: data.as_ref().to_vec(),
            pos: 0,
            step: step.max(1),
        }
    }
}

impl FillSource for ChunkedFill {
    fn fill(&mut self, sink: &mut Vec<u8>) -> Result<usize, StreamError> {
        let n = self.step.min(self.data.len() - self.pos);
        sink.extend_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
